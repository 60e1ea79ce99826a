pub mod factors;
pub mod ranker;
pub mod weights;
