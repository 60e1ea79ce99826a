use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiotargetError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unknown indication: '{0}' has no TAM entry")]
    UnknownIndication(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BiotargetError {
    fn from(e: serde_json::Error) -> Self {
        BiotargetError::SerializationError(e.to_string())
    }
}
