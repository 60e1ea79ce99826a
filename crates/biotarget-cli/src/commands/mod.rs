pub mod ranking;
pub mod screening;
pub mod targets;
pub mod valuation;

use biotarget_core::assumptions::AssumptionTables;
use serde::de::DeserializeOwned;

use crate::input;

/// Parse a snake_case enum token (phase, archetype, area) through serde,
/// so the CLI accepts exactly the wire vocabulary.
pub fn parse_token<T: DeserializeOwned>(
    token: &str,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_value(serde_json::Value::String(token.to_string()))
        .map_err(|_| format!("Unknown {what}: '{token}'").into())
}

/// Load assumption tables from a file, or fall back to the defaults.
pub fn load_tables(
    path: &Option<String>,
) -> Result<AssumptionTables, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_input(path),
        None => Ok(AssumptionTables::default()),
    }
}
