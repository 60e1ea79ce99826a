use serde_json::Value;

use super::display_value;

/// Priority fields, checked in order against the result object. The
/// first present non-null field is the single-line answer.
const PRIORITY_KEYS: [&str; 8] = [
    "npv_risk_adjusted",
    "risk_adjusted_value",
    "probability_weighted_value",
    "composite_score",
    "pass_rate",
    "base_npv_risk_adjusted",
    "typical",
    "total_pipeline_value",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    println!("{}", display_value(val));
                    return;
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{key}: {}", display_value(val));
            return;
        }
    }
    println!("{}", display_value(result));
}
