use serde_json::Value;
use tabled::builder::Builder;
use tabled::Table;

use super::display_value;

/// Render the computation envelope as field/value tables. Arrays of
/// objects (ranked targets, screen failures, sensitivity points) become
/// one table with a column per key.
pub fn print_table(value: &Value) {
    let envelope = value.as_object();
    let result = envelope
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(rows) => print_rows(rows),
        Value::Object(map) => {
            // Scalar fields first, then each array-of-objects field as
            // its own titled table
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            let mut sub_tables: Vec<(&String, &Vec<Value>)> = Vec::new();
            for (key, val) in map {
                match val {
                    Value::Array(rows) if rows.first().map(Value::is_object).unwrap_or(false) => {
                        sub_tables.push((key, rows));
                    }
                    other => builder.push_record([key.as_str(), &display_value(other)]),
                }
            }
            println!("{}", Table::from(builder));
            for (key, rows) in sub_tables {
                println!("\n{key}:");
                print_rows(rows);
            }
        }
        other => println!("{}", display_value(other)),
    }

    if let Some(envelope) = envelope {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    println!("  - {}", display_value(w));
                }
            }
        }
        if let Some(Value::String(methodology)) = envelope.get("methodology") {
            println!("\nMethodology: {methodology}");
        }
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            println!("{}", display_value(row));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(display_value).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}
