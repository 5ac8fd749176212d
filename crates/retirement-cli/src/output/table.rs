use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{band_rows, is_record_list, scalar, BAND_COLUMNS};

/// Format output as tables: scalar fields first, then schedules and bands.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        Value::Array(items) => print_records(items),
        _ => println!("{value}"),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_fields(result);

    if let Some(rows) = band_rows(result) {
        println!("\nPercentile bands:");
        let mut builder = Builder::default();
        builder.push_record(["Year", "10th", "50th", "90th"]);
        for row in rows {
            builder.push_record(row);
        }
        println!("{}", Table::from(builder));
    }

    for (key, val) in result {
        if let Value::Array(items) = val {
            if is_record_list(val) {
                println!("\n{}:", key.replace('_', " "));
                print_records(items);
            }
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

/// Two-column table of the scalar fields; list-valued fields are printed separately.
fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if BAND_COLUMNS.contains(&key.as_str()) || val.is_array() {
            continue;
        }
        builder.push_record([key.as_str(), &scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_records(items: &[Value]) {
    let Some(Value::Object(first)) = items.first() else {
        for item in items {
            println!("{}", scalar(item));
        }
        return;
    };

    let headers: Vec<String> = first
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .map(|(k, _)| k.clone())
        .collect();
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(String::as_str));
    for item in items {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}
