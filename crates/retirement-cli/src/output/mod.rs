pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Yearly percentile band columns emitted by the Monte Carlo commands.
pub(crate) const BAND_COLUMNS: [&str; 4] = ["years", "yearly_10th", "yearly_50th", "yearly_90th"];

/// Rows of (year, p10, p50, p90) if the result carries percentile bands.
pub(crate) fn band_rows(result: &Map<String, Value>) -> Option<Vec<Vec<String>>> {
    let columns: Vec<&Vec<Value>> = BAND_COLUMNS
        .iter()
        .map(|c| result.get(*c).and_then(Value::as_array))
        .collect::<Option<_>>()?;
    let len = columns[0].len();
    let rows = (0..len)
        .map(|i| {
            columns
                .iter()
                .map(|col| col.get(i).map(scalar).unwrap_or_default())
                .collect()
        })
        .collect();
    Some(rows)
}

/// Render a scalar JSON value as plain text.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// True for arrays of objects, which render as their own table.
pub(crate) fn is_record_list(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.first().is_some_and(Value::is_object))
}
