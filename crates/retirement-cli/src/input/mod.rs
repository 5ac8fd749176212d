pub mod file;
pub mod stdin;

use log::debug;
use retirement_core::FieldMap;
use serde_json::Value;

/// Load the scenario document from `--input`, else from piped stdin.
pub fn load(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            debug!("reading input from {p}");
            file::read_document(p).map(Some)
        }
        None => stdin::read_stdin(),
    }
}

/// Build a field map from the scenario document plus `KEY=VALUE` overrides.
///
/// Overrides are applied last and always win. An empty value clears the field.
pub fn field_map(
    path: Option<&str>,
    overrides: &[String],
) -> Result<FieldMap, Box<dyn std::error::Error>> {
    let mut fields = match load(path)? {
        Some(doc) => FieldMap::try_from(doc)?,
        None => FieldMap::new(),
    };
    for raw in overrides {
        let (key, value) = parse_override(raw)?;
        fields.insert(key, value);
    }
    if fields.iter().next().is_none() {
        return Err("no input: pass --input <file>, pipe JSON/YAML on stdin, or use --field KEY=VALUE".into());
    }
    Ok(fields)
}

fn parse_override(raw: &str) -> Result<(&str, Value), Box<dyn std::error::Error>> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("--field expects KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("--field '{raw}' has an empty key").into());
    }
    let value = value.trim();
    let value = if value.is_empty() {
        Value::Null
    } else {
        Value::String(value.to_string())
    };
    Ok((key, value))
}
