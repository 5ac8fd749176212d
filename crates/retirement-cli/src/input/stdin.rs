use serde_json::Value;
use std::io::{self, Read};

/// Read a piped scenario from stdin. JSON first, then YAML.
/// Returns None when stdin is a terminal or the pipe is empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_document(&buffer)
}

fn parse_document(text: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => serde_yaml::from_str::<Value>(trimmed)
            .map(Some)
            .map_err(|_| format!("stdin is neither JSON nor YAML: {json_err}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_and_yaml_agree() {
        let from_json = parse_document(r#"{"expected_return": 7, "current_age": 30}"#).unwrap();
        let from_yaml = parse_document("expected_return: 7\ncurrent_age: 30\n").unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_json, Some(json!({"expected_return": 7, "current_age": 30})));
    }

    #[test]
    fn test_blank_input_is_none() {
        assert_eq!(parse_document("  \n").unwrap(), None);
    }
}
