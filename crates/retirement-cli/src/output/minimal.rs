use serde_json::Value;

use super::scalar;

/// Headline figure per command, first match wins.
const PRIORITY_KEYS: [&str; 6] = [
    "success_rate",
    "final_portfolio",
    "future_value",
    "ending_portfolio",
    "safe_annual_withdrawal",
    "median",
];

/// Print just the headline number from the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    println!("{}", headline(result));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return scalar(result);
    };
    PRIORITY_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
        .map(scalar)
        .or_else(|| map.iter().next().map(|(k, v)| format!("{k}: {}", scalar(v))))
        .unwrap_or_default()
}
