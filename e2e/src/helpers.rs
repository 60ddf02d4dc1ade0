use log::*;
use serde_json::Value;

/// True if every field present in `expected` has the same value in `actual`. Fields missing from `expected` are not
/// checked, so feature files only need to spell out the parts of an order a scenario cares about.
///
/// Panics if either argument is not valid JSON.
pub fn order_json_matches(expected: &str, actual: &str) -> bool {
    let expected: Value = serde_json::from_str(expected).expect("Expected value is not valid JSON");
    let actual: Value = serde_json::from_str(actual).expect("Actual value is not valid JSON");
    value_matches(&expected, &actual)
}

pub fn value_matches(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Null, _) => true,
        (Value::Object(fields), _) => fields.iter().all(|(key, value)| match actual.get(key) {
            Some(actual_value) => {
                let ok = value_matches(value, actual_value);
                if !ok {
                    error!("Field {key}: expected {value}, got {actual_value}");
                }
                ok
            },
            None => {
                error!("Field {key} is missing");
                false
            },
        }),
        (Value::Array(exp), Value::Array(act)) => {
            if exp.len() != act.len() {
                error!("Expected {} array entries, got {}", exp.len(), act.len());
                return false;
            }
            exp.iter().zip(act.iter()).all(|(e, a)| value_matches(e, a))
        },
        (Value::Array(_), _) => {
            error!("Expected an array, got {actual}");
            false
        },
        _ => expected == actual,
    }
}
