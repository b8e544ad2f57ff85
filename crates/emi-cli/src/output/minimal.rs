use serde_json::Value;

use super::cell;

/// Print just the key answer value from the output.
///
/// Looks in `result` (quote envelope) then `summary` (schedule output) for
/// well-known fields, falling back to the first field.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let answer = value
        .as_object()
        .and_then(|m| m.get("result").or_else(|| m.get("summary")))
        .unwrap_or(value);

    let priority_keys = ["monthly_payment", "total_amount", "total_interest"];

    if let Value::Object(map) = answer {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return cell(val);
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, cell(val));
        }
    }

    cell(answer)
}
