pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a scalar for a table cell or CSV field.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Header row from the first object plus one row per object.
pub(crate) fn rows_of(arr: &[Value]) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let Some(Value::Object(first)) = arr.first() else {
        return None;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let rows = arr
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|h| map.get(h).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();
    Some((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(&json!("₹2,280")), "₹2,280");
        assert_eq!(cell(&json!(360)), "360");
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!(["a", "b"])), "a, b");
    }

    #[test]
    fn test_rows_of_objects() {
        let arr = vec![
            json!({"year": 1, "interest": 10.5}),
            json!({"year": 2, "interest": 9.25}),
        ];
        let (headers, rows) = rows_of(&arr).unwrap();
        assert_eq!(headers, vec!["interest", "year"]);
        assert_eq!(rows[1], vec!["9.25", "2"]);
    }

    #[test]
    fn test_rows_of_scalars_is_none() {
        assert!(rows_of(&[json!(1), json!(2)]).is_none());
        assert!(rows_of(&[]).is_none());
    }
}
