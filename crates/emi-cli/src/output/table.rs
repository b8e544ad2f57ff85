use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, rows_of};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                print_array_table(rows);
                if let Some(summary) = map.get("summary") {
                    println!("\nSummary:");
                    print_flat_object(summary);
                }
                print_notes(map);
            } else if let Some(result) = map.get("result") {
                print_flat_object(result);
                if let Some(display) = map.get("display") {
                    println!("\nDisplay:");
                    print_flat_object(display);
                }
                print_notes(map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.clone(), cell(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", cell(value));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    match rows_of(arr) {
        Some((headers, rows)) => {
            let mut builder = Builder::default();
            builder.push_record(headers);
            for row in rows {
                builder.push_record(row);
            }
            println!("{}", Table::from(builder));
        }
        None => {
            for item in arr {
                println!("{}", cell(item));
            }
        }
    }
}
