use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Columns shown per loan when a result carries a heatmap.
const HEATMAP_COLUMNS: [&str; 7] = [
    "loan_id",
    "company_name",
    "amount",
    "overall_status",
    "breached_count",
    "at_risk_count",
    "compliant_count",
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_fields(map),
        },
        Value::Array(arr) => print_rows(arr, None),
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res) => {
            let scalars: Map<String, Value> = res
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "heatmap" | "summary"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            if let Some(Value::Object(summary)) = res.get("summary") {
                println!("Summary");
                print_fields(summary);
            }
            if let Some(Value::Array(heatmap)) = res.get("heatmap") {
                println!("\nHeatmap");
                print_rows(heatmap, Some(&HEATMAP_COLUMNS[..]));
            }
            if !scalars.is_empty() {
                print_fields(&scalars);
            }
        }
        Value::Array(arr) => print_rows(arr, None),
        other => println!("{}", format_value(other)),
    }

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

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

/// One row per object. Headers come from `columns` or the first object.
fn print_rows(arr: &[Value], columns: Option<&[&str]>) {
    let Some(Value::Object(first)) = arr.first() else {
        if arr.is_empty() {
            println!("(empty)");
        }
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = match columns {
        Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
        None => first.keys().cloned().collect(),
    };

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
