use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// Arrays of objects (heatmap rows, presets) become one record per object.
/// An envelope whose result has a `heatmap` writes one record per
/// (loan, covenant) pair; any other result becomes `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Array(arr) => write_records(&mut wtr, arr),
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match result.get("heatmap") {
                Some(Value::Array(heatmap)) => write_records(&mut wtr, &flatten_heatmap(heatmap)),
                _ => write_pairs(&mut wtr, result),
            },
            Some(Value::Array(arr)) => write_records(&mut wtr, arr),
            _ => write_pairs(&mut wtr, map),
        },
        _ => {
            let _ = wtr.write_record([format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_pairs<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

/// Expand each loan's `per_covenant` list into one object per covenant that
/// also carries the loan's own fields.
fn flatten_heatmap(heatmap: &[Value]) -> Vec<Value> {
    let mut rows = Vec::new();
    for loan in heatmap.iter().filter_map(Value::as_object) {
        let mut loan_fields = loan.clone();
        let covenants = match loan_fields.remove("per_covenant") {
            Some(Value::Array(c)) => c,
            _ => Vec::new(),
        };
        for covenant in covenants.iter().filter_map(Value::as_object) {
            let mut row = loan_fields.clone();
            row.extend(covenant.iter().map(|(k, v)| (k.clone(), v.clone())));
            rows.push(Value::Object(row));
        }
    }
    rows
}

/// Null stays an empty cell so undefined cushions are never mistaken for 0.
fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
