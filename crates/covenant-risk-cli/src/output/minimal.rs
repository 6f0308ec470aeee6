use serde_json::{Map, Value};

/// Fields that answer "how is this covenant doing", most specific first.
const HEADLINE_KEYS: [&str; 6] = [
    "new_status",
    "status",
    "overall_status",
    "projected_periods_to_breach",
    "direction",
    "total_new_breaches",
];

/// Print a single headline value.
///
/// Portfolio results collapse to their status counts; everything else prints
/// the first non-null headline field, or the first field of the result.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        println!("{}", format_minimal(result));
        return;
    };

    if let Some(Value::Object(summary)) = map.get("summary") {
        println!("{}", summary_line(summary));
        return;
    }

    let headline = HEADLINE_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !v.is_null());
    match headline {
        Some(v) => println!("{}", format_minimal(v)),
        None => {
            if let Some((key, v)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(v));
            }
        }
    }
}

/// `breached=2 at_risk=0 compliant=1`
fn summary_line(summary: &Map<String, Value>) -> String {
    let count = |key: &str| {
        summary
            .get(key)
            .map(format_minimal)
            .unwrap_or_else(|| "0".to_string())
    };
    format!(
        "breached={} at_risk={} compliant={}",
        count("breached_count"),
        count("at_risk_count"),
        count("safe_count")
    )
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
