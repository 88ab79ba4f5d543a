use serde_json::Value;

/// Headline figures, most specific first. Covers both the raw engine
/// results and the labelled summaries.
const HEADLINE_KEYS: [&str; 9] = [
    "enterprise_value",
    "Enterprise Value ($M)",
    "implied_ev_mid",
    "Implied EV - Mid ($M)",
    "pre_money_valuation",
    "Pre-Money Valuation ($M)",
    "base_case_value",
    "reason",
    "Error",
];

/// Print just the headline value from the output.
///
/// Falls back to the first field of the result object when no known
/// headline key is present.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = headline(map) {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn headline(map: &serde_json::Map<String, Value>) -> Option<&Value> {
    HEADLINE_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
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
