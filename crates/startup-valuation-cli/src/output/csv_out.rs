use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// Record arrays (under `results`, or a result's projection rows) become
/// one row per record; a flat result becomes a two-column field,value file.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Object(map) => match (map.get("results"), map.get("result")) {
            (Some(Value::Array(results)), _) => write_array_csv(&mut wtr, results),
            (_, Some(Value::Object(result))) => match result.get("projections") {
                Some(Value::Array(rows)) => write_array_csv(&mut wtr, rows),
                _ => write_pairs_csv(&mut wtr, result),
            },
            _ => write_pairs_csv(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => wtr.write_record([format_csv_value(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        tracing::error!(error = %e, "failed to write CSV output");
    }
}

fn write_pairs_csv<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &serde_json::Map<String, Value>,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
    }
    Ok(())
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(first) = arr.first() else {
        return Ok(());
    };

    if let Value::Object(first) = first {
        let headers: Vec<&str> = first.keys().map(String::as_str).collect();
        wtr.write_record(&headers)?;

        for map in arr.iter().filter_map(Value::as_object) {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    } else {
        for item in arr {
            wtr.write_record([format_csv_value(item)])?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
