use serde_json::{Map, Value};
use std::io;

use super::{band_rows, scalar};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A yearly schedule or percentile band set is written as rows; anything
/// else falls back to a two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.as_object().and_then(|m| m.get("result")).unwrap_or(value);
    let outcome = match result {
        Value::Object(map) => write_result(&mut wtr, map),
        Value::Array(items) => write_records(&mut wtr, items),
        _ => wtr.write_record([scalar(result)]),
    };
    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        log::error!("CSV write error: {e}");
    }
}

fn write_result(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) -> csv::Result<()> {
    if let Some(Value::Array(rows)) = map.get("year_by_year") {
        return write_records(wtr, rows);
    }
    if let Some(rows) = band_rows(map) {
        wtr.write_record(["year", "p10", "p50", "p90"])?;
        for row in rows {
            wtr.write_record(&row)?;
        }
        return Ok(());
    }
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &scalar(val)])?;
    }
    Ok(())
}

fn write_records(wtr: &mut StdoutWriter<'_>, items: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = items.first() else {
        for item in items {
            wtr.write_record([scalar(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in items {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(scalar).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
