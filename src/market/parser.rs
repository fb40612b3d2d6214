//! Borough dataset parsing.
//!
//! Format: one header line, then `borough,avgHousePrice,councilTax,crimeRate`
//! rows read with the `csv` reader, so quoted fields may contain commas.
//! Rows with fewer than four fields are dropped; numeric fields that fail
//! to parse become zero.

use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::types::BoroughRecord;

/// Minimum number of fields for a usable row.
const MIN_FIELDS: usize = 4;

/// Characters removed from the price field before parsing.
const PRICE_NOISE: &[char] = &['£', '$', '€', ',', '"'];

fn reader(text: &str, has_headers: bool) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true) // short and long rows are handled per record
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

/// Whole-pound price. Currency symbols and thousands separators are
/// ignored and parsing stops at the first non-digit, so `"1035000.50"`
/// reads as `1035000`.
fn parse_price(field: &str) -> u64 {
    let cleaned: String = field
        .trim()
        .chars()
        .filter(|c| !PRICE_NOISE.contains(c) && !c.is_whitespace())
        .collect();
    let digits: String = cleaned.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Non-negative float; anything else reads as zero.
fn parse_float(field: &str) -> f64 {
    match field.trim().trim_matches('"').trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Map one CSV record to a borough. `None` if it has too few fields.
pub fn parse_record(record: &StringRecord) -> Option<BoroughRecord> {
    if record.len() < MIN_FIELDS {
        return None;
    }

    Some(BoroughRecord {
        borough: record[0].replace('"', "").trim().to_string(),
        avg_house_price: parse_price(&record[1]),
        council_tax: parse_float(&record[2]),
        crime_rate: parse_float(&record[3]),
    })
}

/// Parse a single headerless data row.
pub fn parse_line(line: &str) -> Option<BoroughRecord> {
    let mut rows = reader(line, false);
    let record = rows.records().next()?.ok()?;
    parse_record(&record)
}

/// Parse a whole dataset, skipping the header and blank lines.
pub fn parse_dataset(text: &str) -> Vec<BoroughRecord> {
    let mut rows = reader(text, true);
    let mut records = Vec::new();

    for result in rows.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable dataset row");
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        match parse_record(&record) {
            Some(borough) => records.push(borough),
            None => debug!(
                line = record.position().map(|p| p.line()).unwrap_or_default(),
                content = ?record,
                "Dropping malformed dataset row"
            ),
        }
    }

    records
}
