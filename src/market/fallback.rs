//! Embedded fallback dataset, used when the configured source cannot be
//! loaded.

use crate::types::BoroughRecord;

/// (borough, average price, council tax, crime rate)
const FALLBACK_ROWS: &[(&str, u64, f64, f64)] = &[
    ("Kensington & Chelsea", 1_463_000, 1420.25, 112.0),
    ("Westminster", 1_035_000, 1017.18, 144.0),
    ("Camden", 862_000, 1744.38, 121.0),
    ("Hammersmith & Fulham", 780_000, 1342.67, 98.0),
    ("Richmond upon Thames", 752_000, 2134.11, 67.0),
    ("Islington", 701_000, 1699.27, 115.0),
    ("Hackney", 608_000, 1677.96, 108.0),
    ("Brent", 541_000, 1849.78, 89.0),
];

/// The eight-borough fallback dataset.
pub fn boroughs() -> Vec<BoroughRecord> {
    FALLBACK_ROWS
        .iter()
        .map(|&(borough, avg_house_price, council_tax, crime_rate)| BoroughRecord {
            borough: borough.to_string(),
            avg_house_price,
            council_tax,
            crime_rate,
        })
        .collect()
}
