//! Presentation helpers for market figures.
//!
//! Kept behind `CurrencyFormatter` so aggregation never deals with
//! currency symbols or locale rules.

use serde::Serialize;

use crate::types::MarketStats;

/// Turns raw market figures into display strings.
pub trait CurrencyFormatter: Send + Sync {
    /// Compact price: millions, thousands or the raw amount.
    fn price(&self, value: u64) -> String;

    /// Annual council tax.
    fn council_tax(&self, value: f64) -> String;

    /// Crime rate per 1,000 residents.
    fn crime_rate(&self, value: f64) -> String;
}

/// Pound sterling formatting used on the site.
#[derive(Debug, Clone, Copy, Default)]
pub struct GbpFormatter;

impl CurrencyFormatter for GbpFormatter {
    fn price(&self, value: u64) -> String {
        if value > 1_000_000 {
            format!("£{:.1}M", value as f64 / 1_000_000.0)
        } else if value > 1_000 {
            format!("£{:.0}K", value as f64 / 1_000.0)
        } else {
            format!("£{value}")
        }
    }

    fn council_tax(&self, value: f64) -> String {
        let pennies = (value.max(0.0) * 100.0).round() as u64;
        format!("£{}.{:02}", group_thousands(pennies / 100), pennies % 100)
    }

    fn crime_rate(&self, value: f64) -> String {
        format!("{value:.1} per 1,000")
    }
}

/// `1234567` → `"1,234,567"`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Display strings for a `MarketStats`, as served alongside the raw numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDisplay {
    pub average_price: String,
    pub min_price: String,
    pub max_price: String,
    pub council_tax_min: String,
    pub council_tax_max: String,
    pub average_crime_rate: String,
    pub safest_rate: String,
}

pub fn format_stats(fmt: &dyn CurrencyFormatter, stats: &MarketStats) -> StatsDisplay {
    StatsDisplay {
        average_price: fmt.price(stats.average_price),
        min_price: fmt.price(stats.price_range.min),
        max_price: fmt.price(stats.price_range.max),
        council_tax_min: fmt.council_tax(stats.council_tax_range.min),
        council_tax_max: fmt.council_tax(stats.council_tax_range.max),
        average_crime_rate: fmt.crime_rate(stats.crime_stats.average),
        safest_rate: fmt.crime_rate(stats.crime_stats.safest_rate),
    }
}
