//! Shared types for the propval service.
//!
//! These types form the data model used across all modules: address
//! lookup results, property attributes, offers, upstream valuations and
//! borough market data. Wire names follow the camelCase JSON used by the
//! upstream services and the site front end.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// A single candidate address returned by the address lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = std::iter::once(self.address_line1.as_str())
            .chain(
                [&self.address_line2, &self.town, &self.county, &self.postcode]
                    .into_iter()
                    .filter_map(|p| p.as_deref()),
            )
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Outcome of resolving a postcode to candidate addresses.
///
/// `valid == false` always comes with an empty `addresses` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressLookupResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AddressLookupResult {
    /// The message shown when the lookup service cannot be reached.
    pub const UNAVAILABLE_MESSAGE: &'static str = "Postcode validation service unavailable";

    /// Degraded result used whenever the upstream call fails.
    pub fn unavailable() -> Self {
        Self {
            valid: false,
            postcode: None,
            region: None,
            district: None,
            addresses: Vec::new(),
            message: Some(Self::UNAVAILABLE_MESSAGE.to_string()),
        }
    }

    /// Drop any addresses attached to an invalid result.
    pub fn normalized(mut self) -> Self {
        if !self.valid {
            self.addresses.clear();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Property attributes
// ---------------------------------------------------------------------------

/// Property type as chosen on the offer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Detached,
    SemiDetached,
    Terraced,
    Flat,
    Bungalow,
    Other,
    Unrecognized,
}

impl From<&str> for PropertyType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "detached" => PropertyType::Detached,
            "semi-detached" => PropertyType::SemiDetached,
            "terraced" => PropertyType::Terraced,
            "flat" => PropertyType::Flat,
            "bungalow" => PropertyType::Bungalow,
            "other" => PropertyType::Other,
            _ => PropertyType::Unrecognized,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Detached => write!(f, "detached"),
            PropertyType::SemiDetached => write!(f, "semi-detached"),
            PropertyType::Terraced => write!(f, "terraced"),
            PropertyType::Flat => write!(f, "flat"),
            PropertyType::Bungalow => write!(f, "bungalow"),
            PropertyType::Other => write!(f, "other"),
            PropertyType::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Bedroom count bucket. Five or more bedrooms share one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bedrooms {
    One,
    Two,
    Three,
    Four,
    FivePlus,
    Unrecognized,
}

impl From<&str> for Bedrooms {
    fn from(s: &str) -> Self {
        match s.trim() {
            "1" => Bedrooms::One,
            "2" => Bedrooms::Two,
            "3" => Bedrooms::Three,
            "4" => Bedrooms::Four,
            "5+" => Bedrooms::FivePlus,
            _ => Bedrooms::Unrecognized,
        }
    }
}

impl fmt::Display for Bedrooms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bedrooms::One => write!(f, "1"),
            Bedrooms::Two => write!(f, "2"),
            Bedrooms::Three => write!(f, "3"),
            Bedrooms::Four => write!(f, "4"),
            Bedrooms::FivePlus => write!(f, "5+"),
            Bedrooms::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Self-reported property condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Good,
    Average,
    NeedsWork,
    Unrecognized,
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "good" => Condition::Good,
            "average" => Condition::Average,
            "needs_work" => Condition::NeedsWork,
            _ => Condition::Unrecognized,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Good => write!(f, "good"),
            Condition::Average => write!(f, "average"),
            Condition::NeedsWork => write!(f, "needs_work"),
            Condition::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// The three inputs of a local offer estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyAttributes {
    pub property_type: PropertyType,
    pub bedrooms: Bedrooms,
    pub condition: Condition,
}

impl PropertyAttributes {
    /// Build attributes from raw form values. Never fails.
    pub fn from_strs(property_type: &str, bedrooms: &str, condition: &str) -> Self {
        Self {
            property_type: property_type.into(),
            bedrooms: bedrooms.into(),
            condition: condition.into(),
        }
    }
}

impl fmt::Display for PropertyAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} bed / {}",
            self.property_type, self.bedrooms, self.condition
        )
    }
}

/// Form value that may arrive as a string or a bare JSON number
/// (`"bedrooms": 3`). Numbers are stringified and `null` reads as empty.
pub fn form_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(form_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional variant of [`form_string`]; `null` reads as `None`.
pub fn form_string_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(form_value(Value::deserialize(deserializer)?))
}

fn form_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Offers & valuations
// ---------------------------------------------------------------------------

/// Locally computed estimate and the cash offer derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResult {
    pub estimated_value: i64,
    pub offer_value: i64,
}

impl fmt::Display for OfferResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "estimate £{} | offer £{}",
            self.estimated_value, self.offer_value
        )
    }
}

/// Low/high bounds of recent sale prices reported by the valuation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Market price information from the upstream valuation service.
///
/// Provenance fields are passed through untouched; unknown fields are kept
/// in `extra` so nothing the upstream sends is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPriceInfo {
    pub estimated_value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_sales: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Offer terms from the upstream valuation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDetails {
    pub offer_value: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A successful upstream valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResponse {
    pub price_info: PropertyPriceInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_details: Option<OfferDetails>,
}

// ---------------------------------------------------------------------------
// Borough market data
// ---------------------------------------------------------------------------

/// One row of the borough dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoroughRecord {
    pub borough: String,
    /// Average house price in whole GBP.
    pub avg_house_price: u64,
    /// Band D council tax in GBP.
    pub council_tax: f64,
    /// Crimes per 1,000 residents.
    pub crime_rate: f64,
}

impl fmt::Display for BoroughRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (avg £{} | tax £{:.2} | crime {:.1})",
            self.borough, self.avg_house_price, self.council_tax, self.crime_rate
        )
    }
}

/// Cheapest and most expensive boroughs by average price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeStats {
    pub min: u64,
    pub max: u64,
    pub min_borough: String,
    pub max_borough: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilTaxRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeStats {
    pub average: f64,
    pub safest_borough: String,
    pub safest_rate: f64,
}

/// Summary statistics over the loaded borough dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub total_boroughs: usize,
    /// Mean average price, rounded to whole GBP.
    pub average_price: u64,
    pub price_range: PriceRangeStats,
    pub council_tax_range: CouncilTaxRange,
    pub crime_stats: CrimeStats,
}

impl fmt::Display for MarketStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} boroughs | avg £{} | £{} ({}) - £{} ({}) | safest: {}",
            self.total_boroughs,
            self.average_price,
            self.price_range.min,
            self.price_range.min_borough,
            self.price_range.max,
            self.price_range.max_borough,
            self.crime_stats.safest_borough,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for propval.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropvalError {
    #[error("Missing required field: {0}")]
    MissingInput(&'static str),

    #[error("{0}")]
    ValidationError(String),

    #[error("Valuation service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Failed to get property estimate: {0}")]
    EstimationFailed(String),

    #[error("Borough dataset is empty")]
    EmptyDataset,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
