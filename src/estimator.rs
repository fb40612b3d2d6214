//! Local cash-offer estimation.
//!
//! Maps property type, bedroom count and condition to an indicative
//! market value using fixed lookup tables, then derives the cash offer
//! as a fixed fraction of that value. All arithmetic is done in
//! `Decimal` so the factor tables multiply exactly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{Bedrooms, Condition, OfferResult, PropertyAttributes, PropertyType};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Share of the estimated value offered in cash.
pub const OFFER_RATIO: Decimal = dec!(0.85);

/// Base value used for `other` and anything unrecognised.
const DEFAULT_BASE_VALUE: Decimal = dec!(275000);

fn base_value(property_type: PropertyType) -> Decimal {
    match property_type {
        PropertyType::Detached => dec!(400000),
        PropertyType::SemiDetached => dec!(300000),
        PropertyType::Terraced => dec!(250000),
        PropertyType::Flat => dec!(200000),
        PropertyType::Bungalow => dec!(350000),
        PropertyType::Other | PropertyType::Unrecognized => DEFAULT_BASE_VALUE,
    }
}

fn bedroom_factor(bedrooms: Bedrooms) -> Decimal {
    match bedrooms {
        Bedrooms::One => dec!(0.8),
        Bedrooms::Two => dec!(1.0),
        Bedrooms::Three => dec!(1.2),
        Bedrooms::Four => dec!(1.5),
        Bedrooms::FivePlus => dec!(1.8),
        Bedrooms::Unrecognized => Decimal::ONE,
    }
}

fn condition_factor(condition: Condition) -> Decimal {
    match condition {
        Condition::Good => dec!(1.1),
        Condition::Average => dec!(1.0),
        Condition::NeedsWork => dec!(0.8),
        Condition::Unrecognized => Decimal::ONE,
    }
}

/// Round to whole pounds, halves away from zero.
fn round_to_pounds(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Estimate the market value and cash offer for a property.
///
/// Total over all inputs: unrecognised attributes fall back to neutral
/// defaults instead of failing.
pub fn estimate(attrs: &PropertyAttributes) -> OfferResult {
    let raw = base_value(attrs.property_type)
        * bedroom_factor(attrs.bedrooms)
        * condition_factor(attrs.condition);

    let estimated_value = round_to_pounds(raw);
    let offer_value = round_to_pounds(Decimal::from(estimated_value) * OFFER_RATIO);

    debug!(
        attributes = %attrs,
        estimated_value,
        offer_value,
        "Offer estimated"
    );

    OfferResult {
        estimated_value,
        offer_value,
    }
}

/// Convenience wrapper taking raw form values.
pub fn estimate_str(property_type: &str, bedrooms: &str, condition: &str) -> OfferResult {
    estimate(&PropertyAttributes::from_strs(property_type, bedrooms, condition))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
