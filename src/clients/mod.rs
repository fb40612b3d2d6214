//! Upstream service clients.
//!
//! Defines the `AddressLookup` and `ValuationService` traits and provides
//! HTTP implementations for:
//! - the address/postcode lookup service (degrades, never errors)
//! - the valuation service (typed errors for the caller to present)

pub mod address;
pub mod valuation;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{
    form_string, form_string_opt, AddressLookupResult, PropvalError, ValuationResponse,
};

/// Abstraction over postcode → address resolution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Resolve a postcode to candidate addresses.
    ///
    /// Infallible by contract: upstream failures come back as an invalid
    /// result with an explanatory message.
    async fn lookup(&self, postcode: &str) -> AddressLookupResult;
}

/// A valuation request as supplied by the offer form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRequest {
    #[serde(default, deserialize_with = "form_string")]
    pub postcode: String,
    #[serde(default, deserialize_with = "form_string")]
    pub property_type: String,
    /// `1`-`4` as numbers or strings, or `"5+"`.
    #[serde(default, deserialize_with = "form_string")]
    pub bedrooms: String,
    #[serde(default, deserialize_with = "form_string_opt")]
    pub condition: Option<String>,
}

impl ValuationRequest {
    pub fn new(
        postcode: impl Into<String>,
        property_type: impl Into<String>,
        bedrooms: impl Into<String>,
        condition: Option<String>,
    ) -> Self {
        Self {
            postcode: postcode.into(),
            property_type: property_type.into(),
            bedrooms: bedrooms.into(),
            condition,
        }
    }
}

/// Abstraction over the upstream valuation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ValuationService: Send + Sync {
    /// Fetch a valuation and offer for a property.
    async fn get_estimate(
        &self,
        request: &ValuationRequest,
    ) -> Result<ValuationResponse, PropvalError>;
}
