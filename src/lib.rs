//! propval: postcode lookup, cash-offer estimation and borough market data.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod clients;
pub mod config;
pub mod estimator;
pub mod market;
pub mod postcode;
pub mod types;

#[cfg(test)]
mod test_support;
