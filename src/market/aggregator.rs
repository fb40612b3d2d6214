//! Borough dataset cache and statistics.
//!
//! `MarketDataAggregator` owns the dataset for its whole lifetime. The
//! first caller of `ensure_loaded` triggers the one and only fetch;
//! callers arriving while it runs wait on the same `OnceCell` and see the
//! same outcome. If the fetch or parse fails, the embedded fallback is
//! installed permanently.
//!
//! ```text
//! Unloaded ──ensure_loaded──▶ Loading ──▶ Loaded (terminal)
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{fallback, parser, DatasetSource};
use crate::types::{
    BoroughRecord, CouncilTaxRange, CrimeStats, MarketStats, PriceRangeStats, PropvalError,
};

// ---------------------------------------------------------------------------
// Load state
// ---------------------------------------------------------------------------

/// Where the aggregator is in its one-time load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// How the dataset was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Primary source fetched and parsed.
    Loaded(Vec<BoroughRecord>),
    /// Primary source failed; the fallback dataset is in use.
    FellBack {
        records: Vec<BoroughRecord>,
        reason: String,
    },
    /// Primary source failed and no fallback was available.
    Failed { reason: String },
}

impl LoadOutcome {
    /// Records in use, empty when the load failed outright.
    pub fn records(&self) -> &[BoroughRecord] {
        match self {
            LoadOutcome::Loaded(records) | LoadOutcome::FellBack { records, .. } => {
                records.as_slice()
            }
            LoadOutcome::Failed { .. } => &[],
        }
    }

    /// Whether the primary source was not used.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, LoadOutcome::Loaded(_))
    }

    /// Short label for logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadOutcome::Loaded(_) => "loaded",
            LoadOutcome::FellBack { .. } => "fallback",
            LoadOutcome::Failed { .. } => "failed",
        }
    }
}

/// Holds the loading flag for the lifetime of one load attempt. The flag
/// is cleared on drop, so a caller cancelled mid-fetch does not leave the
/// aggregator reporting `Loading`.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Snapshot {
    outcome: LoadOutcome,
    loaded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Owned, lazily loaded borough dataset.
pub struct MarketDataAggregator {
    source: Box<dyn DatasetSource>,
    fallback: Vec<BoroughRecord>,
    snapshot: OnceCell<Snapshot>,
    loading: AtomicBool,
    fetch_attempts: AtomicUsize,
}

impl MarketDataAggregator {
    /// Aggregator over `source` with the embedded fallback dataset.
    pub fn new(source: Box<dyn DatasetSource>) -> Self {
        Self {
            source,
            fallback: fallback::boroughs(),
            snapshot: OnceCell::new(),
            loading: AtomicBool::new(false),
            fetch_attempts: AtomicUsize::new(0),
        }
    }

    /// Replace the fallback dataset. An empty fallback means a failed
    /// primary load ends in `LoadOutcome::Failed`.
    pub fn with_fallback(mut self, fallback: Vec<BoroughRecord>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn state(&self) -> LoadState {
        if self.snapshot.initialized() {
            LoadState::Loaded
        } else if self.loading.load(Ordering::SeqCst) {
            LoadState::Loading
        } else {
            LoadState::Unloaded
        }
    }

    /// Number of times the source has been asked for the dataset.
    pub fn fetch_attempts(&self) -> usize {
        self.fetch_attempts.load(Ordering::SeqCst)
    }

    /// The outcome if loading has finished; never triggers a load.
    pub fn load_outcome(&self) -> Option<&LoadOutcome> {
        self.snapshot.get().map(|s| &s.outcome)
    }

    /// When the dataset was installed, if it has been.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.get().map(|s| s.loaded_at)
    }

    /// Load the dataset if nobody has yet, and return the outcome.
    pub async fn ensure_loaded(&self) -> &LoadOutcome {
        let snapshot = self
            .snapshot
            .get_or_init(|| async {
                let _loading = LoadingGuard::enter(&self.loading);
                let outcome = self.load().await;
                Snapshot {
                    outcome,
                    loaded_at: Utc::now(),
                }
            })
            .await;
        &snapshot.outcome
    }

    async fn load(&self) -> LoadOutcome {
        self.fetch_attempts.fetch_add(1, Ordering::SeqCst);
        let location = self.source.describe();

        let text = match self.source.fetch().await {
            Ok(text) => text,
            Err(e) => return self.fall_back(&location, format!("{e:#}")),
        };

        let records = parser::parse_dataset(&text);
        if records.is_empty() {
            return self.fall_back(&location, "dataset contained no usable rows".to_string());
        }

        info!(source = %location, boroughs = records.len(), "Borough dataset loaded");
        LoadOutcome::Loaded(records)
    }

    fn fall_back(&self, location: &str, reason: String) -> LoadOutcome {
        if self.fallback.is_empty() {
            warn!(source = %location, reason = %reason, "Borough dataset unavailable and no fallback");
            return LoadOutcome::Failed { reason };
        }

        warn!(
            source = %location,
            reason = %reason,
            boroughs = self.fallback.len(),
            "Borough dataset unavailable, using fallback"
        );
        LoadOutcome::FellBack {
            records: self.fallback.clone(),
            reason,
        }
    }

    /// All records in dataset order.
    pub async fn get_all(&self) -> &[BoroughRecord] {
        self.ensure_loaded().await.records()
    }

    /// First record whose name contains `name`, ignoring case.
    pub async fn get_by_borough(&self, name: &str) -> Option<&BoroughRecord> {
        let needle = name.to_lowercase();
        self.get_all()
            .await
            .iter()
            .find(|r| r.borough.to_lowercase().contains(&needle))
    }

    /// Summary statistics over the loaded dataset.
    pub async fn compute_stats(&self) -> Result<MarketStats, PropvalError> {
        summarize(self.get_all().await)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Compute summary statistics in a single pass.
///
/// Ties on price or crime rate keep the record seen first.
pub fn summarize(records: &[BoroughRecord]) -> Result<MarketStats, PropvalError> {
    let first = records.first().ok_or(PropvalError::EmptyDataset)?;

    let mut cheapest = first;
    let mut dearest = first;
    let mut safest = first;
    let mut tax_min = first.council_tax;
    let mut tax_max = first.council_tax;
    let mut price_total: u128 = 0;
    let mut crime_total = 0.0;

    for r in records {
        if r.avg_house_price < cheapest.avg_house_price {
            cheapest = r;
        }
        if r.avg_house_price > dearest.avg_house_price {
            dearest = r;
        }
        if r.crime_rate < safest.crime_rate {
            safest = r;
        }
        tax_min = tax_min.min(r.council_tax);
        tax_max = tax_max.max(r.council_tax);
        price_total += u128::from(r.avg_house_price);
        crime_total += r.crime_rate;
    }

    let n = records.len();
    Ok(MarketStats {
        total_boroughs: n,
        average_price: (price_total as f64 / n as f64).round() as u64,
        price_range: PriceRangeStats {
            min: cheapest.avg_house_price,
            max: dearest.avg_house_price,
            min_borough: cheapest.borough.clone(),
            max_borough: dearest.borough.clone(),
        },
        council_tax_range: CouncilTaxRange {
            min: tax_min,
            max: tax_max,
        },
        crime_stats: CrimeStats {
            average: crime_total / n as f64,
            safest_borough: safest.borough.clone(),
            safest_rate: safest.crime_rate,
        },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
