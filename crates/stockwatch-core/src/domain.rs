use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::retailer::RetailerTag;

/// A delivery-area code used to scope location-aware availability queries,
/// e.g. `"110001"`. Treated as opaque; retailers interpret it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pincode(String);

impl Pincode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Pincode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked product, as loaded from the catalog or a static product set.
///
/// Immutable for the duration of a run; checkers only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Canonical storefront URL of the product page.
    pub url: String,
    /// Retailer-side identifier the checker queries with (item id, ASIN,
    /// article id, part number, or product/SKU code depending on retailer).
    pub source_product_id: String,
    pub retailer: RetailerTag,
    /// Tracking link preferred over `url` in alerts when present.
    pub affiliate_url: Option<String>,
}

impl Product {
    /// The link to put in an alert: the affiliate link when present,
    /// otherwise the canonical product URL.
    #[must_use]
    pub fn alert_link(&self) -> &str {
        self.affiliate_url.as_deref().unwrap_or(&self.url)
    }
}

/// Evidence that a product is currently purchasable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub title: String,
    /// Price as the retailer's display string, when the response carried one.
    pub price: Option<String>,
    /// The pincode that answered, for location-aware retailers.
    pub pincode: Option<Pincode>,
    pub link: String,
}

/// Tally for one retailer within one run.
#[derive(Debug, Clone)]
pub struct RetailerResult {
    pub retailer: RetailerTag,
    /// Products checked for this retailer.
    pub total: u32,
    /// Products that yielded a listing.
    pub found: u32,
    /// Formatted alert lines, one per found listing.
    pub lines: Vec<String>,
}

impl RetailerResult {
    /// A result for a retailer whose task produced nothing, with all its
    /// products still counted as checked.
    #[must_use]
    pub fn empty(retailer: RetailerTag, total: u32) -> Self {
        Self {
            retailer,
            total,
            found: 0,
            lines: Vec::new(),
        }
    }
}

/// Roll-up of one complete run, the only value returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_tracked: u32,
    pub total_found: u32,
    pub duration: Duration,
    pub finished_at: DateTime<Utc>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "checked {} products, found {} in stock in {:.1}s",
            self.total_tracked,
            self.total_found,
            self.duration.as_secs_f64()
        )
    }
}

/// A run's summary plus the catalog failure marker, if loading failed.
///
/// A catalog failure degrades the run to zero totals instead of aborting it,
/// so callers always get a summary back.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub catalog_error: Option<String>,
}
