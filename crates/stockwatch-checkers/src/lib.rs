//! Retailer availability checkers behind one uniform contract.
//!
//! Each storefront gets one adapter implementing [`Checker`]; callers pick
//! adapters out of the [`registry::CheckerRegistry`] by tag and never see
//! retailer-specific request or response shapes.

pub mod error;
pub mod http;
pub mod identify;
pub mod registry;
pub mod retailers;

use async_trait::async_trait;

use stockwatch_core::{Listing, Pincode, Product, RetailerTag};

pub use error::CheckerError;
pub use http::build_http_client;
pub use identify::{
    identify_product, resolve_reliance_article_id, IdentifiedProduct, IdentifyError,
};
pub use registry::{build_registry, CheckerRegistry, ProductSource, RetailerEntry};

/// One retailer-specific availability probe.
///
/// Implementations make exactly one outbound request per call and never
/// retry; pacing across calls belongs to the caller. `pincode` is `None`
/// for location-agnostic storefronts.
#[async_trait]
pub trait Checker: Send + Sync {
    fn retailer(&self) -> RetailerTag;

    /// Returns `Ok(Some(listing))` when the product is purchasable,
    /// `Ok(None)` when the retailer answered "not available".
    ///
    /// # Errors
    ///
    /// Returns [`CheckerError`] when the probe could not produce an answer
    /// (transport failure, deadline, parse failure, missing credentials).
    async fn check(
        &self,
        product: &Product,
        pincode: Option<&Pincode>,
    ) -> Result<Option<Listing>, CheckerError>;
}

/// What one check call resolved to, with failures contained as values.
#[derive(Debug)]
pub enum CheckOutcome {
    Found(Listing),
    NotAvailable,
    Failed(CheckerError),
}

impl CheckOutcome {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, CheckOutcome::Found(_))
    }
}

/// Runs one check and folds every error into [`CheckOutcome::Failed`], so
/// callers never handle retailer-specific errors.
pub async fn outcome(
    checker: &dyn Checker,
    product: &Product,
    pincode: Option<&Pincode>,
) -> CheckOutcome {
    match checker.check(product, pincode).await {
        Ok(Some(listing)) => CheckOutcome::Found(listing),
        Ok(None) => CheckOutcome::NotAvailable,
        Err(e) => CheckOutcome::Failed(e),
    }
}
