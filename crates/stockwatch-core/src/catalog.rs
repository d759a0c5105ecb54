use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Product;

/// The catalog could not supply the tracked product list.
///
/// Carried into the run outcome as a marker; the run itself degrades to
/// zero totals instead of aborting.
#[derive(Debug, Error)]
#[error("catalog unavailable: {0}")]
pub struct CatalogError(pub String);

/// Read-only source of the tracked product list, queried once per run.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn tracked_products(&self) -> Result<Vec<Product>, CatalogError>;
}
