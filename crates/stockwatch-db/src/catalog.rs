//! Postgres-backed catalog source for the run engine.

use async_trait::async_trait;
use sqlx::PgPool;

use stockwatch_core::{CatalogError, CatalogSource, Product};

use crate::products::list_active_products;

/// Serves the tracked product list from the `products` table.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for PgCatalog {
    async fn tracked_products(&self) -> Result<Vec<Product>, CatalogError> {
        let rows = list_active_products(&self.pool)
            .await
            .map_err(|e| CatalogError(e.to_string()))?;

        // Rows with a tag this build does not know are skipped, not fatal;
        // they may belong to a newer deployment sharing the database.
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            match row.to_domain() {
                Ok(product) => products.push(product),
                Err(e) => {
                    tracing::warn!(
                        product = %row.name,
                        public_id = %row.public_id,
                        error = %e,
                        "skipping catalog row with unsupported retailer tag"
                    );
                }
            }
        }

        Ok(products)
    }
}
