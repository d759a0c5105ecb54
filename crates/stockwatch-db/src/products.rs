//! Database operations for the `products` catalog table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stockwatch_core::{Product, RetailerTag, UnknownRetailer};

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub url: String,
    pub source_product_id: String,
    /// Stored as the snake_case tag string; parse with [`ProductRow::to_domain`].
    pub retailer: String,
    pub affiliate_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Convert to the domain type, parsing the stored retailer tag.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownRetailer`] if the stored tag is not a supported
    /// storefront (e.g. a row written by a newer deployment).
    pub fn to_domain(&self) -> Result<Product, UnknownRetailer> {
        let retailer: RetailerTag = self.retailer.parse()?;
        Ok(Product {
            name: self.name.clone(),
            url: self.url.clone(),
            source_product_id: self.source_product_id.clone(),
            retailer,
            affiliate_url: self.affiliate_url.clone(),
        })
    }
}

/// Fields for inserting a tracked product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub url: String,
    pub source_product_id: String,
    pub retailer: RetailerTag,
    pub affiliate_url: Option<String>,
}

/// Returns all active products, ordered by retailer then name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, name, url, source_product_id, retailer, \
                affiliate_url, is_active, created_at, updated_at \
         FROM products \
         WHERE is_active \
         ORDER BY retailer, name, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a product, or refreshes it when the same retailer listing is
/// already tracked.
///
/// Conflicts on `(retailer, source_product_id)` update `name`, `url`,
/// `affiliate_url`, and `updated_at` in place and reactivate the row, so
/// re-adding a removed product brings it back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products \
             (public_id, name, url, source_product_id, retailer, affiliate_url) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (retailer, source_product_id) DO UPDATE SET \
             name          = EXCLUDED.name, \
             url           = EXCLUDED.url, \
             affiliate_url = EXCLUDED.affiliate_url, \
             is_active     = TRUE, \
             updated_at    = NOW() \
         RETURNING id, public_id, name, url, source_product_id, retailer, \
                   affiliate_url, is_active, created_at, updated_at",
    )
    .bind(public_id)
    .bind(&product.name)
    .bind(&product.url)
    .bind(&product.source_product_id)
    .bind(product.retailer.as_str())
    .bind(&product.affiliate_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single product by its `public_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, name, url, source_product_id, retailer, \
                affiliate_url, is_active, created_at, updated_at \
         FROM products \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Soft-removes a product from tracking. The row is kept so the same
/// listing can be re-added later under the same identity.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active row exists with the given id,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_product(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET is_active = FALSE, updated_at = NOW() \
         WHERE public_id = $1 AND is_active",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
