use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockwatch_checkers::{identify_product, IdentifyError};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    product_id: Uuid,
    name: String,
    url: String,
    source_product_id: String,
    retailer: String,
    affiliate_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackProductRequest {
    pub url: String,
    /// Part or SKU code for storefronts whose URLs do not carry one
    /// (Apple part numbers, vivo/iQOO SKU ids, OPPO variant codes).
    pub part_number: Option<String>,
    /// Overrides the name derived from the URL slug.
    pub name: Option<String>,
    pub affiliate_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackedProductData {
    product_id: Uuid,
    name: String,
    retailer: String,
    source_product_id: String,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = stockwatch_db::list_active_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ProductItem {
            product_id: row.public_id,
            name: row.name,
            url: row.url,
            source_product_id: row.source_product_id,
            retailer: row.retailer,
            affiliate_url: row.affiliate_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/products: start tracking a product from its storefront URL.
///
/// The retailer and its listing identifier are derived from the URL, so the
/// caller only pastes a product page link. Re-adding a listing that is
/// already tracked refreshes it in place.
pub(super) async fn track_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<TrackProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TrackedProductData>>), ApiError> {
    let rid = &req_id.0;

    let url = body.url.trim().to_owned();
    if url.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "url must not be empty",
        ));
    }

    let identified = identify_product(&state.http, &url, body.part_number.as_deref())
        .await
        .map_err(|e| map_identify_error(rid, &e))?;

    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or(identified.name, ToOwned::to_owned);

    let row = stockwatch_db::upsert_product(
        &state.pool,
        &stockwatch_db::NewProduct {
            name,
            url,
            source_product_id: identified.source_product_id,
            retailer: identified.retailer,
            affiliate_url: body.affiliate_url,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: TrackedProductData {
                product_id: row.public_id,
                name: row.name,
                retailer: row.retailer,
                source_product_id: row.source_product_id,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// DELETE /api/v1/products/:product_id: stop tracking a product.
pub(super) async fn untrack_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;

    stockwatch_db::deactivate_product(&state.pool, product_id)
        .await
        .map_err(|e| match e {
            stockwatch_db::DbError::NotFound => {
                ApiError::new(rid, "not_found", "no tracked product with that id")
            }
            other => map_db_error(rid.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deactivated": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// URL problems are the caller's to fix; only a failed page fetch during
/// article-id resolution is reported as a server-side error.
fn map_identify_error(rid: &str, e: &IdentifyError) -> ApiError {
    match e {
        IdentifyError::Fetch(inner) => {
            tracing::error!(error = %inner, "product page fetch failed during identification");
            ApiError::new(rid, "internal_error", "could not fetch the product page")
        }
        other => ApiError::new(rid, "validation_error", other.to_string()),
    }
}
