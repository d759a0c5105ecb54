use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CheckRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckRunItem {
    check_run_id: Uuid,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    total_tracked: i32,
    total_found: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

/// Body returned by a synchronous run trigger: the freshly recorded run
/// row's identity plus the summary the sweep produced.
#[derive(Debug, Serialize)]
pub(super) struct TriggeredRunData {
    check_run_id: Uuid,
    status: &'static str,
    total_tracked: u32,
    total_found: u32,
    duration_secs: f64,
    finished_at: DateTime<Utc>,
    catalog_error: Option<String>,
}

pub(super) async fn list_check_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CheckRunsQuery>,
) -> Result<Json<ApiResponse<Vec<CheckRunItem>>>, ApiError> {
    let rows = stockwatch_db::list_check_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| CheckRunItem {
            check_run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            total_tracked: row.total_tracked,
            total_found: row.total_found,
            error_message: row.error_message,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/runs: run one availability sweep and wait for it.
///
/// The run is recorded in `check_runs` before the sweep starts, so an
/// operator sees it as `running` while the request is in flight. A catalog
/// failure marks the run `failed` but still answers 200 with the zeroed
/// summary and the failure marker.
pub(super) async fn trigger_check_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<TriggeredRunData>>), ApiError> {
    let rid = &req_id.0;

    let run = stockwatch_db::create_check_run(&state.pool, "http")
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    stockwatch_db::start_check_run(&state.pool, run.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let catalog = stockwatch_db::PgCatalog::new(state.pool.clone());
    let outcome = state.engine.run(&catalog).await;

    let summary = &outcome.summary;
    let total_tracked = i32::try_from(summary.total_tracked).unwrap_or(i32::MAX);
    let total_found = i32::try_from(summary.total_found).unwrap_or(i32::MAX);

    let status = match &outcome.catalog_error {
        Some(reason) => {
            stockwatch_db::fail_check_run(&state.pool, run.id, reason)
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
            "failed"
        }
        None => {
            stockwatch_db::complete_check_run(&state.pool, run.id, total_tracked, total_found)
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
            "succeeded"
        }
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: TriggeredRunData {
                check_run_id: run.public_id,
                status,
                total_tracked: summary.total_tracked,
                total_found: summary.total_found,
                duration_secs: summary.duration.as_secs_f64(),
                finished_at: summary.finished_at,
                catalog_error: outcome.catalog_error,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
