use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use adapter::ImportReport;
use domain::RichText;

use crate::auth::require_admin;
use crate::state::AppState;

type AdminResult<T> = Result<T, (StatusCode, String)>;

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("admin operation failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

fn found(updated: bool, review_id: i64) -> AdminResult<Json<&'static str>> {
    if updated {
        Ok(Json("Updated"))
    } else {
        Err((StatusCode::NOT_FOUND, format!("Review {} not found", review_id)))
    }
}

pub async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
) -> AdminResult<Json<&'static str>> {
    require_admin(&headers, &state.admin_token)?;
    let updated = state
        .db
        .set_review_active(review_id, true)
        .await
        .map_err(internal)?;
    tracing::info!(review_id, "review approved");
    found(updated, review_id)
}

pub async fn unpublish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
) -> AdminResult<Json<&'static str>> {
    require_admin(&headers, &state.admin_token)?;
    let updated = state
        .db
        .set_review_active(review_id, false)
        .await
        .map_err(internal)?;
    tracing::info!(review_id, "review unpublished");
    found(updated, review_id)
}

pub async fn respond(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
    Json(response): Json<RichText>,
) -> AdminResult<Json<&'static str>> {
    require_admin(&headers, &state.admin_token)?;
    if response.text.trim().is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "Response text is empty".into()));
    }
    let updated = state
        .db
        .set_store_response(review_id, &response)
        .await
        .map_err(internal)?;
    found(updated, review_id)
}

pub async fn run_import(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AdminResult<Json<ImportReport>> {
    require_admin(&headers, &state.admin_token)?;
    Ok(Json(state.import.run().await))
}
