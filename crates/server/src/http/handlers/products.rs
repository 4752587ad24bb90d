use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::{FileRef, RatingSummary};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::http::error::ApiError;
use crate::state::AppState;

const DEFAULT_GALLERY_LIMIT: u32 = 20;

pub async fn rating(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<RatingSummary>, ApiError> {
    Ok(Json(state.ratings.summarize(product_id).await?))
}

#[derive(Deserialize)]
pub struct FilesParams {
    pub limit: Option<u32>,
}

pub async fn files(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Query(params): Query<FilesParams>,
) -> Result<Json<Vec<FileRef>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_GALLERY_LIMIT);
    Ok(Json(state.listing.product_files(product_id, limit).await?))
}

pub async fn reviewed(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(product_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let reviewed = state.listing.has_reviewed(user_id, product_id).await?;
    Ok(Json(serde_json::json!({ "reviewed": reviewed })))
}
