use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use domain::{
    CreateResult, FieldError, Pagination, ReviewInput, ReviewPage, SortCatalog, SortOption,
    DEFAULT_PAGE_SIZE,
};
use serde::Deserialize;
use service::RawUpload;

use crate::auth::CurrentUser;
use crate::http::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub product_id: Option<i64>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReviewPage>, ApiError> {
    let sort = SortCatalog::resolve(params.sort.as_deref());
    let page = Pagination::new(
        params.page.unwrap_or(1),
        params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    Ok(Json(state.listing.list(params.product_id, sort, page).await?))
}

pub async fn list_sortings() -> Json<&'static [SortOption]> {
    Json(SortCatalog::all())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub name: String,
    pub content_type: Option<String>,
    /// Base64 编码的文件内容
    pub data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(flatten)]
    pub review: ReviewInput,
    #[serde(default)]
    pub files: Vec<UploadPayload>,
    pub challenge_response: String,
}

fn decode_files(files: Vec<UploadPayload>) -> Result<Vec<RawUpload>, FieldError> {
    files
        .into_iter()
        .map(|f| {
            let bytes = STANDARD
                .decode(f.data.trim())
                .map_err(|_| FieldError::new("files", format!("{} is not valid base64", f.name)))?;
            Ok(RawUpload {
                name: f.name,
                content_type: f.content_type,
                bytes,
            })
        })
        .collect()
}

fn rejected(errors: Vec<FieldError>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(CreateResult::Rejected { errors }),
    )
        .into_response()
}

/// 无法解析或类型不对的请求体，按字段错误的结构返回
fn body_rejected(rejection: JsonRejection) -> Response {
    tracing::debug!("unreadable review body: {}", rejection.body_text());
    rejected(vec![FieldError::new("body", rejection.body_text())])
}

pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => return Ok(body_rejected(rejection)),
    };

    if !state.pow.verify_response(&payload.challenge_response) {
        return Ok((StatusCode::FORBIDDEN, "Invalid PoW Challenge").into_response());
    }

    let files = match decode_files(payload.files) {
        Ok(files) => files,
        Err(error) => return Ok(rejected(vec![error])),
    };

    let mut input = payload.review;
    input.user_id = user_id;
    input.origin = None;

    let result = state.creator.create(input, files).await?;
    let status = if result.is_success() {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(result)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequest;

    #[test]
    fn request_body_flattens_review_fields() {
        let body = serde_json::json!({
            "rating": 4,
            "review": "Fits well and the fabric feels sturdy",
            "userName": "Olga",
            "elementId": 42,
            "challengeResponse": "abc|17",
            "files": [{ "name": "photo.jpg", "contentType": "image/jpeg", "data": "aGVsbG8=" }]
        });
        let req: CreateReviewRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.review.rating, Some(4));
        assert_eq!(req.review.element_id, Some(42));
        assert_eq!(req.challenge_response, "abc|17");

        let files = decode_files(req.files).unwrap();
        assert_eq!(files[0].bytes, b"hello");
        assert_eq!(files[0].content_type.as_deref(), Some("image/jpeg"));
    }

    async fn extract(body: &'static str) -> Result<Json<CreateReviewRequest>, JsonRejection> {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/api/reviews")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        Json::<CreateReviewRequest>::from_request(req, &()).await
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn mistyped_body_gets_the_rejection_shape() {
        let rejection = extract(r#"{"rating":"5","review":"Solid","challengeResponse":"a|1"}"#)
            .await
            .err()
            .unwrap();
        let resp = body_rejected(rejection);
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn missing_challenge_gets_the_rejection_shape() {
        let rejection = extract(r#"{"rating":5,"review":"Solid enough","elementId":1}"#)
            .await
            .err()
            .unwrap();
        let json = body_json(body_rejected(rejection)).await;
        assert_eq!(json["success"], false);
        assert!(json["errors"][0]["message"]
            .as_str()
            .unwrap()
            .contains("challengeResponse"));
    }

    #[test]
    fn broken_base64_is_a_field_error() {
        let err = decode_files(vec![UploadPayload {
            name: "a.png".into(),
            content_type: None,
            data: "***".into(),
        }])
        .unwrap_err();
        assert_eq!(err.field, "files");
    }
}
