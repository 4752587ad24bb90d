use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service::ReviewsError;

/// `ReviewsError` 的 HTTP 表示
pub struct ApiError(pub ReviewsError);

impl From<ReviewsError> for ApiError {
    fn from(e: ReviewsError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ReviewsError::NotFound(_) => StatusCode::NOT_FOUND,
            ReviewsError::Duplicate { .. } => StatusCode::CONFLICT,
            ReviewsError::Configuration(_) | ReviewsError::Io(_) | ReviewsError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(serde_json::json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let status = |e| ApiError(e).status();
        assert_eq!(status(ReviewsError::NotFound("product 3".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ReviewsError::Duplicate {
                platform: "2gis".into(),
                external_id: "a".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(ReviewsError::Configuration("reviews collection".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ReviewsError::Io("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let resp = ApiError(ReviewsError::Storage(anyhow::anyhow!("db locked"))).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
