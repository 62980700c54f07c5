use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// One field-level failure, addressed the way the client form addresses its
/// inputs: `title`, `ingredients.2.quantity`, `items.0.ingredientName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Everything a handler can answer with. Storage-layer errors are mapped into
/// this taxonomy before they reach the client; the raw detail only goes to the
/// log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [FieldError]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match &self {
            ApiError::Validation { message, details } => {
                (message.as_str(), Some(details.as_slice()))
            }
            ApiError::Unauthorized(m) | ApiError::NotFound(m) | ApiError::Conflict(m) => {
                (m.as_str(), None)
            }
            ApiError::Internal(source) => {
                tracing::error!(error = ?source, "internal error");
                ("Internal server error", None)
            }
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rej: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::validation(
            "Invalid JSON body",
            vec![FieldError::new("body", rej.body_text())],
        )
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Not found".into()),
            _ if is_unique_violation(&e) => ApiError::Conflict("Already exists".into()),
            _ => ApiError::Internal(e.into()),
        }
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505).
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == "23505")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    #[tokio::test]
    async fn validation_is_400_with_details() {
        let err = ApiError::validation(
            "Invalid recipe data",
            vec![FieldError::new("title", "Title is required")],
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "Invalid recipe data");
        assert_eq!(body["details"][0]["field"], "title");
        assert_eq!(body["details"][0]["message"], "Title is required");
    }

    #[tokio::test]
    async fn not_found_has_no_details_key() {
        let body = body_json(ApiError::not_found("Recipe not found").into_response()).await;
        assert_eq!(body["error"], "Recipe not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn internal_hides_the_source() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused at 10.0.0.3:5432"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn conflict_and_unauthorized_statuses() {
        assert_eq!(
            ApiError::conflict("Ingredient already exists").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("Authentication token required").status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
