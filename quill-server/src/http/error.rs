//! Page error types with IntoResponse
//!
//! This server renders HTML, so failures map to minimal HTML bodies:
//! a bare 404 for anything unresolvable, a generic 500 for collaborator
//! failures. The real error is logged, never exposed.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::db::DbError;
use crate::http::pages;

/// Error type for page handlers with automatic status mapping.
#[derive(Debug)]
pub enum PageError {
    /// Entry or route not resolvable (404)
    NotFound,

    /// Database failure (500, logged)
    Database(DbError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Html(pages::not_found_body())).into_response()
            }
            Self::Database(e) => {
                // Log the actual error, return a generic body.
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::server_error_body()),
                )
                    .into_response()
            }
        }
    }
}

impl From<DbError> for PageError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn not_found_is_404_with_minimal_body() {
        let response = PageError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h3>Not found</h3>");
    }

    #[tokio::test]
    async fn database_error_is_500_with_generic_body() {
        let err = PageError::Database(DbError::DuplicateSlug);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8_lossy(&body);
        assert!(!body.contains("slug"));
    }

    #[tokio::test]
    async fn db_not_found_maps_to_404() {
        let err: PageError = DbError::NotFound {
            slug: "missing".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
