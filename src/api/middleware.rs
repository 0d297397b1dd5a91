//! API middleware and error mapping
//!
//! Owns the shared application state, the error-to-status taxonomy and
//! bearer token authentication.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db::repositories::{
    BlogRepository, CommentRepository, EmployeeRepository, StudentRepository,
};
use crate::listing::ListError;
use crate::models::User;
use crate::services::{AuthService, AuthServiceError};
use crate::validation::FieldErrors;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub students: Arc<dyn StudentRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub blogs: Arc<dyn BlogRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub auth: Arc<AuthService>,
}

/// Authenticated user extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error responses for API handlers
#[derive(Debug)]
pub enum ApiError {
    /// 400 with a field-to-messages body
    Validation(FieldErrors),
    /// 404 with an empty body
    NotFound,
    /// 404 for a page number past the end of a listing
    InvalidPage,
    /// 401 with a generic body that does not say what failed
    Authentication,
    /// 500, logged but never detailed to the client
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::InvalidPage => (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": "Invalid page."})),
            )
                .into_response(),
            ApiError::Authentication => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid credentials"})),
            )
                .into_response(),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Internal server error"})),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<ListError> for ApiError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::InvalidPage => ApiError::InvalidPage,
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::Validation(errors) => ApiError::Validation(errors),
            AuthServiceError::InvalidCredentials => ApiError::Authentication,
            AuthServiceError::Internal(err) => ApiError::Internal(err),
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Authentication middleware for token-protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request).ok_or(ApiError::Authentication)?;

    let user = state
        .auth
        .user_for_token(&token)
        .await?
        .ok_or(ApiError::Authentication)?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
