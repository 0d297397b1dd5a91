//! HTTP API
//!
//! Route table:
//! - `/students`, `/students/{id}`: CRUD
//! - `/employees`, `/employees/{id}`: CRUD plus PATCH
//! - `/blogs`, `/blogs/{id}`: CRUD, delete restricted while commented
//! - `/comments`, `/comments/{id}`: CRUD
//! - `/auth/register`, `/auth/login`, `/auth/me`

pub mod auth;
pub mod blogs;
pub mod comments;
pub mod employees;
pub mod middleware;
pub mod students;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::repositories::{
    SqlxBlogRepository, SqlxCommentRepository, SqlxEmployeeRepository, SqlxStudentRepository,
    SqlxTokenRepository, SqlxUserRepository,
};
use crate::services::AuthService;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Wire the repositories and services onto a pool.
pub fn build_state(pool: SqlitePool) -> AppState {
    let auth = Arc::new(AuthService::new(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxTokenRepository::boxed(pool.clone()),
    ));
    AppState {
        students: SqlxStudentRepository::boxed(pool.clone()),
        employees: SqlxEmployeeRepository::boxed(pool.clone()),
        blogs: SqlxBlogRepository::boxed(pool.clone()),
        comments: SqlxCommentRepository::boxed(pool.clone()),
        auth,
        pool,
    }
}

fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/{id}",
            get(students::retrieve)
                .put(students::update)
                .delete(students::destroy),
        )
        .route("/employees", get(employees::list).post(employees::create))
        .route(
            "/employees/{id}",
            get(employees::retrieve)
                .put(employees::update)
                .patch(employees::partial_update)
                .delete(employees::destroy),
        )
        .route("/blogs", get(blogs::list).post(blogs::create))
        .route(
            "/blogs/{id}",
            get(blogs::retrieve).put(blogs::update).delete(blogs::destroy),
        )
        .route("/comments", get(comments::list).post(comments::create))
        .route(
            "/comments/{id}",
            get(comments::retrieve)
                .put(comments::update)
                .delete(comments::destroy),
        )
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(
            Router::new()
                .route("/auth/me", get(auth::me))
                .layer(from_fn_with_state(state, middleware::require_auth)),
        )
}

/// Build the full application router with CORS and request tracing.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            tracing::warn!(origin = %cors_origin, "Invalid CORS origin, allowing no cross-origin requests");
            CorsLayer::new()
        }
    };

    record_routes()
        .merge(auth_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
