//! Blog endpoints
//!
//! Deleting a blog is refused while comments still reference it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::api::middleware::{ApiError, AppState};
use crate::listing::{paginate, FilterMatch, FilterRule, ListPolicy, OrderingKey, Page};
use crate::models::Blog;
use crate::validation::{require_text, FieldErrors};

pub const BLOG_POLICY: ListPolicy = ListPolicy {
    filters: &[FilterRule {
        param: "title",
        column: "blog_title",
        matcher: FilterMatch::Contains,
    }],
    search_columns: &["blog_title", "blog_body"],
    ordering: &[
        OrderingKey {
            param: "blog_title",
            column: "blog_title",
        },
        OrderingKey {
            param: "id",
            column: "id",
        },
    ],
    default_ordering: "-id",
    default_page_size: 5,
    max_page_size: 100,
};

#[derive(Debug, Deserialize)]
pub struct BlogPayload {
    pub blog_title: Option<String>,
    pub blog_body: Option<String>,
}

fn validate(payload: &BlogPayload) -> Result<(String, String), ApiError> {
    let mut errors = FieldErrors::new();
    let blog_title = require_text(&mut errors, "blog_title", payload.blog_title.as_deref());
    let blog_body = require_text(&mut errors, "blog_body", payload.blog_body.as_deref());

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok((blog_title.unwrap_or_default(), blog_body.unwrap_or_default()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Page<Blog>>, ApiError> {
    let selection = BLOG_POLICY.resolve(&params)?;
    let (results, count) = state.blogs.list(&selection).await?;
    let page = paginate(results, count, &selection, "/blogs", &params)?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<BlogPayload>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    let (blog_title, blog_body) = validate(&payload)?;
    let blog = state.blogs.create(&blog_title, &blog_body).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Blog>, ApiError> {
    let blog = state.blogs.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(blog))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BlogPayload>,
) -> Result<Json<Blog>, ApiError> {
    if state.blogs.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let (blog_title, blog_body) = validate(&payload)?;
    let blog = Blog {
        id,
        blog_title,
        blog_body,
    };
    state.blogs.update(&blog).await?;
    Ok(Json(blog))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.blogs.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let attached = state.comments.count_for_blog(id).await?;
    if attached > 0 {
        let mut errors = FieldErrors::new();
        errors.push("blog", "Cannot delete a blog that still has comments.");
        return Err(ApiError::Validation(errors));
    }

    if state.blogs.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
