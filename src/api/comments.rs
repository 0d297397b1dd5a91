//! Comment endpoints
//!
//! Comments must reference an existing blog at create and update time.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::api::middleware::{ApiError, AppState};
use crate::listing::{paginate, FilterMatch, FilterRule, ListPolicy, OrderingKey, Page};
use crate::models::Comment;
use crate::validation::{require_text, FieldErrors, REQUIRED};

pub const COMMENT_POLICY: ListPolicy = ListPolicy {
    filters: &[FilterRule {
        param: "blog",
        column: "blog_id",
        matcher: FilterMatch::ForeignKey,
    }],
    search_columns: &["comment"],
    ordering: &[
        OrderingKey {
            param: "id",
            column: "id",
        },
        OrderingKey {
            param: "blog",
            column: "blog_id",
        },
    ],
    default_ordering: "-id",
    default_page_size: 20,
    max_page_size: 100,
};

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub comment: Option<String>,
    pub blog: Option<i64>,
}

/// Validate the payload, confirming the referenced blog exists.
async fn validate(state: &AppState, payload: &CommentPayload) -> Result<(String, i64), ApiError> {
    let mut errors = FieldErrors::new();
    let comment = require_text(&mut errors, "comment", payload.comment.as_deref());

    let blog = match payload.blog {
        None => {
            errors.push("blog", REQUIRED);
            None
        }
        Some(id) => {
            if state.blogs.get(id).await?.is_none() {
                errors.push(
                    "blog",
                    format!("Invalid pk \"{}\" - object does not exist.", id),
                );
                None
            } else {
                Some(id)
            }
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok((comment.unwrap_or_default(), blog.unwrap_or_default()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Page<Comment>>, ApiError> {
    let selection = COMMENT_POLICY.resolve(&params)?;
    let (results, count) = state.comments.list(&selection).await?;
    let page = paginate(results, count, &selection, "/comments", &params)?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CommentPayload>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let (comment, blog) = validate(&state, &payload).await?;
    let created = state.comments.create(&comment, blog).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state.comments.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(comment))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CommentPayload>,
) -> Result<Json<Comment>, ApiError> {
    if state.comments.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let (comment, blog) = validate(&state, &payload).await?;
    let updated = Comment { id, comment, blog };
    state.comments.update(&updated).await?;
    Ok(Json(updated))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.comments.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
