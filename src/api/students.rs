//! Student endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::api::middleware::{ApiError, AppState};
use crate::listing::{paginate, FilterMatch, FilterRule, ListPolicy, OrderingKey, Page};
use crate::models::Student;
use crate::validation::{require_text, FieldErrors};

pub const STUDENT_POLICY: ListPolicy = ListPolicy {
    filters: &[
        FilterRule {
            param: "name",
            column: "name",
            matcher: FilterMatch::Contains,
        },
        FilterRule {
            param: "branch",
            column: "branch",
            matcher: FilterMatch::ExactCaseInsensitive,
        },
        FilterRule {
            param: "student_id",
            column: "student_id",
            matcher: FilterMatch::Contains,
        },
    ],
    search_columns: &["name", "branch", "student_id"],
    ordering: &[
        OrderingKey {
            param: "name",
            column: "name",
        },
        OrderingKey {
            param: "branch",
            column: "branch",
        },
        OrderingKey {
            param: "student_id",
            column: "student_id",
        },
    ],
    default_ordering: "name",
    default_page_size: 10,
    max_page_size: 50,
};

#[derive(Debug, Deserialize)]
pub struct StudentPayload {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub student_id: Option<String>,
}

fn validate(payload: &StudentPayload) -> Result<(String, String, String), ApiError> {
    let mut errors = FieldErrors::new();
    let name = require_text(&mut errors, "name", payload.name.as_deref());
    let branch = require_text(&mut errors, "branch", payload.branch.as_deref());
    let student_id = require_text(&mut errors, "student_id", payload.student_id.as_deref());

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok((
        name.unwrap_or_default(),
        branch.unwrap_or_default(),
        student_id.unwrap_or_default(),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Page<Student>>, ApiError> {
    let selection = STUDENT_POLICY.resolve(&params)?;
    let (results, count) = state.students.list(&selection).await?;
    let page = paginate(results, count, &selection, "/students", &params)?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<StudentPayload>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let (name, branch, student_id) = validate(&payload)?;
    let student = state.students.create(&name, &branch, &student_id).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, ApiError> {
    let student = state.students.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(student))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StudentPayload>,
) -> Result<Json<Student>, ApiError> {
    if state.students.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let (name, branch, student_id) = validate(&payload)?;
    let student = Student {
        id,
        name,
        branch,
        student_id,
    };
    state.students.update(&student).await?;
    Ok(Json(student))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.students.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
