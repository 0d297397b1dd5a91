//! Employee endpoints
//!
//! Employees additionally support PATCH for partial updates; absent
//! fields keep their stored value.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::api::middleware::{ApiError, AppState};
use crate::listing::{paginate, FilterMatch, FilterRule, ListPolicy, OrderingKey, Page};
use crate::models::Employee;
use crate::validation::{optional_text, require_text, FieldErrors};

pub const EMPLOYEE_POLICY: ListPolicy = ListPolicy {
    filters: &[
        FilterRule {
            param: "name",
            column: "emp_name",
            matcher: FilterMatch::Contains,
        },
        FilterRule {
            param: "designation",
            column: "designation",
            matcher: FilterMatch::ExactCaseInsensitive,
        },
        FilterRule {
            param: "emp_id",
            column: "emp_id",
            matcher: FilterMatch::Contains,
        },
    ],
    search_columns: &["emp_name", "designation", "emp_id"],
    ordering: &[
        OrderingKey {
            param: "emp_name",
            column: "emp_name",
        },
        OrderingKey {
            param: "designation",
            column: "designation",
        },
        OrderingKey {
            param: "emp_id",
            column: "emp_id",
        },
    ],
    default_ordering: "emp_name",
    default_page_size: 20,
    max_page_size: 100,
};

#[derive(Debug, Deserialize)]
pub struct EmployeePayload {
    pub emp_name: Option<String>,
    pub designation: Option<String>,
    pub emp_id: Option<String>,
}

fn validate(payload: &EmployeePayload) -> Result<(String, String, String), ApiError> {
    let mut errors = FieldErrors::new();
    let emp_name = require_text(&mut errors, "emp_name", payload.emp_name.as_deref());
    let designation = require_text(&mut errors, "designation", payload.designation.as_deref());
    let emp_id = require_text(&mut errors, "emp_id", payload.emp_id.as_deref());

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok((
        emp_name.unwrap_or_default(),
        designation.unwrap_or_default(),
        emp_id.unwrap_or_default(),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Page<Employee>>, ApiError> {
    let selection = EMPLOYEE_POLICY.resolve(&params)?;
    let (results, count) = state.employees.list(&selection).await?;
    let page = paginate(results, count, &selection, "/employees", &params)?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<EmployeePayload>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let (emp_name, designation, emp_id) = validate(&payload)?;
    let employee = state.employees.create(&emp_name, &designation, &emp_id).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, ApiError> {
    let employee = state.employees.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(employee))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeePayload>,
) -> Result<Json<Employee>, ApiError> {
    if state.employees.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let (emp_name, designation, emp_id) = validate(&payload)?;
    let employee = Employee {
        id,
        emp_name,
        designation,
        emp_id,
    };
    state.employees.update(&employee).await?;
    Ok(Json(employee))
}

pub async fn partial_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeePayload>,
) -> Result<Json<Employee>, ApiError> {
    let existing = state.employees.get(id).await?.ok_or(ApiError::NotFound)?;

    let mut errors = FieldErrors::new();
    let emp_name = optional_text(&mut errors, "emp_name", payload.emp_name.as_deref());
    let designation = optional_text(&mut errors, "designation", payload.designation.as_deref());
    let emp_id = optional_text(&mut errors, "emp_id", payload.emp_id.as_deref());
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let employee = Employee {
        id,
        emp_name: emp_name.unwrap_or(existing.emp_name),
        designation: designation.unwrap_or(existing.designation),
        emp_id: emp_id.unwrap_or(existing.emp_id),
    };
    state.employees.update(&employee).await?;
    Ok(Json(employee))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.employees.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
