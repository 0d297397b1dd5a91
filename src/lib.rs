//! Recordhub - a lightweight record management backend
//!
//! Exposes CRUD APIs over students, employees, blogs and comments, with
//! filtering, free-text search, ordering and page-number pagination, plus
//! token-based registration and login.

pub mod api;
pub mod config;
pub mod db;
pub mod listing;
pub mod models;
pub mod services;
pub mod validation;
