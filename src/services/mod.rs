//! Business logic services

pub mod auth;
pub mod password;

pub use auth::{AuthService, AuthServiceError, LoginInput, RegisterInput};
