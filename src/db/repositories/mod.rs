//! Data access repositories
//!
//! Each entity exposes a repository trait plus a SQLx-backed
//! implementation, so handlers and services depend on the trait only.

pub mod blog;
pub mod comment;
pub mod employee;
pub mod student;
pub mod token;
pub mod user;

pub use blog::{BlogRepository, SqlxBlogRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use employee::{EmployeeRepository, SqlxEmployeeRepository};
pub use student::{SqlxStudentRepository, StudentRepository};
pub use token::{SqlxTokenRepository, TokenRepository};
pub use user::{NewUser, SqlxUserRepository, UserRepository};
