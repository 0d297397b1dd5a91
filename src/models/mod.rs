//! Domain models

pub mod blog;
pub mod comment;
pub mod employee;
pub mod student;
pub mod token;
pub mod user;

pub use blog::Blog;
pub use comment::Comment;
pub use employee::Employee;
pub use student::Student;
pub use token::AuthToken;
pub use user::User;
