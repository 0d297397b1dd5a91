//! Comment model

use serde::{Deserialize, Serialize};

/// A comment attached to a blog post.
///
/// The `blog` field carries the id of the referenced blog; the referenced
/// blog must exist when the comment is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub comment: String,
    pub blog: i64,
}
