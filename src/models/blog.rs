//! Blog model

use serde::{Deserialize, Serialize};

/// A blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub blog_title: String,
    pub blog_body: String,
}
