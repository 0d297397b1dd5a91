//! Student model

use serde::{Deserialize, Serialize};

/// A student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub branch: String,
    /// Institutional identifier, distinct from the database key
    pub student_id: String,
}
