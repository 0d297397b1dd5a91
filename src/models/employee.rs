//! Employee model

use serde::{Deserialize, Serialize};

/// An employee record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub emp_name: String,
    pub designation: String,
    /// Organizational identifier, distinct from the database key
    pub emp_id: String,
}
