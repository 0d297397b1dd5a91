//! Authentication token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque API token.
///
/// Each user holds at most one token; it does not expire and is reused
/// across logins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
