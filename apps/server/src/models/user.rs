use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A site administrator. The `userId` request header names one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Name of the header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "userId";

/// A caller id that has passed presence validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Accept a raw header value. Absent or blank values are rejected with a
    /// `userId` violation.
    pub fn parse(raw: Option<&str>) -> crate::Result<Self> {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(Self(value.to_string())),
            _ => Err(crate::Error::violation(USER_ID_HEADER, "header is required")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
