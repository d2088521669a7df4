//! Study, app and study permission entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Whether a study still accepts changes to its enrollment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudyType {
    Open,
    Close,
}

impl StudyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "CLOSE" => Ok(Self::Close),
            other => Err(crate::Error::Internal(format!(
                "Unknown study type '{other}'"
            ))),
        }
    }
}

/// Capability a study permission grants.
///
/// Ordered so that `Edit` implies `View`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    View,
    Edit,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Edit => "EDIT",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIEW" => Ok(Self::View),
            "EDIT" => Ok(Self::Edit),
            other => Err(crate::Error::Internal(format!(
                "Unknown permission level '{other}'"
            ))),
        }
    }
}

/// Mobile application a study is published in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub custom_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub id: String,
    pub custom_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub study_type: StudyType,
    /// Studies created before being attached to an app have no app reference.
    pub app_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Grants one user a capability on one study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPermission {
    pub id: String,
    pub user_id: String,
    pub study_id: String,
    pub app_id: Option<String>,
    pub edit: Permission,
}
