//! Participant registrations and their study enrollment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnrollmentStatus {
    InProgress,
    YetToJoin,
    Enrolled,
    Withdrawn,
    NotEligible,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "inProgress",
            Self::YetToJoin => "yetToJoin",
            Self::Enrolled => "enrolled",
            Self::Withdrawn => "withdrawn",
            Self::NotEligible => "notEligible",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inProgress" => Ok(Self::InProgress),
            "yetToJoin" => Ok(Self::YetToJoin),
            "enrolled" => Ok(Self::Enrolled),
            "withdrawn" => Ok(Self::Withdrawn),
            "notEligible" => Ok(Self::NotEligible),
            other => Err(crate::Error::Internal(format!(
                "Unknown enrollment status '{other}'"
            ))),
        }
    }
}

/// A participant's registration at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRegistrySite {
    pub id: String,
    pub site_id: String,
    pub study_id: String,
    pub email: Option<String>,
    pub invitation_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Enrollment of a registered participant in a study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStudy {
    pub id: String,
    pub participant_registry_site_id: String,
    pub site_id: String,
    pub study_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_date: Option<DateTime<Utc>>,
}

/// A registration joined with its (optional) enrollment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryParticipantRecord {
    pub registry: ParticipantRegistrySite,
    pub participant_study: Option<ParticipantStudy>,
}

impl RegistryParticipantRecord {
    pub fn is_enrolled(&self) -> bool {
        matches!(
            self.participant_study.as_ref().map(|ps| ps.status),
            Some(EnrollmentStatus::Enrolled)
        )
    }
}
