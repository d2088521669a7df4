//! Study/site state rules for enrollment changes.

use crate::{
    error::ErrorCode,
    models::{Site, SiteStatus, Study, StudyType},
    Error,
};
use thiserror::Error;

/// Why an enrollment target may not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnrollmentRejection {
    #[error("study is closed")]
    ClosedStudy,
    #[error("site is decommissioned")]
    DecommissionedSite,
}

impl EnrollmentRejection {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ClosedStudy => ErrorCode::CannotUpdateEnrollmentTargetForCloseStudy,
            Self::DecommissionedSite => {
                ErrorCode::CannotUpdateEnrollmentTargetForDecommissionedSite
            }
        }
    }
}

impl From<EnrollmentRejection> for Error {
    fn from(rejection: EnrollmentRejection) -> Self {
        Error::BusinessRule(rejection.error_code())
    }
}

/// Decide whether `site`'s target enrollment may be updated.
///
/// The study-level rule is checked first, so a closed study is reported even
/// when its site is also decommissioned.
pub fn validate_enrollment_update(study: &Study, site: &Site) -> Result<(), EnrollmentRejection> {
    if study.study_type == StudyType::Close {
        return Err(EnrollmentRejection::ClosedStudy);
    }
    if site.status == SiteStatus::Deactive {
        return Err(EnrollmentRejection::DecommissionedSite);
    }
    Ok(())
}
