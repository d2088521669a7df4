//! Business logic layer
//!
//! Services compose entity store reads with the permission and state rules,
//! and decide the outcome of each request before anything is written.

pub mod enrollment;
pub mod permission;
pub mod state_validator;
pub mod study;

pub use enrollment::EnrollmentService;
pub use permission::PermissionResolver;
pub use study::StudyService;

/// Catalog of success messages returned alongside response payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    GetStudiesSuccess,
    GetParticipantsSuccess,
    TargetEnrollmentUpdateSuccess,
}

impl MessageCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::GetStudiesSuccess => "Get studies successfully",
            Self::GetParticipantsSuccess => "Get participants successfully",
            Self::TargetEnrollmentUpdateSuccess => "Target enrollment updated successfully",
        }
    }
}

impl serde::Serialize for MessageCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}
