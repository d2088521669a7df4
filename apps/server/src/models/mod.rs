//! Domain entities shared by the store and service layers.

pub mod participant;
pub mod site;
pub mod study;
pub mod user;

pub use participant::{
    EnrollmentStatus, ParticipantRegistrySite, ParticipantStudy, RegistryParticipantRecord,
};
pub use site::{Location, Site, SiteStatus};
pub use study::{App, Permission, Study, StudyPermission, StudyType};
pub use user::{User, UserId, USER_ID_HEADER};
