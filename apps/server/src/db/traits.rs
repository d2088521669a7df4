//! Entity store trait definition

use crate::{
    models::{App, Location, RegistryParticipantRecord, Site, Study, StudyPermission, User},
    Result,
};
use async_trait::async_trait;

/// Abstract interface over durable study records.
///
/// Lookups return `Ok(None)` for missing rows; `Err` is reserved for
/// infrastructure failures.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn find_app(&self, app_id: &str) -> Result<Option<App>>;

    async fn find_location(&self, location_id: &str) -> Result<Option<Location>>;

    async fn find_study(&self, study_id: &str) -> Result<Option<Study>>;

    /// The single permission linking `user_id` to `study_id`, if any.
    async fn find_study_permission(
        &self,
        user_id: &str,
        study_id: &str,
    ) -> Result<Option<StudyPermission>>;

    /// All permissions held by a user.
    async fn list_study_permissions(&self, user_id: &str) -> Result<Vec<StudyPermission>>;

    async fn find_site(&self, site_id: &str) -> Result<Option<Site>>;

    /// Sites of a study, oldest first.
    async fn list_sites(&self, study_id: &str) -> Result<Vec<Site>>;

    /// Registrations of a study joined with their enrollment, oldest first.
    async fn list_registry_participants(
        &self,
        study_id: &str,
    ) -> Result<Vec<RegistryParticipantRecord>>;

    /// Set a site's target enrollment. Returns the updated site, or `None` when
    /// the site does not exist.
    async fn update_site_target_enrollment(
        &self,
        site_id: &str,
        target_enrollment: i32,
    ) -> Result<Option<Site>>;
}
