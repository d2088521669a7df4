//! In-process entity store.
//!
//! Keeps every table in a map behind one mutex. The lock is held only for the
//! duration of a single call, so each operation sees a consistent snapshot and
//! concurrent writes to the same row are last-write-wins.
//!
//! Entities are created outside this service; the `save_*` helpers play that
//! role for tests and local runs.

use super::EntityStore;
use crate::{
    models::{
        App, Location, ParticipantRegistrySite, ParticipantStudy, RegistryParticipantRecord, Site,
        Study, StudyPermission, User,
    },
    Result,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    apps: HashMap<String, App>,
    locations: HashMap<String, Location>,
    studies: HashMap<String, Study>,
    /// Keyed by `(user_id, study_id)`: one permission per pair.
    study_permissions: HashMap<(String, String), StudyPermission>,
    sites: HashMap<String, Site>,
    registry_participants: HashMap<String, ParticipantRegistrySite>,
    /// Keyed by participant registry site id.
    participant_studies: HashMap<String, ParticipantStudy>,
}

#[derive(Default)]
pub struct InMemoryEntityStore {
    tables: Mutex<Tables>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a half-written row behind.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn save_user(&self, user: User) {
        self.tables().users.insert(user.id.clone(), user);
    }

    pub fn save_app(&self, app: App) {
        self.tables().apps.insert(app.id.clone(), app);
    }

    pub fn save_location(&self, location: Location) {
        self.tables().locations.insert(location.id.clone(), location);
    }

    pub fn save_study(&self, study: Study) {
        self.tables().studies.insert(study.id.clone(), study);
    }

    /// Insert or replace the permission for `(user_id, study_id)`.
    pub fn save_study_permission(&self, permission: StudyPermission) {
        let key = (permission.user_id.clone(), permission.study_id.clone());
        self.tables().study_permissions.insert(key, permission);
    }

    pub fn save_site(&self, site: Site) {
        self.tables().sites.insert(site.id.clone(), site);
    }

    pub fn save_registry_participant(&self, registry: ParticipantRegistrySite) {
        self.tables()
            .registry_participants
            .insert(registry.id.clone(), registry);
    }

    /// Insert or replace the enrollment of a registration.
    pub fn save_participant_study(&self, participant_study: ParticipantStudy) {
        self.tables().participant_studies.insert(
            participant_study.participant_registry_site_id.clone(),
            participant_study,
        );
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.tables().users.get(user_id).cloned())
    }

    async fn find_app(&self, app_id: &str) -> Result<Option<App>> {
        Ok(self.tables().apps.get(app_id).cloned())
    }

    async fn find_location(&self, location_id: &str) -> Result<Option<Location>> {
        Ok(self.tables().locations.get(location_id).cloned())
    }

    async fn find_study(&self, study_id: &str) -> Result<Option<Study>> {
        Ok(self.tables().studies.get(study_id).cloned())
    }

    async fn find_study_permission(
        &self,
        user_id: &str,
        study_id: &str,
    ) -> Result<Option<StudyPermission>> {
        Ok(self
            .tables()
            .study_permissions
            .get(&(user_id.to_string(), study_id.to_string()))
            .cloned())
    }

    async fn list_study_permissions(&self, user_id: &str) -> Result<Vec<StudyPermission>> {
        let mut permissions: Vec<StudyPermission> = self
            .tables()
            .study_permissions
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        permissions.sort_by(|a, b| a.study_id.cmp(&b.study_id));
        Ok(permissions)
    }

    async fn find_site(&self, site_id: &str) -> Result<Option<Site>> {
        Ok(self.tables().sites.get(site_id).cloned())
    }

    async fn list_sites(&self, study_id: &str) -> Result<Vec<Site>> {
        let mut sites: Vec<Site> = self
            .tables()
            .sites
            .values()
            .filter(|s| s.study_id == study_id)
            .cloned()
            .collect();
        sites.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(sites)
    }

    async fn list_registry_participants(
        &self,
        study_id: &str,
    ) -> Result<Vec<RegistryParticipantRecord>> {
        let tables = self.tables();
        let mut records: Vec<RegistryParticipantRecord> = tables
            .registry_participants
            .values()
            .filter(|r| r.study_id == study_id)
            .map(|registry| RegistryParticipantRecord {
                participant_study: tables.participant_studies.get(&registry.id).cloned(),
                registry: registry.clone(),
            })
            .collect();
        records.sort_by(|a, b| {
            (a.registry.created_at, &a.registry.id).cmp(&(b.registry.created_at, &b.registry.id))
        });
        Ok(records)
    }

    async fn update_site_target_enrollment(
        &self,
        site_id: &str,
        target_enrollment: i32,
    ) -> Result<Option<Site>> {
        let mut tables = self.tables();
        Ok(tables.sites.get_mut(site_id).map(|site| {
            site.target_enrollment = target_enrollment;
            site.clone()
        }))
    }
}
