//! Study queries: the caller's study list and a study's registered participants.

use crate::{
    db::EntityStore,
    error::ErrorCode,
    models::{Permission, RegistryParticipantRecord, Site, StudyType, UserId},
    services::{permission::PermissionResolver, MessageCode},
    Error, Result,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};

/// Status reported for registrations without an enrollment record.
pub const NOT_ENROLLED: &str = "not enrolled";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDetails {
    pub id: String,
    pub custom_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub study_type: StudyType,
    pub app_id: Option<String>,
    pub permission: Permission,
    pub sites_count: usize,
    pub enrolled_count: usize,
    pub target_enrollment: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyListResponse {
    pub studies: Vec<StudyDetails>,
    pub site_permission_count: usize,
    pub message: MessageCode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryParticipant {
    pub id: String,
    pub email: Option<String>,
    pub site_id: String,
    pub custom_location_id: String,
    pub location_name: String,
    pub enrollment_status: String,
    pub invited_date: Option<DateTime<Utc>>,
    pub enrollment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRegistryDetail {
    pub study_id: String,
    pub custom_study_id: String,
    pub study_name: String,
    pub study_type: StudyType,
    pub app_id: String,
    pub custom_app_id: String,
    pub app_name: String,
    pub target_enrollment: i64,
    pub registry_participants: Vec<RegistryParticipant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyParticipantsResponse {
    pub participant_registry_detail: ParticipantRegistryDetail,
    pub message: MessageCode,
}

/// Location labels of a site, empty when the site has no location.
#[derive(Debug, Clone, Default)]
struct SiteLocation {
    custom_id: String,
    name: String,
}

pub struct StudyService {
    store: Arc<dyn EntityStore>,
    resolver: PermissionResolver,
}

impl StudyService {
    pub fn new(store: Arc<dyn EntityStore>, resolver: PermissionResolver) -> Self {
        Self { store, resolver }
    }

    /// Studies the caller holds any permission on, ordered by name.
    pub async fn list_studies(&self, user_id: &UserId) -> Result<StudyListResponse> {
        if self.store.find_user(user_id.as_str()).await?.is_none() {
            tracing::info!(user_id = %user_id, "Study list requested by unknown user");
            return Err(Error::NotFound(ErrorCode::StudyNotFound));
        }

        let permissions = self.store.list_study_permissions(user_id.as_str()).await?;
        if permissions.is_empty() {
            return Err(Error::NotFound(ErrorCode::StudyNotFound));
        }

        let mut studies = Vec::with_capacity(permissions.len());
        let mut site_permission_count = 0;

        for permission in permissions {
            let Some(study) = self.store.find_study(&permission.study_id).await? else {
                tracing::warn!(
                    permission_id = %permission.id,
                    study_id = %permission.study_id,
                    "Study permission references a missing study"
                );
                continue;
            };

            let sites = self.store.list_sites(&study.id).await?;
            let participants = self.store.list_registry_participants(&study.id).await?;
            let enrolled_count = participants.iter().filter(|p| p.is_enrolled()).count();
            let target_enrollment = total_target_enrollment(&sites);

            site_permission_count += sites.len();
            studies.push(StudyDetails {
                id: study.id,
                custom_id: study.custom_id,
                name: study.name,
                study_type: study.study_type,
                app_id: study.app_id,
                permission: permission.edit,
                sites_count: sites.len(),
                enrolled_count,
                target_enrollment,
                enrollment_percentage: enrollment_percentage(enrolled_count, target_enrollment),
            });
        }

        if studies.is_empty() {
            return Err(Error::NotFound(ErrorCode::StudyNotFound));
        }

        studies.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!(
            user_id = %user_id,
            study_count = studies.len(),
            site_permission_count,
            "Listed studies"
        );

        Ok(StudyListResponse {
            studies,
            site_permission_count,
            message: MessageCode::GetStudiesSuccess,
        })
    }

    /// Registered participants of a study the caller may view.
    pub async fn get_study_participants(
        &self,
        user_id: &UserId,
        study_id: &str,
    ) -> Result<StudyParticipantsResponse> {
        let access = self.resolver.resolve(user_id, study_id).await?;
        access.level().require_view()?;

        // The permission itself must be scoped to an app as well.
        if access
            .permission
            .as_ref()
            .is_some_and(|permission| permission.app_id.is_none())
        {
            return Err(Error::NotFound(ErrorCode::AppNotFound));
        }

        let sites = self.store.list_sites(&access.study.id).await?;
        let locations = self.site_locations(&sites).await?;
        let records = self
            .store
            .list_registry_participants(&access.study.id)
            .await?;

        let registry_participants: Vec<RegistryParticipant> = records
            .into_iter()
            .map(|record| registry_participant(record, &locations))
            .collect();

        tracing::debug!(
            user_id = %user_id,
            study_id = %access.study.id,
            participant_count = registry_participants.len(),
            "Fetched study participants"
        );

        Ok(StudyParticipantsResponse {
            participant_registry_detail: ParticipantRegistryDetail {
                study_id: access.study.id,
                custom_study_id: access.study.custom_id,
                study_name: access.study.name,
                study_type: access.study.study_type,
                app_id: access.app.id,
                custom_app_id: access.app.custom_id,
                app_name: access.app.name,
                target_enrollment: total_target_enrollment(&sites),
                registry_participants,
            },
            message: MessageCode::GetParticipantsSuccess,
        })
    }

    async fn site_locations(&self, sites: &[Site]) -> Result<HashMap<String, SiteLocation>> {
        let mut locations = HashMap::with_capacity(sites.len());
        for site in sites {
            let location = match site.location_id.as_deref() {
                Some(location_id) => self
                    .store
                    .find_location(location_id)
                    .await?
                    .map(|l| SiteLocation {
                        custom_id: l.custom_id,
                        name: l.name,
                    })
                    .unwrap_or_default(),
                None => SiteLocation::default(),
            };
            locations.insert(site.id.clone(), location);
        }
        Ok(locations)
    }
}

fn registry_participant(
    record: RegistryParticipantRecord,
    locations: &HashMap<String, SiteLocation>,
) -> RegistryParticipant {
    let location = locations
        .get(&record.registry.site_id)
        .cloned()
        .unwrap_or_default();

    let (enrollment_status, enrollment_date) = match record.participant_study {
        Some(ps) => (ps.status.as_str().to_string(), ps.enrolled_date),
        None => (NOT_ENROLLED.to_string(), None),
    };

    RegistryParticipant {
        id: record.registry.id,
        email: record.registry.email,
        site_id: record.registry.site_id,
        custom_location_id: location.custom_id,
        location_name: location.name,
        enrollment_status,
        invited_date: record.registry.invitation_date,
        enrollment_date,
    }
}

fn total_target_enrollment(sites: &[Site]) -> i64 {
    sites.iter().map(|s| i64::from(s.target_enrollment)).sum()
}

fn enrollment_percentage(enrolled: usize, target: i64) -> Option<f64> {
    (target > 0).then(|| enrolled as f64 * 100.0 / target as f64)
}
