//! Site enrollment target updates.

use crate::{
    db::EntityStore,
    error::ErrorCode,
    models::UserId,
    services::{permission::PermissionResolver, state_validator, MessageCode},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetEnrollmentRequest {
    #[validate(
        required(message = "must not be null"),
        range(min = 0, message = "must be greater than or equal to 0")
    )]
    pub target_enrollment: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetEnrollmentResponse {
    pub site_id: String,
    pub message: MessageCode,
}

pub struct EnrollmentService {
    store: Arc<dyn EntityStore>,
    resolver: PermissionResolver,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn EntityStore>, resolver: PermissionResolver) -> Self {
        Self { store, resolver }
    }

    /// Set the target enrollment of the study's site.
    ///
    /// Every check runs before the single write, so a rejected request leaves
    /// the store untouched.
    pub async fn update_target_enrollment(
        &self,
        user_id: &UserId,
        study_id: &str,
        request: UpdateTargetEnrollmentRequest,
    ) -> Result<UpdateTargetEnrollmentResponse> {
        request.validate()?;
        let target_enrollment = request
            .target_enrollment
            .ok_or_else(|| Error::violation("targetEnrollment", "must not be null"))?;

        let study = self
            .store
            .find_study(study_id)
            .await?
            .ok_or(Error::NotFound(ErrorCode::StudyNotFound))?;

        // A study's enrollment target lives on its first (default) site.
        let site = self
            .store
            .list_sites(&study.id)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NotFound(ErrorCode::SiteNotFound))?;

        let access = self.resolver.resolve_for_study(user_id, study).await?;
        if let Err(e) = access.level().require_edit() {
            tracing::info!(
                user_id = %user_id,
                study_id = %access.study.id,
                level = ?access.level(),
                "Enrollment target update denied"
            );
            return Err(e);
        }

        if let Err(rejection) = state_validator::validate_enrollment_update(&access.study, &site) {
            tracing::info!(
                study_id = %access.study.id,
                site_id = %site.id,
                reason = %rejection,
                "Enrollment target update rejected"
            );
            return Err(rejection.into());
        }

        let updated = self
            .store
            .update_site_target_enrollment(&site.id, target_enrollment)
            .await?
            .ok_or(Error::NotFound(ErrorCode::SiteNotFound))?;

        tracing::info!(
            user_id = %user_id,
            study_id = %access.study.id,
            site_id = %updated.id,
            previous = site.target_enrollment,
            target_enrollment = updated.target_enrollment,
            "Updated site target enrollment"
        );

        Ok(UpdateTargetEnrollmentResponse {
            site_id: updated.id,
            message: MessageCode::TargetEnrollmentUpdateSuccess,
        })
    }
}
