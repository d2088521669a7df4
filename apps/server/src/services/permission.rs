//! Study permission resolution.
//!
//! Resolution happens in a fixed order: the study must exist, it must be
//! linked to an existing app, and only then is the caller's permission looked
//! up. A missing permission is not an error here; callers decide how much
//! access they need through [`PermissionLevel::require_view`] and
//! [`PermissionLevel::require_edit`].

use crate::{
    db::EntityStore,
    error::ErrorCode,
    models::{App, Permission, Study, StudyPermission, UserId},
    Error, Result,
};
use std::sync::Arc;

/// The caller's effective capability on a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    None,
    View,
    Edit,
}

impl PermissionLevel {
    /// Succeeds for any granted permission.
    pub fn require_view(self) -> Result<()> {
        match self {
            Self::View | Self::Edit => Ok(()),
            Self::None => Err(Error::Forbidden(ErrorCode::StudyPermissionAccessDenied)),
        }
    }

    /// Succeeds only for edit permission.
    pub fn require_edit(self) -> Result<()> {
        match self {
            Self::Edit => Ok(()),
            Self::View | Self::None => {
                Err(Error::Forbidden(ErrorCode::StudyPermissionAccessDenied))
            }
        }
    }
}

impl From<Permission> for PermissionLevel {
    fn from(permission: Permission) -> Self {
        match permission {
            Permission::View => Self::View,
            Permission::Edit => Self::Edit,
        }
    }
}

/// A study together with its app and the caller's permission record.
#[derive(Debug, Clone)]
pub struct StudyAccess {
    pub study: Study,
    pub app: App,
    pub permission: Option<StudyPermission>,
}

impl StudyAccess {
    pub fn level(&self) -> PermissionLevel {
        self.permission
            .as_ref()
            .map(|p| PermissionLevel::from(p.edit))
            .unwrap_or(PermissionLevel::None)
    }
}

#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn EntityStore>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Resolve the caller's access to `study_id`.
    pub async fn resolve(&self, user_id: &UserId, study_id: &str) -> Result<StudyAccess> {
        let study = self
            .store
            .find_study(study_id)
            .await?
            .ok_or(Error::NotFound(ErrorCode::StudyNotFound))?;

        self.resolve_for_study(user_id, study).await
    }

    /// Same as [`resolve`](Self::resolve) for a study that is already loaded.
    pub async fn resolve_for_study(&self, user_id: &UserId, study: Study) -> Result<StudyAccess> {
        let app = match study.app_id.as_deref() {
            Some(app_id) => self.store.find_app(app_id).await?,
            None => None,
        }
        .ok_or(Error::NotFound(ErrorCode::AppNotFound))?;

        let permission = self
            .store
            .find_study_permission(user_id.as_str(), &study.id)
            .await?;

        let access = StudyAccess {
            study,
            app,
            permission,
        };

        tracing::debug!(
            user_id = %user_id,
            study_id = %access.study.id,
            level = ?access.level(),
            "Resolved study permission"
        );

        Ok(access)
    }
}
