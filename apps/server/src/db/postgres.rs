//! PostgreSQL-backed `EntityStore` implementation

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    db::traits::EntityStore,
    models::{
        App, Location, ParticipantRegistrySite, ParticipantStudy, RegistryParticipantRecord, Site,
        Study, StudyPermission, User,
    },
    Result,
};

const SITE_COLUMNS: &str = "id, study_id, location_id, status, target_enrollment, created_at";

#[derive(Clone)]
pub struct PostgresEntityStore {
    pool: PgPool,
}

impl PostgresEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn study_from_row(row: &PgRow) -> Result<Study> {
    Ok(Study {
        id: row.try_get("id")?,
        custom_id: row.try_get("custom_id")?,
        name: row.try_get("name")?,
        study_type: row.try_get::<String, _>("type")?.parse()?,
        app_id: row.try_get("app_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn permission_from_row(row: &PgRow) -> Result<StudyPermission> {
    Ok(StudyPermission {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        study_id: row.try_get("study_id")?,
        app_id: row.try_get("app_id")?,
        edit: row.try_get::<String, _>("edit")?.parse()?,
    })
}

fn site_from_row(row: &PgRow) -> Result<Site> {
    Ok(Site {
        id: row.try_get("id")?,
        study_id: row.try_get("study_id")?,
        location_id: row.try_get("location_id")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        target_enrollment: row.try_get("target_enrollment")?,
        created_at: row.try_get("created_at")?,
    })
}

fn registry_participant_from_row(row: &PgRow) -> Result<RegistryParticipantRecord> {
    let registry = ParticipantRegistrySite {
        id: row.try_get("id")?,
        site_id: row.try_get("site_id")?,
        study_id: row.try_get("study_id")?,
        email: row.try_get("email")?,
        invitation_date: row.try_get("invitation_date")?,
        created_at: row.try_get("created_at")?,
    };

    // LEFT JOIN: every participant_studies column is NULL when no enrollment exists.
    let participant_study = match row.try_get::<Option<String>, _>("ps_id")? {
        Some(ps_id) => Some(ParticipantStudy {
            id: ps_id,
            participant_registry_site_id: registry.id.clone(),
            site_id: row.try_get("ps_site_id")?,
            study_id: row.try_get("ps_study_id")?,
            status: row.try_get::<String, _>("ps_status")?.parse()?,
            enrolled_date: row.try_get("ps_enrolled_date")?,
        }),
        None => None,
    };

    Ok(RegistryParticipantRecord {
        registry,
        participant_study,
    })
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, first_name, last_name, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<User> {
            Ok(User {
                id: r.try_get("id")?,
                email: r.try_get("email")?,
                first_name: r.try_get("first_name")?,
                last_name: r.try_get("last_name")?,
                created_at: r.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn find_app(&self, app_id: &str) -> Result<Option<App>> {
        let row = sqlx::query("SELECT id, custom_id, name FROM apps WHERE id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<App> {
            Ok(App {
                id: r.try_get("id")?,
                custom_id: r.try_get("custom_id")?,
                name: r.try_get("name")?,
            })
        })
        .transpose()
    }

    async fn find_location(&self, location_id: &str) -> Result<Option<Location>> {
        let row =
            sqlx::query("SELECT id, custom_id, name, description FROM locations WHERE id = $1")
                .bind(location_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| -> Result<Location> {
            Ok(Location {
                id: r.try_get("id")?,
                custom_id: r.try_get("custom_id")?,
                name: r.try_get("name")?,
                description: r.try_get("description")?,
            })
        })
        .transpose()
    }

    async fn find_study(&self, study_id: &str) -> Result<Option<Study>> {
        let row = sqlx::query(
            "SELECT id, custom_id, name, type, app_id, created_at FROM studies WHERE id = $1",
        )
        .bind(study_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(study_from_row).transpose()
    }

    async fn find_study_permission(
        &self,
        user_id: &str,
        study_id: &str,
    ) -> Result<Option<StudyPermission>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, study_id, app_id, edit
            FROM study_permissions
            WHERE user_id = $1 AND study_id = $2
            "#,
        )
        .bind(user_id)
        .bind(study_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(permission_from_row).transpose()
    }

    async fn list_study_permissions(&self, user_id: &str) -> Result<Vec<StudyPermission>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, study_id, app_id, edit
            FROM study_permissions
            WHERE user_id = $1
            ORDER BY study_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(permission_from_row).collect()
    }

    async fn find_site(&self, site_id: &str) -> Result<Option<Site>> {
        let row = sqlx::query(&format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = $1"))
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(site_from_row).transpose()
    }

    async fn list_sites(&self, study_id: &str) -> Result<Vec<Site>> {
        let rows = sqlx::query(&format!(
            "SELECT {SITE_COLUMNS} FROM sites WHERE study_id = $1 ORDER BY created_at, id"
        ))
        .bind(study_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(site_from_row).collect()
    }

    async fn list_registry_participants(
        &self,
        study_id: &str,
    ) -> Result<Vec<RegistryParticipantRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT
                prs.id,
                prs.site_id,
                prs.study_id,
                prs.email,
                prs.invitation_date,
                prs.created_at,
                ps.id AS ps_id,
                ps.site_id AS ps_site_id,
                ps.study_id AS ps_study_id,
                ps.status AS ps_status,
                ps.enrolled_date AS ps_enrolled_date
            FROM participant_registry_sites prs
            LEFT JOIN participant_studies ps ON ps.participant_registry_site_id = prs.id
            WHERE prs.study_id = $1
            ORDER BY prs.created_at, prs.id
            "#,
        )
        .bind(study_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(registry_participant_from_row).collect()
    }

    async fn update_site_target_enrollment(
        &self,
        site_id: &str,
        target_enrollment: i32,
    ) -> Result<Option<Site>> {
        let row = sqlx::query(&format!(
            "UPDATE sites SET target_enrollment = $2 WHERE id = $1 RETURNING {SITE_COLUMNS}"
        ))
        .bind(site_id)
        .bind(target_enrollment)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(site_from_row).transpose()
    }
}
