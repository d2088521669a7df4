//! Shared harness for router-level tests.
//!
//! Each test gets a fresh in-memory store and router; nothing is shared
//! between tests.

use anyhow::Context as _;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use participant_manager::{
    api::create_router,
    config::Config,
    db::InMemoryEntityStore,
    models::{
        App, EnrollmentStatus, Location, ParticipantRegistrySite, ParticipantStudy, Permission,
        Site, SiteStatus, Study, StudyPermission, StudyType, User,
    },
    state::AppState,
};
use std::{future::Future, pin::Pin, sync::Arc};
use tower::ServiceExt;

pub const USER_ID: &str = "user-admin";
pub const VIEWER_ID: &str = "user-viewer";
pub const OUTSIDER_ID: &str = "user-outsider";
pub const APP_ID: &str = "app-1";
pub const LOCATION_ID: &str = "location-1";
pub const STUDY_ID: &str = "study-1";
pub const SITE_ID: &str = "site-1";
pub const REGISTRY_ID: &str = "registry-1";

pub struct TestApp {
    router: Router,
    pub store: Arc<InMemoryEntityStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryEntityStore::new());
        let state = AppState::with_store(config, store.clone());
        Self {
            router: create_router(state),
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Vec<u8>)> {
        self.request_with_extra_headers(method, path, body, &[])
            .await
    }

    /// Request on behalf of `user_id`.
    pub async fn request_as(
        &self,
        user_id: &str,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Vec<u8>)> {
        self.request_with_extra_headers(method, path, body, &[("userId", user_id)])
            .await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Vec<u8>)> {
        let mut builder = Request::builder().method(method).uri(path);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .context("build request")?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;
        Ok((status, headers, bytes.to_vec()))
    }
}

pub async fn with_test_app<F>(f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a TestApp) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>,
{
    let app = TestApp::new();
    f(&app).await
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected {expected}, got {actual}"
    );
}

pub fn to_json_body(value: &serde_json::Value) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn parse_json(body: &[u8]) -> anyhow::Result<serde_json::Value> {
    serde_json::from_slice(body).with_context(|| {
        format!(
            "response body is not JSON: {}",
            String::from_utf8_lossy(body)
        )
    })
}

/// Fixed base time so ordering assertions are deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        first_name: None,
        last_name: None,
        created_at: base_time(),
    }
}

pub fn app(id: &str) -> App {
    App {
        id: id.to_string(),
        custom_id: format!("CUSTOM-{id}"),
        name: format!("App {id}"),
    }
}

pub fn location(id: &str, name: &str) -> Location {
    Location {
        id: id.to_string(),
        custom_id: format!("CUSTOM-{id}"),
        name: name.to_string(),
        description: None,
    }
}

pub fn study(id: &str, name: &str, study_type: StudyType, app_id: Option<&str>) -> Study {
    Study {
        id: id.to_string(),
        custom_id: format!("CUSTOM-{id}"),
        name: name.to_string(),
        study_type,
        app_id: app_id.map(str::to_string),
        created_at: base_time(),
    }
}

pub fn site(id: &str, study_id: &str, status: SiteStatus, target: i32) -> Site {
    Site {
        id: id.to_string(),
        study_id: study_id.to_string(),
        location_id: Some(LOCATION_ID.to_string()),
        status,
        target_enrollment: target,
        created_at: base_time(),
    }
}

pub fn permission(user_id: &str, study_id: &str, edit: Permission) -> StudyPermission {
    StudyPermission {
        id: format!("perm-{user_id}-{study_id}"),
        user_id: user_id.to_string(),
        study_id: study_id.to_string(),
        app_id: Some(APP_ID.to_string()),
        edit,
    }
}

pub fn registry(
    id: &str,
    site_id: &str,
    study_id: &str,
    offset_minutes: i64,
) -> ParticipantRegistrySite {
    ParticipantRegistrySite {
        id: id.to_string(),
        site_id: site_id.to_string(),
        study_id: study_id.to_string(),
        email: Some(format!("{id}@participants.example.com")),
        invitation_date: Some(base_time()),
        created_at: base_time() + Duration::minutes(offset_minutes),
    }
}

pub fn enrollment(
    registry: &ParticipantRegistrySite,
    status: EnrollmentStatus,
) -> ParticipantStudy {
    ParticipantStudy {
        id: format!("ps-{}", registry.id),
        participant_registry_site_id: registry.id.clone(),
        site_id: registry.site_id.clone(),
        study_id: registry.study_id.clone(),
        status,
        enrolled_date: Some(base_time() + Duration::days(1)),
    }
}

/// One OPEN study with one ACTIVE site (target 10) and one enrolled
/// participant. `USER_ID` has EDIT, `VIEWER_ID` has VIEW, `OUTSIDER_ID` has
/// no permission.
pub fn seed_default(store: &InMemoryEntityStore) {
    for id in [USER_ID, VIEWER_ID, OUTSIDER_ID] {
        store.save_user(user(id));
    }
    store.save_app(app(APP_ID));
    store.save_location(location(LOCATION_ID, "Main Clinic"));
    store.save_study(study(STUDY_ID, "Alpha Study", StudyType::Open, Some(APP_ID)));
    store.save_site(site(SITE_ID, STUDY_ID, SiteStatus::Active, 10));
    store.save_study_permission(permission(USER_ID, STUDY_ID, Permission::Edit));
    store.save_study_permission(permission(VIEWER_ID, STUDY_ID, Permission::View));

    let registration = registry(REGISTRY_ID, SITE_ID, STUDY_ID, 0);
    store.save_participant_study(enrollment(&registration, EnrollmentStatus::Enrolled));
    store.save_registry_participant(registration);
}
