#![allow(unused)]
#[allow(unused)]
mod support;

use axum::http::{Method, StatusCode};
use participant_manager::models::{EnrollmentStatus, Permission, SiteStatus, StudyType};
use serde_json::Value;
use support::*;

fn assert_error_code(body: &Value, expected: &str) {
    assert_eq!(body["error_code"], expected, "unexpected error body: {body}");
}

#[tokio::test]
async fn missing_user_id_is_rejected_on_every_endpoint() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let participants = format!("/studies/{STUDY_ID}/participants");
            let enrollment = format!("/studies/{STUDY_ID}/enrollment");
            let body = to_json_body(&serde_json::json!({ "targetEnrollment": 5 }))?;

            for (method, path, body) in [
                (Method::GET, "/studies", None),
                (Method::GET, participants.as_str(), None),
                (Method::PATCH, enrollment.as_str(), Some(body)),
            ] {
                let (status, _headers, body) = app.request(method, path, body).await?;
                assert_status(status, StatusCode::BAD_REQUEST, path);

                let json = parse_json(&body)?;
                assert_eq!(json["violations"][0]["path"], "userId");
                assert_eq!(json["violations"][0]["message"], "header is required");
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn blank_user_id_is_rejected() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);
            let (status, _headers, body) = app
                .request_as("   ", Method::GET, "/studies", None)
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "blank userId");
            assert_eq!(parse_json(&body)?["violations"][0]["path"], "userId");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn list_studies_returns_one_study_with_site_count() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let (status, _headers, body) = app
                .request_as(USER_ID, Method::GET, "/studies", None)
                .await?;
            assert_status(status, StatusCode::OK, "list studies");

            let json = parse_json(&body)?;
            assert_eq!(json["sitePermissionCount"], 1);
            assert_eq!(json["message"], "Get studies successfully");

            let studies = json["studies"].as_array().cloned().unwrap_or_default();
            assert_eq!(studies.len(), 1);
            assert_eq!(studies[0]["id"], STUDY_ID);
            assert_eq!(studies[0]["type"], "OPEN");
            assert_eq!(studies[0]["permission"], "EDIT");
            assert_eq!(studies[0]["sitesCount"], 1);
            assert_eq!(studies[0]["enrolledCount"], 1);
            assert_eq!(studies[0]["targetEnrollment"], 10);
            assert_eq!(studies[0]["enrollmentPercentage"], 10.0);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn list_studies_orders_by_name_and_counts_all_sites() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);
            app.store.save_study(study("study-0", "Zeta Study", StudyType::Close, Some(APP_ID)));
            app.store.save_site(site("site-0a", "study-0", SiteStatus::Active, 0));
            app.store.save_site(site("site-0b", "study-0", SiteStatus::Deactive, 0));
            app.store
                .save_study_permission(permission(USER_ID, "study-0", Permission::View));

            let (status, _headers, body) = app
                .request_as(USER_ID, Method::GET, "/studies", None)
                .await?;
            assert_status(status, StatusCode::OK, "list studies");

            let json = parse_json(&body)?;
            assert_eq!(json["sitePermissionCount"], 3);
            assert_eq!(json["studies"][0]["name"], "Alpha Study");
            assert_eq!(json["studies"][1]["name"], "Zeta Study");
            assert_eq!(json["studies"][1]["permission"], "VIEW");
            // No target, no percentage.
            assert!(json["studies"][1].get("enrollmentPercentage").is_none());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn list_studies_for_unknown_user_is_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let (status, _headers, body) = app
                .request_as("nobody", Method::GET, "/studies", None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "unknown user");
            assert_error_code(&parse_json(&body)?, "STUDY_NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn list_studies_without_permissions_is_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let (status, _headers, body) = app
                .request_as(OUTSIDER_ID, Method::GET, "/studies", None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "user without permissions");
            assert_error_code(&parse_json(&body)?, "STUDY_NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn participants_of_single_site_study() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let path = format!("/studies/{STUDY_ID}/participants");
            let (status, _headers, body) = app.request_as(USER_ID, Method::GET, &path, None).await?;
            assert_status(status, StatusCode::OK, "get participants");

            let json = parse_json(&body)?;
            assert_eq!(json["message"], "Get participants successfully");

            let detail = &json["participantRegistryDetail"];
            assert_eq!(detail["studyId"], STUDY_ID);
            assert_eq!(detail["studyName"], "Alpha Study");
            assert_eq!(detail["studyType"], "OPEN");
            assert_eq!(detail["appId"], APP_ID);
            assert_eq!(detail["customAppId"], format!("CUSTOM-{APP_ID}"));
            assert_eq!(detail["targetEnrollment"], 10);

            let participants = detail["registryParticipants"]
                .as_array()
                .cloned()
                .unwrap_or_default();
            assert_eq!(participants.len(), 1);
            assert_eq!(participants[0]["id"], REGISTRY_ID);
            assert_eq!(participants[0]["siteId"], SITE_ID);
            assert_eq!(participants[0]["locationName"], "Main Clinic");
            assert_eq!(participants[0]["customLocationId"], format!("CUSTOM-{LOCATION_ID}"));
            assert_eq!(participants[0]["enrollmentStatus"], "enrolled");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn participants_without_enrollment_are_not_enrolled_and_ordered() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);
            // Registered earlier than the default participant.
            app.store
                .save_registry_participant(registry("registry-0", SITE_ID, STUDY_ID, -30));

            let path = format!("/studies/{STUDY_ID}/participants");
            let (status, _headers, body) = app
                .request_as(VIEWER_ID, Method::GET, &path, None)
                .await?;
            assert_status(status, StatusCode::OK, "viewer reads participants");

            let json = parse_json(&body)?;
            let participants = &json["participantRegistryDetail"]["registryParticipants"];
            assert_eq!(participants[0]["id"], "registry-0");
            assert_eq!(participants[0]["enrollmentStatus"], "not enrolled");
            assert!(participants[0]["enrollmentDate"].is_null());
            assert_eq!(participants[1]["id"], REGISTRY_ID);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn participants_of_unknown_study_is_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let (status, _headers, body) = app
                .request_as(USER_ID, Method::GET, "/studies/missing/participants", None)
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "unknown study");
            assert_error_code(&parse_json(&body)?, "STUDY_NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn participants_of_study_without_app_is_app_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);
            app.store
                .save_study(study(STUDY_ID, "Alpha Study", StudyType::Open, None));

            let path = format!("/studies/{STUDY_ID}/participants");
            let (status, _headers, body) = app.request_as(USER_ID, Method::GET, &path, None).await?;
            assert_status(status, StatusCode::NOT_FOUND, "study without app");
            assert_error_code(&parse_json(&body)?, "APP_NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn participants_with_app_less_permission_is_app_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);
            let mut grant = permission(USER_ID, STUDY_ID, Permission::Edit);
            grant.app_id = None;
            app.store.save_study_permission(grant);

            let path = format!("/studies/{STUDY_ID}/participants");
            let (status, _headers, body) = app.request_as(USER_ID, Method::GET, &path, None).await?;
            assert_status(status, StatusCode::NOT_FOUND, "permission without app");
            assert_error_code(&parse_json(&body)?, "APP_NOT_FOUND");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn participants_without_permission_is_forbidden() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            seed_default(&app.store);

            let path = format!("/studies/{STUDY_ID}/participants");
            let (status, _headers, body) = app
                .request_as(OUTSIDER_ID, Method::GET, &path, None)
                .await?;
            assert_status(status, StatusCode::FORBIDDEN, "no permission");

            let json = parse_json(&body)?;
            assert_error_code(&json, "STUDY_PERMISSION_ACCESS_DENIED");
            assert_eq!(json["status"], 403);
            Ok(())
        })
    })
    .await
}
