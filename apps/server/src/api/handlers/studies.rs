//! Study handlers.
//!
//! Extractor order matters: the `userId` header is checked before the path and
//! body, so a missing header always yields its own violation.

use crate::{
    api::extract::{CallerId, ValidatedJson},
    services::enrollment::UpdateTargetEnrollmentRequest,
    state::AppState,
    Result,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// GET /studies
pub async fn list_studies(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Response> {
    let result = state.study_service.list_studies(&user_id).await?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

/// GET /studies/:study_id/participants
pub async fn get_study_participants(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(study_id): Path<String>,
) -> Result<Response> {
    let result = state
        .study_service
        .get_study_participants(&user_id, &study_id)
        .await?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

/// PATCH /studies/:study_id/enrollment
pub async fn update_target_enrollment(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(study_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateTargetEnrollmentRequest>,
) -> Result<Response> {
    let result = state
        .enrollment_service
        .update_target_enrollment(&user_id, &study_id, request)
        .await?;
    Ok((StatusCode::OK, Json(result)).into_response())
}
