use crate::api::handlers::studies;
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn study_routes() -> Router<AppState> {
    Router::new()
        .route("/studies", get(studies::list_studies))
        .route(
            "/studies/:study_id/participants",
            get(studies::get_study_participants),
        )
        .route(
            "/studies/:study_id/enrollment",
            patch(studies::update_target_enrollment),
        )
}
