use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use super::attachments::SlotKind;
use super::draft::{
    ApplicationDetailsPatch, CollegeIdPatch, EducationPatch, IdentityProofPatch,
    PersonalInfoPatch, TechnicalPatch,
};
use super::service::{ApplicationService, EngineError};
use super::store::{ApplicationStore, Notifier, ProfileDirectory, SnapshotStore, StoreError};
use super::submission::SubmitError;
use super::sync::{SaveOutcome, SyncError};

/// Shared handler state. The mutex is what enforces "one save/submit in
/// flight at a time": mutating endpoints use `try_lock` and report busy
/// instead of queueing a second operation on the same draft.
pub type SharedService<S, P, L, N> = Arc<Mutex<ApplicationService<S, P, L, N>>>;

/// Router builder exposing the engine to the surrounding UI.
pub fn application_router<S, P, L, N>(service: SharedService<S, P, L, N>) -> Router
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/application",
            get(view_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/completion",
            get(completion_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/personal-info",
            patch(personal_info_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/education",
            patch(education_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/technical",
            patch(technical_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/identity-proof",
            patch(identity_proof_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/college-id",
            patch(college_id_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/details",
            patch(details_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/documents/:slot",
            post(stage_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/save",
            post(save_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/submit",
            post(submit_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/reset",
            post(reset_handler::<S, P, L, N>),
        )
        .route(
            "/api/v1/application/refresh",
            post(refresh_handler::<S, P, L, N>),
        )
        .with_state(service)
}

/// Body for staging a document through the HTTP surface.
#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub filename: String,
    pub content_type: String,
    /// File bytes, base64 encoded for the JSON transport.
    pub data: String,
}

fn busy_response() -> Response {
    let payload = json!({ "error": "another operation is in flight" });
    (StatusCode::CONFLICT, Json(payload)).into_response()
}

fn error_response(error: &EngineError) -> Response {
    let status = match error {
        EngineError::ReadOnly(_) | EngineError::ResetUnavailable => StatusCode::CONFLICT,
        EngineError::Attachment(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Sync(SyncError::SignInRequired) => StatusCode::UNAUTHORIZED,
        EngineError::Sync(SyncError::NothingToLoad) => StatusCode::NOT_FOUND,
        EngineError::Sync(SyncError::Store(StoreError::Network(_)))
        | EngineError::Submit(SubmitError::Network(_))
        | EngineError::Submit(SubmitError::Upload { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Submit(SubmitError::Precondition(_))
        | EngineError::Submit(SubmitError::Rejected { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn view_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let service = service.lock().await;
    (StatusCode::OK, Json(service.view())).into_response()
}

pub(crate) async fn completion_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let mut service = service.lock().await;
    let report = service.refresh_completion().await.clone();
    (StatusCode::OK, Json(report)).into_response()
}

macro_rules! patch_handler {
    ($name:ident, $patch:ty, $method:ident) => {
        pub(crate) async fn $name<S, P, L, N>(
            State(service): State<SharedService<S, P, L, N>>,
            Json(body): Json<$patch>,
        ) -> Response
        where
            S: ApplicationStore + 'static,
            P: ProfileDirectory + 'static,
            L: SnapshotStore + 'static,
            N: Notifier + 'static,
        {
            let mut service = service.lock().await;
            match service.$method(body) {
                Ok(report) => (StatusCode::OK, Json(report.clone())).into_response(),
                Err(error) => error_response(&error),
            }
        }
    };
}

patch_handler!(personal_info_handler, PersonalInfoPatch, update_personal_info);
patch_handler!(education_handler, EducationPatch, update_education);
patch_handler!(technical_handler, TechnicalPatch, update_technical);
patch_handler!(identity_proof_handler, IdentityProofPatch, update_identity_proof);
patch_handler!(college_id_handler, CollegeIdPatch, update_college_id);
patch_handler!(details_handler, ApplicationDetailsPatch, update_application_details);

pub(crate) async fn stage_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
    Path(slot): Path<String>,
    Json(body): Json<StageRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let kind = match slot.as_str() {
        "identity" => SlotKind::Identity,
        "college-id" => SlotKind::CollegeId,
        _ => {
            let payload = json!({ "error": format!("unknown document slot '{slot}'") });
            return (StatusCode::NOT_FOUND, Json(payload)).into_response();
        }
    };

    let bytes = match BASE64.decode(body.data.as_bytes()) {
        Ok(bytes) => bytes,
        Err(_) => {
            let payload = json!({ "error": "file data is not valid base64" });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    let mut service = service.lock().await;
    match service.stage_document(kind, &body.filename, &body.content_type, bytes) {
        Ok(report) => (StatusCode::OK, Json(report.clone())).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn save_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let Ok(mut service) = service.try_lock() else {
        return busy_response();
    };
    match service.save().await {
        Ok(SaveOutcome::Persisted { status, .. }) => {
            let payload = json!({ "saved": "remote", "status": status.label() });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(SaveOutcome::SavedLocally { at }) => {
            let payload = json!({ "saved": "local", "at": at });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn submit_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let Ok(mut service) = service.try_lock() else {
        return busy_response();
    };
    match service.submit().await {
        Ok(status) => {
            let payload = json!({ "status": status.label() });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn reset_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let Ok(mut service) = service.try_lock() else {
        return busy_response();
    };
    match service.reset_after_rejection().await {
        Ok(report) => (StatusCode::OK, Json(report.clone())).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn refresh_handler<S, P, L, N>(
    State(service): State<SharedService<S, P, L, N>>,
) -> Response
where
    S: ApplicationStore + 'static,
    P: ProfileDirectory + 'static,
    L: SnapshotStore + 'static,
    N: Notifier + 'static,
{
    let mut service = service.lock().await;
    match service.refresh().await {
        Ok(status) => {
            let payload = json!({
                "status": status.label(),
                "form_visible": status.form_visible(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(&error),
    }
}
