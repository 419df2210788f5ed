//! REST endpoints over per-user task documents.
//!
//! Documents are addressed by the user key in the path. Errors are returned
//! as JSON `{ "message": ... }` bodies.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use dailish_core::identity::validate_pin;
use dailish_core::models::validate_task_list;
use dailish_core::protocol::{AppendTaskRequest, CreateDocumentRequest, ReplaceTasksRequest};
use dailish_core::{UserDocument, UserKey};

use crate::database::AppendOutcome;
use crate::errors::{ApiError, ServerResult};
use crate::AppState;

pub async fn health() -> &'static str {
    "OK"
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<Json<UserDocument>> {
    let user_key = UserKey::from_raw(key);
    let document = state
        .db
        .get_document(&user_key)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(document))
}

pub async fn create_document(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Option<Json<CreateDocumentRequest>>,
) -> ServerResult<(StatusCode, Json<UserDocument>)> {
    let user_key = UserKey::from_raw(key);
    let Json(request) = body.unwrap_or_default();
    let pin = validate_pin(request.pin.as_deref())?;

    let document = state
        .db
        .create_document(&user_key, pin)
        .await?
        .ok_or_else(ApiError::conflict)?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn replace_tasks(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<ReplaceTasksRequest>,
) -> ServerResult<Json<UserDocument>> {
    let user_key = UserKey::from_raw(key);
    validate_task_list(&request.tasks)?;

    if !state.db.replace_tasks(&user_key, &request.tasks).await? {
        return Err(ApiError::not_found().into());
    }
    current_document(&state, &user_key).await
}

pub async fn append_task(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<AppendTaskRequest>,
) -> ServerResult<Json<UserDocument>> {
    let user_key = UserKey::from_raw(key);
    validate_task_list(std::slice::from_ref(&request.task))?;

    match state.db.append_task(&user_key, &request.task).await? {
        AppendOutcome::Appended => current_document(&state, &user_key).await,
        AppendOutcome::MissingDocument => Err(ApiError::not_found().into()),
        AppendOutcome::DuplicateId => Err(ApiError::bad_request(format!(
            "Duplicate task id: {}",
            request.task.id
        ))
        .into()),
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<StatusCode> {
    state.db.delete_document(&UserKey::from_raw(key)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_document(state: &AppState, user_key: &UserKey) -> ServerResult<Json<UserDocument>> {
    let document = state
        .db
        .get_document(user_key)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(document))
}
