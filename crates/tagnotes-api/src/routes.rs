//! Axum route handlers for the notes API.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tagnotes_core::{Note, NotesService};
use tagnotes_sqlite::SqliteSession;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
struct CreateNoteRequest {
    title: Option<String>,
    content: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Absent fields are written as empty values: PUT replaces, it does not merge.
#[derive(Deserialize)]
struct UpdateNoteRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Serialize)]
pub(crate) struct CreatedResponse {
    message: &'static str,
    id: i64,
}

#[derive(Serialize)]
pub(crate) struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ServiceDescriptor {
    message: &'static str,
    version: &'static str,
    endpoints: Value,
}

/// A note id taken from the path.
///
/// Only plain decimal digits count; anything else is treated as a path that
/// matches no route.
pub(crate) struct NoteId(i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for NoteId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::RouteNotFound)?;

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ApiError::RouteNotFound);
        }
        raw.parse().map(NoteId).map_err(|_| ApiError::RouteNotFound)
    }
}

fn get_service(state: &AppState) -> Result<NotesService<SqliteSession>, tagnotes_core::Error> {
    Ok(NotesService::new(state.store.session()?))
}

/// Unwrap a JSON body that must be a non-empty object.
fn object_body(
    payload: Result<Json<Value>, JsonRejection>,
    missing: &str,
) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(map))) if !map.is_empty() => Ok(map),
        Ok(_) => Err(ApiError::Validation(missing.to_string())),
        Err(rejection) => {
            debug!(rejection = %rejection, "request body rejected");
            Err(ApiError::Validation(missing.to_string()))
        }
    }
}

fn parse_fields<T: DeserializeOwned>(map: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ApiError::Validation(format!("Invalid field: {}", e)))
}

// GET /
pub(crate) async fn index() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        message: "Notes API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: serde_json::json!({
            "GET /notes": "Get all notes",
            "GET /notes/<id>": "Get note by ID",
            "POST /notes": "Create new note",
            "PUT /notes/<id>": "Update note",
            "DELETE /notes/<id>": "Delete note",
            "GET /notes/tag/<tag>": "Search notes by tag",
            "GET /health": "Health check",
        }),
    })
}

// GET /health
pub(crate) async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let check = match get_service(&state) {
        Ok(service) => service.ping().await,
        Err(e) => Err(e),
    };

    match check {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "disconnected",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

// GET /notes
pub(crate) async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let service = get_service(&state)?;
    Ok(Json(service.list_notes().await?))
}

// GET /notes/:id
pub(crate) async fn get_note(
    State(state): State<AppState>,
    NoteId(id): NoteId,
) -> Result<Json<Note>, ApiError> {
    let service = get_service(&state)?;
    let note = service
        .get_note(id)
        .await?
        .ok_or_else(|| tagnotes_core::Error::NotFound("Note not found".into()))?;
    Ok(Json(note))
}

// POST /notes
pub(crate) async fn create_note(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    const MISSING: &str = "Missing required fields";

    let body: CreateNoteRequest = parse_fields(object_body(payload, MISSING)?)?;
    let (Some(title), Some(content)) = (body.title, body.content) else {
        return Err(ApiError::Validation(MISSING.into()));
    };

    let service = get_service(&state)?;
    let id = service
        .create_note(title, content, body.tags.unwrap_or_default())
        .await?;
    info!(note_id = id, "note created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Note created successfully",
            id,
        }),
    ))
}

// PUT /notes/:id
pub(crate) async fn update_note(
    State(state): State<AppState>,
    NoteId(id): NoteId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let body: UpdateNoteRequest = parse_fields(object_body(payload, "No data provided")?)?;

    let service = get_service(&state)?;
    // A missing id is reported as success, matching the existing clients.
    let updated = service
        .update_note(
            id,
            body.title.unwrap_or_default(),
            body.content.unwrap_or_default(),
            body.tags.unwrap_or_default(),
        )
        .await?;
    info!(note_id = id, updated, "note update handled");

    Ok(Json(MessageResponse {
        message: "Note updated successfully",
    }))
}

// DELETE /notes/:id
pub(crate) async fn delete_note(
    State(state): State<AppState>,
    NoteId(id): NoteId,
) -> Result<Json<MessageResponse>, ApiError> {
    let service = get_service(&state)?;
    let deleted = service.delete_note(id).await?;
    info!(note_id = id, deleted, "note delete handled");

    Ok(Json(MessageResponse {
        message: "Note deleted successfully",
    }))
}

// GET /notes/tag/:tag
pub(crate) async fn search_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let service = get_service(&state)?;
    Ok(Json(service.search_by_tag(&tag).await?))
}

pub(crate) async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

pub(crate) async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
