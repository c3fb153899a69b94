use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::models::{NoteResponse, NoteSearchResult, PagedResponse};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        // Registered before /:note_id so "search" is never parsed as an id.
        .route("/search", get(search_notes))
        .route(
            "/:note_id",
            get(get_note).put(update_note).delete(delete_note),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    20
}

async fn create_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let note = state
        .notes
        .create_note(user.id, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn list_notes(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedResponse<NoteResponse>>> {
    let page = state
        .notes
        .list_notes(user.id, params.page, params.size)
        .await?;
    Ok(Json(page))
}

async fn search_notes(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<PagedResponse<NoteSearchResult>>> {
    let page = state
        .notes
        .search_notes(user.id, &params.q, params.page, params.size)
        .await?;
    Ok(Json(page))
}

async fn get_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<NoteResponse>> {
    let note = state.notes.get_note(user.id, note_id).await?;
    Ok(Json(note))
}

async fn update_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>> {
    payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let note = state
        .notes
        .update_note(
            user.id,
            note_id,
            payload.title.as_deref(),
            payload.content.as_deref(),
        )
        .await?;
    Ok(Json(note))
}

async fn delete_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.notes.delete_note(user.id, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
