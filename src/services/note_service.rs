use sqlx::PgPool;
use uuid::Uuid;

use crate::db::note_repo;
use crate::error::{ApiError, Result};
use crate::models::{NoteResponse, NoteSearchResult, PagedResponse};
use crate::realtime::{NoteEvent, NoteEventPublisher};

const MAX_PAGE_SIZE: i64 = 50;
// Both bounds are caller-supplied query params; capping the page number keeps
// the page * size offset far from i64 overflow.
const MAX_PAGE: i64 = 1_000_000;

#[derive(Clone)]
pub struct NoteService {
    db: PgPool,
    events: NoteEventPublisher,
}

impl NoteService {
    pub fn new(db: PgPool, events: NoteEventPublisher) -> Self {
        Self { db, events }
    }

    pub async fn create_note(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<NoteResponse> {
        let note = note_repo::create(&self.db, user_id, title.trim(), content).await?;
        tracing::info!(note_id = %note.id, %user_id, "note created");

        let response = NoteResponse::from(note);
        self.events
            .publish(user_id, NoteEvent::created(response.clone()))
            .await;
        Ok(response)
    }

    pub async fn get_note(&self, user_id: Uuid, note_id: Uuid) -> Result<NoteResponse> {
        let note = note_repo::find_by_id_and_user(&self.db, note_id, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("note {note_id}")))?;

        Ok(NoteResponse::from(note))
    }

    pub async fn list_notes(
        &self,
        user_id: Uuid,
        page: i64,
        size: i64,
    ) -> Result<PagedResponse<NoteResponse>> {
        let (page, size) = clamp_page(page, size);
        let notes = note_repo::list_by_user(&self.db, user_id, size, page * size).await?;
        let total = note_repo::count_by_user(&self.db, user_id).await?;

        let content = notes.into_iter().map(NoteResponse::from).collect();
        Ok(PagedResponse::new(content, page, size, total))
    }

    pub async fn update_note(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<NoteResponse> {
        let title = title.map(str::trim);
        let note = note_repo::update(&self.db, note_id, user_id, title, content)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("note {note_id}")))?;
        tracing::info!(%note_id, %user_id, "note updated");

        let response = NoteResponse::from(note);
        self.events
            .publish(user_id, NoteEvent::updated(response.clone()))
            .await;
        Ok(response)
    }

    pub async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<()> {
        let deleted = note_repo::delete(&self.db, note_id, user_id).await?;
        if !deleted {
            return Err(ApiError::NotFound(format!("note {note_id}")));
        }
        tracing::info!(%note_id, %user_id, "note deleted");

        self.events
            .publish(user_id, NoteEvent::deleted(note_id))
            .await;
        Ok(())
    }

    pub async fn search_notes(
        &self,
        user_id: Uuid,
        query: &str,
        page: i64,
        size: i64,
    ) -> Result<PagedResponse<NoteSearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(PagedResponse::empty());
        }

        let (page, size) = clamp_page(page, size);
        let results = note_repo::search(&self.db, user_id, query, size, page * size).await?;
        let total = note_repo::count_search(&self.db, user_id, query).await?;
        tracing::debug!(%user_id, query, total, "note search");

        Ok(PagedResponse::new(results, page, size, total))
    }
}

fn clamp_page(page: i64, size: i64) -> (i64, i64) {
    (page.clamp(0, MAX_PAGE), size.clamp(1, MAX_PAGE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page_bounds() {
        assert_eq!(clamp_page(0, 20), (0, 20));
        assert_eq!(clamp_page(-3, 20), (0, 20));
        assert_eq!(clamp_page(2, 500), (2, MAX_PAGE_SIZE));
        assert_eq!(clamp_page(1, 0), (1, 1));
    }

    #[test]
    fn test_clamp_page_keeps_offset_in_range() {
        let (page, size) = clamp_page(i64::MAX, i64::MAX);
        assert_eq!((page, size), (MAX_PAGE, MAX_PAGE_SIZE));
        // The offset computed from clamped bounds cannot overflow.
        assert_eq!(page.checked_mul(size), Some(MAX_PAGE * MAX_PAGE_SIZE));
    }
}
