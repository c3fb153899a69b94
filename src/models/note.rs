use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// One full-text search hit: the note columns plus the relevance rank and a
/// highlighted snippet computed by Postgres.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NoteSearchResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub rank: f32,
    pub headline: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
}

impl<T> PagedResponse<T> {
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            first: page == 0,
            last: page + 1 >= total_pages,
        }
    }

    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            page: 0,
            size: 0,
            total_elements: 0,
            total_pages: 0,
            first: true,
            last: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_response_arithmetic() {
        let page: PagedResponse<i32> = PagedResponse::new(vec![1, 2, 3], 0, 3, 7);
        assert_eq!(page.total_pages, 3);
        assert!(page.first);
        assert!(!page.last);

        let page: PagedResponse<i32> = PagedResponse::new(vec![7], 2, 3, 7);
        assert!(!page.first);
        assert!(page.last);
    }

    #[test]
    fn test_paged_response_empty() {
        let page: PagedResponse<i32> = PagedResponse::empty();
        assert!(page.content.is_empty());
        assert!(page.first);
        assert!(page.last);
    }
}
