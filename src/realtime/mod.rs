//! Best-effort fan-out of note events to per-user channels. Publishing is
//! fire-and-forget: a user with no connected listeners simply drops the
//! event, and a slow listener loses the oldest events (broadcast lag) rather
//! than slowing down the write path.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::NoteResponse;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteEventType {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteEvent {
    #[serde(rename = "type")]
    pub event_type: NoteEventType,
    pub note_id: Uuid,
    /// Full payload for created/updated; absent for deleted.
    pub note: Option<NoteResponse>,
    pub timestamp: DateTime<Utc>,
}

impl NoteEvent {
    pub fn created(note: NoteResponse) -> Self {
        Self {
            event_type: NoteEventType::Created,
            note_id: note.id,
            note: Some(note),
            timestamp: Utc::now(),
        }
    }

    pub fn updated(note: NoteResponse) -> Self {
        Self {
            event_type: NoteEventType::Updated,
            note_id: note.id,
            note: Some(note),
            timestamp: Utc::now(),
        }
    }

    pub fn deleted(note_id: Uuid) -> Self {
        Self {
            event_type: NoteEventType::Deleted,
            note_id,
            note: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Default)]
pub struct NoteEventPublisher {
    channels: Arc<RwLock<HashMap<Uuid, broadcast::Sender<NoteEvent>>>>,
}

impl NoteEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<NoteEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    pub async fn publish(&self, user_id: Uuid, event: NoteEvent) {
        let mut channels = self.channels.write().await;
        if let Some(sender) = channels.get(&user_id) {
            // send fails only when no receiver is connected; drop the channel
            // so the map does not grow with dead entries.
            if sender.send(event).is_err() {
                channels.remove(&user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    fn note_response(user_id: Uuid) -> NoteResponse {
        let now = Utc::now();
        NoteResponse::from(Note {
            id: Uuid::new_v4(),
            user_id,
            title: "title".to_string(),
            content: "content".to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let publisher = NoteEventPublisher::new();
        let user_id = Uuid::new_v4();
        let mut rx = publisher.subscribe(user_id).await;

        let event = NoteEvent::created(note_response(user_id));
        publisher.publish(user_id, event.clone()).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, NoteEventType::Created);
        assert_eq!(received.note_id, event.note_id);
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_is_a_noop() {
        let publisher = NoteEventPublisher::new();
        let user_id = Uuid::new_v4();
        // Must not block or error.
        publisher.publish(user_id, NoteEvent::deleted(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn test_events_are_scoped_per_user() {
        let publisher = NoteEventPublisher::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut bob_rx = publisher.subscribe(bob).await;

        publisher
            .publish(alice, NoteEvent::created(note_response(alice)))
            .await;

        assert!(matches!(
            bob_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_deleted_event_carries_no_payload() {
        let event = NoteEvent::deleted(Uuid::new_v4());
        assert!(event.note.is_none());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DELETED");
    }
}
