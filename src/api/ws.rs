//! WebSocket delivery of note events. Best effort: a dropped connection or a
//! lagging client loses events, nothing is replayed.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use tokio::sync::broadcast;

use crate::middleware::CurrentUser;
use crate::realtime::NoteEvent;
use crate::AppState;

pub async fn note_events(
    State(state): State<AppState>,
    user: CurrentUser,
    ws: WebSocketUpgrade,
) -> Response {
    let rx = state.events.subscribe(user.id).await;
    tracing::debug!(user_id = %user.id, "websocket subscriber connected");
    ws.on_upgrade(move |socket| forward_events(socket, rx))
}

async fn forward_events(mut socket: WebSocket, mut rx: broadcast::Receiver<NoteEvent>) {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "websocket subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = socket.recv() => match msg {
                // Inbound frames (pings, keepalives) are ignored.
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }
}
