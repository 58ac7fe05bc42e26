//! WebSocket stream of workspace change notifications.

use std::time::Duration;

use agentdesk_files::WorkspaceEvent;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::handlers::ThreadQuery;
use super::state::AppState;

/// Ping interval for keepalive.
const PING_INTERVAL_SECS: u64 = 30;

/// GET /ws/events?threadId=
///
/// Without `threadId` every thread's events are forwarded.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    // Subscribe before upgrading so nothing emitted in between is lost.
    let events = state.commands.workspace().subscribe();
    info!(
        "WebSocket subscription for {}",
        query.thread_id.as_deref().unwrap_or("all threads")
    );
    ws.on_upgrade(move |socket| handle_connection(socket, events, query.thread_id))
}

fn wants(filter: Option<&str>, event: &WorkspaceEvent) -> bool {
    match (filter, event) {
        (None, _) => true,
        (Some(wanted), WorkspaceEvent::FilesChanged { thread_id, .. }) => wanted == thread_id,
    }
}

async fn handle_connection(
    socket: WebSocket,
    mut events: broadcast::Receiver<WorkspaceEvent>,
    thread_filter: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut ping_interval = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !wants(thread_filter.as_deref(), &event) {
                        continue;
                    }
                    let json = match serde_json::to_string(&event) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!("Failed to serialize workspace event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client lagged, {} workspace events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            },

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("WebSocket receive error: {}", e);
                    break;
                }
            },

            _ = ping_interval.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!("WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(thread: &str) -> WorkspaceEvent {
        WorkspaceEvent::FilesChanged {
            thread_id: thread.to_string(),
            paths: vec!["/a.txt".to_string()],
        }
    }

    #[test]
    fn test_filter_by_thread() {
        assert!(wants(None, &changed("t1")));
        assert!(wants(Some("t1"), &changed("t1")));
        assert!(!wants(Some("t2"), &changed("t1")));
    }
}
