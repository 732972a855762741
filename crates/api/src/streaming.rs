//! WebSocket streaming API.
//!
//! Pushes alert events to all connected admin subscribers over a broadcast
//! channel. Delivery is best-effort with no per-subscriber acknowledgment;
//! the polling fallback buffer covers clients without a live connection.

#![allow(missing_docs)]

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use haven_common::AppResult;
use haven_core::{AlertEvent, EventPublisher};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::extractors::token_matches;
use crate::middleware::AppState;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    /// Broadcast sender for alert events.
    pub alerts_tx: Arc<broadcast::Sender<AlertEvent>>,
}

impl StreamingState {
    /// Create a new streaming state.
    #[must_use]
    pub fn new() -> Self {
        let (alerts_tx, _) = broadcast::channel(1000);
        Self {
            alerts_tx: Arc::new(alerts_tx),
        }
    }

    /// Publish an alert event to all connected subscribers.
    pub fn publish(&self, event: AlertEvent) {
        // A send error only means no subscriber is currently connected
        let _ = self.alerts_tx.send(event);
    }
}

impl Default for StreamingState {
    fn default() -> Self {
        Self::new()
    }
}

/// [`EventPublisher`] backed by the WebSocket broadcast channel.
#[derive(Clone)]
pub struct BroadcastEventPublisher {
    streaming: StreamingState,
}

impl BroadcastEventPublisher {
    /// Create a publisher over the given streaming state.
    #[must_use]
    pub const fn new(streaming: StreamingState) -> Self {
        Self { streaming }
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish_alert(&self, event: &AlertEvent) -> AppResult<()> {
        self.streaming.publish(event.clone());
        Ok(())
    }
}

/// WebSocket handler for the admin alert stream.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    if !token_matches(query.token.as_deref(), &state) {
        warn!("Streaming connection rejected: invalid token");
        return haven_common::AppError::Unauthorized.into_response();
    }

    info!("New streaming connection");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut alerts_rx = state.streaming.alerts_tx.subscribe();

    info!("Streaming connection established");

    loop {
        tokio::select! {
            // Handle incoming messages from client
            Some(msg) = receiver.next() => {
                match msg {
                    Ok(Message::Close(_)) => {
                        info!("Client closed connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Forward alert events
            event = alerts_rx.recv() => {
                match event {
                    Ok(event) => {
                        let json = serde_json::to_string(&event).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Streaming subscriber lagged; events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Streaming connection closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use haven_core::NotificationKind;
    use haven_db::entities::report::{ReportCategory, ReportSeverity};

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let streaming = StreamingState::new();
        let mut rx = streaming.alerts_tx.subscribe();

        let event = AlertEvent {
            kind: NotificationKind::NewReport,
            report_id: "01hx".into(),
            short_id: "ABCD2345".into(),
            category: ReportCategory::Safety,
            severity: ReportSeverity::Low,
            timestamp: Utc::now(),
        };
        streaming.publish(event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.short_id, "ABCD2345");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let streaming = StreamingState::new();
        let event = AlertEvent {
            kind: NotificationKind::NewReport,
            report_id: "01hx".into(),
            short_id: "ABCD2345".into(),
            category: ReportCategory::Safety,
            severity: ReportSeverity::Low,
            timestamp: Utc::now(),
        };
        // Must not panic or error
        streaming.publish(event);
    }
}
