// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live change feed for dashboard clients.
//!
//! Events announce that a report or notification changed. They are
//! informational only; clients refetch over HTTP for the actual data.
//! Nothing received over the socket is acted upon.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Events buffered per client before the oldest are dropped.
const EVENT_BUFFER_SIZE: usize = 100;

/// A change announced on the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A work report was created.
    ReportCreated {
        report_id: i64,
        code: String,
        title: String,
    },
    /// A work report was edited.
    ReportUpdated {
        report_id: i64,
        code: String,
        /// Status after the edit.
        status: String,
    },
    /// A work report was deleted; its code is free again.
    ReportDeleted { report_id: i64 },
    /// Notifications were delivered to these operators.
    NotificationCreated {
        recipients: Vec<i64>,
        report_id: Option<i64>,
    },
    /// Sent once when a client connects.
    Connected {
        /// Server time (ISO 8601).
        timestamp: String,
    },
}

/// Fans live events out to every connected client.
#[derive(Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event. Without connected clients the event is dropped.
    pub fn broadcast(&self, event: &LiveEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast live event");
            }
            Err(_) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    /// Announces delivered notifications, if there were any.
    pub fn notifications_created(&self, recipients: Vec<i64>, report_id: Option<i64>) {
        if recipients.is_empty() {
            return;
        }
        self.broadcast(&LiveEvent::NotificationCreated {
            recipients,
            report_id,
        });
    }

    /// Subscribes to events sent from now on.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for GET `/live`.
///
/// Upgrades to a WebSocket that receives every live event.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    let rx: broadcast::Receiver<LiveEvent> = app_state.live.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<LiveEvent>) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();

    let connected_event: LiveEvent = LiveEvent::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .unwrap_or_else(|_| String::from("unknown")),
    };
    match serde_json::to_string(&connected_event) {
        Ok(json) => {
            if sender.send(Message::Text(json.into())).await.is_err() {
                warn!("Failed to send connection confirmation");
                return;
            }
        }
        Err(e) => {
            error!(?e, "Failed to serialize connection confirmation");
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event: LiveEvent = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live client lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live event");
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from live client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live event stream");
}
