// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Interactive code checking over a WebSocket.
//!
//! The client sends the content of its code field as a text frame on every
//! keystroke. The server answers with the field state each time it changes:
//! format errors right away, duplicates once typing has paused.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        Query, State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, stream::StreamExt};
use pep_report::{CodeFieldContext, CodeFieldState, CodeFieldValidator, ReportStore};
use pep_report_api::{
    ApiError, PersistenceStore, local_today, translate_core_error, translate_domain_error,
};
use pep_report_domain::{CodeYear, InvalidReason, ReportCode};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::session::SessionOperator;
use crate::{AppState, HttpError};

/// Query string for GET `/codes/check`.
#[derive(Debug, Default, Deserialize)]
pub struct CodeCheckQuery {
    /// Code year; defaults to the edited report's year or the current year.
    #[serde(default)]
    pub year: Option<u16>,
    /// The report being edited.
    #[serde(default)]
    pub excluding_report_id: Option<i64>,
}

/// A field state as sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CodeCheckMessage {
    Empty,
    Checking,
    Valid { code: String },
    Invalid { reason: InvalidReason, message: String },
    Unavailable { message: String },
}

impl From<&CodeFieldState> for CodeCheckMessage {
    fn from(state: &CodeFieldState) -> Self {
        match state {
            CodeFieldState::Empty => Self::Empty,
            CodeFieldState::Checking => Self::Checking,
            CodeFieldState::Valid { code } => Self::Valid {
                code: code.to_string(),
            },
            CodeFieldState::Invalid { reason } => Self::Invalid {
                message: reason.to_string(),
                reason: reason.clone(),
            },
            CodeFieldState::Unavailable { message } => Self::Unavailable {
                message: message.clone(),
            },
        }
    }
}

pub(crate) async fn resolve_context(
    app_state: &AppState,
    query: &CodeCheckQuery,
) -> Result<CodeFieldContext, ApiError> {
    let excluding: Option<ReportCode> = match query.excluding_report_id {
        Some(report_id) => Some(
            app_state
                .store
                .get_report(report_id)
                .await
                .map_err(|e| translate_core_error(e.into()))?
                .code(),
        ),
        None => None,
    };

    let year: CodeYear = match (query.year, excluding) {
        (Some(year), _) => CodeYear::new(year).map_err(translate_domain_error)?,
        (None, Some(current)) => current.year(),
        (None, None) => {
            let mut persistence = app_state.persistence.lock().await;
            let today: Date = local_today(&mut persistence, OffsetDateTime::now_utc())?;
            CodeYear::from_date(today).map_err(translate_domain_error)?
        }
    };

    Ok(CodeFieldContext {
        year,
        excluding,
        scope: app_state.policy.scope,
    })
}

/// Handler for GET `/codes/check`.
///
/// Requires a session. Upgrades to a WebSocket driving a debounced code
/// field validator.
pub async fn code_check_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Query(query): Query<CodeCheckQuery>,
) -> Result<Response, HttpError> {
    let context: CodeFieldContext = resolve_context(&app_state, &query).await?;
    info!(
        operator_id = actor.operator_id,
        year = %context.year,
        "Opening code check stream"
    );

    let store: Arc<PersistenceStore> = Arc::new(app_state.store.clone());
    let debounce: Duration = app_state.code_check_debounce;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, store, context, debounce)))
}

async fn send_state<Tx>(sender: &mut Tx, state: &CodeFieldState) -> bool
where
    Tx: Sink<Message> + Unpin,
{
    match serde_json::to_string(&CodeCheckMessage::from(state)) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!(?e, "Failed to serialize code field state");
            true
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    store: Arc<PersistenceStore>,
    context: CodeFieldContext,
    debounce: Duration,
) {
    let (sender, receiver) = socket.split();
    run_code_check(sender, receiver, store, context, debounce).await;
}

/// Drives a code field validator from incoming text frames, sending every
/// state change back until the client closes.
pub(crate) async fn run_code_check<Tx, Rx, E>(
    mut sender: Tx,
    mut receiver: Rx,
    store: Arc<PersistenceStore>,
    context: CodeFieldContext,
    debounce: Duration,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Debug,
{
    let validator: CodeFieldValidator = CodeFieldValidator::spawn(store, context, debounce);
    let mut states: watch::Receiver<CodeFieldState> = validator.subscribe();

    let initial: CodeFieldState = states.borrow_and_update().clone();
    if !send_state(&mut sender, &initial).await {
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => validator.set_input(text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            },
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state: CodeFieldState = states.borrow_and_update().clone();
                if !send_state(&mut sender, &state).await {
                    break;
                }
            }
        }
    }

    debug!("Code check stream closed");
}
