//! WebSocket Progress Bus upgrade handler (spec.md §4.6, §6).
//!
//! A single socket multiplexes any number of joined Jobs. The client
//! authenticates per-join (not at the handshake, since browsers cannot
//! attach custom headers to a WebSocket upgrade): it sends `join_job`
//! with a bearer token, we verify ownership of that Job, then stream
//! `ProgressEvent`s from that Job's room until a matching `leave_job`
//! or the socket closes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::StreamExt;
use futures::SinkExt;
use lexi_domain::value_objects::JobId;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::state::AppState;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    JoinJob { job_id: JobId, token: String },
    LeaveJob { job_id: JobId },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    JobProgress {
        #[serde(flatten)]
        event: &'a lexi_domain::ports::services::ProgressEvent,
    },
    Error {
        message: String,
    },
}

/// `GET /ws`: upgrade to a WebSocket and hand off to [`handle_socket`].
pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));
    let mut rooms: HashMap<JobId, JoinHandle<()>> = HashMap::new();

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let client_message = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(m) => m,
            Err(e) => {
                send_one(&sender, &ServerMessage::Error { message: format!("malformed message: {e}") }).await;
                continue;
            }
        };

        match client_message {
            ClientMessage::JoinJob { job_id, token } => match authorize_join(&state, job_id, &token).await {
                Ok(()) => {
                    tracing::debug!(%job_id, "websocket joined job room");
                    rooms.entry(job_id).or_insert_with(|| {
                        spawn_room_forwarder(state.progress_bus.clone(), job_id, sender.clone())
                    });
                }
                Err(message) => {
                    tracing::debug!(%job_id, %message, "websocket join rejected");
                    send_one(&sender, &ServerMessage::Error { message }).await;
                }
            },
            ClientMessage::LeaveJob { job_id } => {
                if let Some(handle) = rooms.remove(&job_id) {
                    handle.abort();
                }
            }
        }
    }

    for (_, handle) in rooms {
        handle.abort();
    }
}

async fn authorize_join(state: &AppState, job_id: JobId, token: &str) -> Result<(), String> {
    let user_id = state.token_verifier.verify(token).await.map_err(|e| e.to_string())?;
    let job = state.job_repo.get(job_id).await.map_err(|e| e.to_string())?;
    if job.owner != user_id {
        return Err(format!("job {job_id} is not owned by the caller"));
    }
    Ok(())
}

type Sender = Arc<Mutex<futures::stream::SplitSink<WebSocket, Message>>>;

fn spawn_room_forwarder(
    progress_bus: Arc<lexi_infrastructure::events::BroadcastProgressBus>,
    job_id: JobId,
    sender: Sender,
) -> JoinHandle<()> {
    let mut rx = progress_bus.subscribe(job_id);
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if !send_one(&sender, &ServerMessage::JobProgress { event: &event }).await {
                break;
            }
        }
    })
}

async fn send_one(sender: &Sender, message: &ServerMessage<'_>) -> bool {
    let Ok(text) = serde_json::to_string(message) else {
        return false;
    };
    sender.lock().await.send(Message::Text(text.into())).await.is_ok()
}
