//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::sim::ParticipantInput;
use crate::util::rate_limit::ParticipantRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Each connection becomes one participant
/// with a freshly assigned identity.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let participant_id = Uuid::new_v4();
    ws.on_upgrade(move |socket| handle_socket(socket, participant_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, participant_id: Uuid, state: AppState) {
    info!(participant_id = %participant_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    // Send welcome message
    let welcome = ServerMsg::Welcome {
        participant_id,
        server_time: unix_millis(),
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(participant_id = %participant_id, error = %e, "Failed to send welcome");
        return;
    }

    let input_tx = state.arena.input_tx.clone();
    let snapshot_rx = state.arena.snapshot_tx.subscribe();

    run_session(participant_id, ws_sink, ws_stream, input_tx, snapshot_rx).await;

    info!(participant_id = %participant_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    participant_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    input_tx: mpsc::Sender<ParticipantInput>,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = ParticipantRateLimiter::new();

    // Session-private replies (error messages) bypass the broadcast
    let (direct_tx, mut direct_rx) = mpsc::channel::<ServerMsg>(8);

    // Spawn writer task: arena broadcasts + direct replies -> WebSocket
    let writer_participant_id = participant_id;
    let writer_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = snapshot_rx.recv() => match msg {
                    Ok(msg) => {
                        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                            debug!(participant_id = %writer_participant_id, error = %e, "WebSocket send failed");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            participant_id = %writer_participant_id,
                            lagged_count = n,
                            "Client lagged, skipping {} messages", n
                        );
                        // Continue - don't disconnect for lag
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(participant_id = %writer_participant_id, "Snapshot channel closed");
                        break;
                    }
                },
                msg = direct_rx.recv() => match msg {
                    Some(msg) => {
                        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                            debug!(participant_id = %writer_participant_id, error = %e, "WebSocket send failed");
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });

    // Reader loop: WebSocket -> arena
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(participant_id = %participant_id, "Rate limited input message");
                    continue;
                }

                match parse_client_frame(&text) {
                    Ok(client_msg) => {
                        let input = ParticipantInput {
                            participant_id,
                            msg: client_msg,
                            received_at: unix_millis(),
                        };

                        if input_tx.send(input).await.is_err() {
                            debug!(participant_id = %participant_id, "Input channel closed");
                            break;
                        }
                    }
                    Err(reply) => {
                        warn!(participant_id = %participant_id, "Failed to parse client message");
                        if direct_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(participant_id = %participant_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(participant_id = %participant_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(participant_id = %participant_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(participant_id = %participant_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(participant_id = %participant_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to the arena so the vehicle is cleaned up
    let _ = input_tx
        .send(ParticipantInput {
            participant_id,
            msg: ClientMsg::Leave,
            received_at: unix_millis(),
        })
        .await;

    // Abort writer task
    writer_handle.abort();
}

/// Decode a text frame into a client message, or the error reply that
/// should go back to the offending session
fn parse_client_frame(text: &str) -> Result<ClientMsg, ServerMsg> {
    serde_json::from_str::<ClientMsg>(text).map_err(|e| ServerMsg::Error {
        code: "bad_message".to_string(),
        message: e.to_string(),
    })
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_frames_decode() {
        let frame = r#"{"type":"input","forward":true,"backward":false,"left":false,"right":false,"fire":true}"#;
        match parse_client_frame(frame) {
            Ok(ClientMsg::Input { forward, fire, .. }) => {
                assert!(forward);
                assert!(fire);
            }
            other => panic!("unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn malformed_frames_yield_an_error_reply() {
        for frame in ["not json", "{}", r#"{"type":"warp_drive"}"#] {
            match parse_client_frame(frame) {
                Err(ServerMsg::Error { code, message }) => {
                    assert_eq!(code, "bad_message");
                    assert!(!message.is_empty());
                }
                other => panic!("expected error reply for {:?}, got {:?}", frame, other),
            }
        }
    }
}
