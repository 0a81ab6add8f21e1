use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_id;
use crate::use_cases::RoundEvent;

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, info_span, warn, Instrument};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

pub async fn round_event_serializer(
    mut events_rx: broadcast::Receiver<RoundEvent>,
    event_bytes_tx: broadcast::Sender<Utf8Bytes>,
) {
    // Serialize each round event once and broadcast the shared bytes.
    loop {
        match events_rx.recv().await {
            Ok(event) => {
                let txt = match serde_json::to_string(&event) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, event = event.name(), "failed to serialize round event");
                        continue;
                    }
                };
                // No subscribers is fine; clients attach and detach freely.
                let _ = event_bytes_tx.send(Utf8Bytes::from(txt));
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "event serializer lagged; skipping ahead");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("round events channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Subscribe before the upgrade completes so no event between the two is lost.
    let event_bytes_rx = state.event_bytes_tx.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, event_bytes_rx))
}

async fn handle_socket(socket: WebSocket, event_bytes_rx: broadcast::Receiver<Utf8Bytes>) {
    // Connection id for correlating logs across one socket's lifetime.
    let conn_id = next_id();
    let span = info_span!("conn", conn_id);
    run_client_loop(socket, event_bytes_rx)
        .instrument(span)
        .await;
}

async fn run_client_loop(socket: WebSocket, mut event_bytes_rx: broadcast::Receiver<Utf8Bytes>) {
    info!("client connected");
    let (mut sender, mut receiver) = socket.split();

    let mut msgs_out: u64 = 0;
    let mut bytes_out: u64 = 0;
    let mut close_frame: Option<CloseFrame> = None;
    let mut last_lag_log = Instant::now() - LOG_THROTTLE;

    loop {
        // disconnect becomes true when either side goes away
        let disconnect: bool = tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => true,
                    Some(Ok(Message::Binary(_))) => {
                        close_frame = Some(CloseFrame {
                            code: close_code::UNSUPPORTED,
                            reason: "binary messages not supported".into(),
                        });
                        true
                    }
                    // The stream is one-way; text, ping and pong are ignored.
                    Some(Ok(_)) => false,
                    Some(Err(e)) => {
                        debug!(error = ?e, "websocket receive error");
                        true
                    }
                }
            }

            outgoing = event_bytes_rx.recv() => {
                match outgoing {
                    Ok(bytes) => {
                        let len = bytes.len() as u64;
                        match sender.send(Message::Text(bytes)).await {
                            Ok(()) => {
                                msgs_out += 1;
                                bytes_out += len;
                                false
                            }
                            Err(e) => {
                                debug!(error = ?e, "websocket send failed");
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if last_lag_log.elapsed() >= LOG_THROTTLE {
                            last_lag_log = Instant::now();
                            warn!(missed = n, "client lagged behind round events");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        close_frame = Some(CloseFrame {
                            code: close_code::AWAY,
                            reason: "server shutting down".into(),
                        });
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = sender.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = sender.close().await {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    info!(msgs_out, bytes_out, "client disconnected");
}
