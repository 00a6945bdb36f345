//! WebSocket handler for the live execution stream.
//!
//! Forwards every committed frame to the client as one message and keeps the
//! connection alive with ping/pong heartbeats. Uses tokio::select! over the
//! socket, the frame broadcast and the heartbeat timer.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use orderbook::{Clock, SystemClock};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::sequencer::Sequencer;
use crate::types::{FrameResponse, WebSocketMessage};

fn encode(message: &WebSocketMessage) -> Option<Message> {
    serde_json::to_string(message).ok().map(Message::Text)
}

pub async fn handle_execution_stream(socket: WebSocket, sequencer: Sequencer) {
    info!("new execution stream connection");

    let (mut sender, mut receiver) = socket.split();
    let mut frames = sequencer.subscribe();
    let mut ping_interval = interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WebSocketMessage::Ping { timestamp }) = serde_json::from_str(&text) {
                            if let Some(pong) = encode(&WebSocketMessage::Pong { timestamp }) {
                                let _ = sender.send(pong).await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        info!("execution stream closed by client");
                        break;
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "websocket error in execution stream");
                        break;
                    }
                }
            }

            frame = frames.recv() => {
                let message = match frame {
                    Ok(frame) => WebSocketMessage::Frame(FrameResponse::from(frame.as_slice())),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "execution stream lagged");
                        WebSocketMessage::Error { message: format!("{skipped} frames dropped") }
                    }
                    Err(RecvError::Closed) => break,
                };
                if let Some(message) = encode(&message) {
                    if sender.send(message).await.is_err() {
                        warn!("failed to forward frame, dropping subscriber");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                let ping = WebSocketMessage::Ping { timestamp: SystemClock.now_millis() };
                if let Some(ping) = encode(&ping) {
                    if sender.send(ping).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("execution stream handler ended");
}
