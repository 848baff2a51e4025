//! WebSocket transport for the session.
//!
//! Provides [`SocketHandle`], a running socket task bridged over mpsc
//! channels. This is a thin layer that only moves events — protocol logic
//! remains in the Sans-IO [`crate::Session`].
//!
//! The task reconnects on its own with exponential backoff and reports
//! every link transition as a [`TransportNotice`], so the session can
//! replay identity and room subscriptions after each reconnect.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use homeroom_proto::{InboundEvent, OutboundEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::event::TransportNotice;

/// Transport errors.
///
/// Link failures are handled internally by the reconnect loop; the only
/// observable error is a socket task that is no longer running.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Channel to the socket task is closed.
    #[error("socket task gone: {0}")]
    Channel(String),
}

/// First reconnect delay. Doubles per failed attempt up to [`RECONNECT_CAP`].
const RECONNECT_FLOOR: Duration = Duration::from_millis(500);

/// Upper bound on the reconnect delay.
const RECONNECT_CAP: Duration = Duration::from_secs(30);

/// Channel capacity for both directions.
const CHANNEL_CAPACITY: usize = 32;

/// Handle to a running socket task.
pub struct SocketHandle {
    /// Send events to the server.
    pub to_server: mpsc::Sender<OutboundEvent>,
    /// Receive link notices and decoded events.
    pub from_server: mpsc::Receiver<TransportNotice>,
    /// Abort handle to stop the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl SocketHandle {
    /// Queue an event for transmission on the link.
    pub async fn send(&self, event: OutboundEvent) -> Result<(), TransportError> {
        self.to_server
            .send(event)
            .await
            .map_err(|e| TransportError::Channel(e.to_string()))
    }

    /// Stop the socket task. Safe to call more than once.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Spawn the socket task for `url`.
///
/// Must be called within a tokio runtime. The task runs until the handle is
/// dropped or [`SocketHandle::stop`] is called; connection failures are
/// retried internally and never surface as errors.
pub fn spawn(url: impl Into<String>) -> SocketHandle {
    let (to_server_tx, to_server_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_link(url.into(), to_server_rx, from_server_tx));

    SocketHandle {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    }
}

/// Run the link: connect, pump events both ways, reconnect on loss.
async fn run_link(
    url: String,
    mut to_server: mpsc::Receiver<OutboundEvent>,
    notices: mpsc::Sender<TransportNotice>,
) {
    let mut backoff = RECONNECT_FLOOR;

    loop {
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!(%url, error = %e, delay = ?backoff, "socket connect failed");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(RECONNECT_CAP);
                continue;
            },
        };

        backoff = RECONNECT_FLOOR;
        if notices.send(TransportNotice::Up).await.is_err() {
            // Receiver gone, session is shutting down
            return;
        }

        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                outbound = to_server.recv() => {
                    let Some(event) = outbound else { return };
                    match serde_json::to_string(&event) {
                        Ok(text) => {
                            if let Err(e) = sink.send(Message::text(text)).await {
                                tracing::warn!(error = %e, "socket send failed");
                                break;
                            }
                        },
                        Err(e) => tracing::error!(error = %e, "event serialization failed"),
                    }
                },
                inbound = source.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            match InboundEvent::from_json(text.as_str()) {
                                Ok(event) => {
                                    if notices.send(TransportNotice::Event(event)).await.is_err() {
                                        return;
                                    }
                                },
                                // Degraded display beats breaking the stream
                                Err(e) => {
                                    tracing::warn!(error = %e, "unrecognized server event, skipping");
                                },
                            }
                        },
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {},
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "socket receive failed");
                            break;
                        },
                    }
                },
            }
        }

        if notices.send(TransportNotice::Down).await.is_err() {
            return;
        }
    }
}
