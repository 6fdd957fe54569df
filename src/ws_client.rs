//! WebSocket client for the energy backend.
//!
//! Runs in a Tokio background task. Inbound frames are decoded at the
//! boundary and published into the `SnapshotFeed`; the connection status is
//! kept in shared state the renderer reads for its "offline" caption.
//!
//! Boost requests are queued through `OutboundSender` and written while
//! connected. Requests issued while disconnected are discarded.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::feed::SnapshotFeed;
use crate::gateway::ActionGateway;
use crate::protocol::{BoostRequest, ConnectionStatus, Inbound, decode_message};

/// Connection status shared between the client task and the render loop.
pub type SharedStatus = Arc<Mutex<ConnectionStatus>>;

pub fn read_status(status: &SharedStatus) -> ConnectionStatus {
    status.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn set_status(status: &SharedStatus, next: ConnectionStatus) {
    *status.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

/// Cloneable handle queueing outbound JSON frames for the client task.
#[derive(Clone)]
pub struct OutboundSender {
    sender: mpsc::UnboundedSender<String>,
}

impl OutboundSender {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    pub fn send(&self, json: String) {
        if self.sender.send(json).is_err() {
            warn!(target: "ws_client", "Outbound dropped: client task is gone");
        }
    }
}

impl ActionGateway for OutboundSender {
    fn boost(&self) {
        info!(target: "ws_client", "Boost requested");
        self.send(BoostRequest::new().to_json());
    }
}

/// Spawn the reconnecting client task for `url`.
pub fn spawn_client(
    runtime: &tokio::runtime::Runtime,
    url: String,
    feed: SnapshotFeed,
    reconnect_delay: Duration,
) -> (SharedStatus, OutboundSender) {
    let status: SharedStatus = Arc::new(Mutex::new(ConnectionStatus::Connecting));
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    runtime.spawn(client_loop(
        Arc::clone(&status),
        feed,
        url,
        rx,
        reconnect_delay,
    ));
    (status, OutboundSender::new(tx))
}

async fn client_loop(
    status: SharedStatus,
    feed: SnapshotFeed,
    url: String,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    reconnect_delay: Duration,
) {
    loop {
        set_status(&status, ConnectionStatus::Connecting);

        match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => {
                set_status(&status, ConnectionStatus::Connected);
                info!(target: "ws_client", url = %url, "WebSocket connected");

                let (mut write, mut read) = ws_stream.split();

                loop {
                    tokio::select! {
                        msg_result = read.next() => {
                            match msg_result {
                                Some(Ok(Message::Text(text))) => {
                                    handle_message(&feed, &text);
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    let _ = write.send(Message::Pong(data)).await;
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    info!(target: "ws_client", url = %url, "WebSocket closed by server");
                                    break;
                                }
                                Some(Err(e)) => {
                                    error!(target: "ws_client", url = %url, "WebSocket error: {}", e);
                                    set_status(&status, ConnectionStatus::Error(format!("WS error: {}", e)));
                                    break;
                                }
                                _ => {}
                            }
                        }

                        Some(json) = outbound_rx.recv() => {
                            if let Err(e) = write.send(Message::Text(json.into())).await {
                                warn!(target: "ws_client", "Boost not delivered: {}", e);
                                break;
                            }
                        }
                    }
                }

                if read_status(&status).is_connected() {
                    set_status(&status, ConnectionStatus::Disconnected);
                }
            }
            Err(e) => {
                warn!(
                    target: "ws_client",
                    url = %url,
                    "Connection failed: {} (retrying in {:?})", e, reconnect_delay
                );
                set_status(&status, ConnectionStatus::Error(format!("Connect failed: {}", e)));
            }
        }

        discard_pending(&mut outbound_rx);
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Drop boosts queued while there was no connection to carry them.
fn discard_pending(outbound_rx: &mut mpsc::UnboundedReceiver<String>) {
    let mut dropped = 0usize;
    while outbound_rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        warn!(target: "ws_client", dropped, "Discarded boosts issued while offline");
    }
}

/// Decode one text frame and publish any snapshot it carries.
fn handle_message(feed: &SnapshotFeed, text: &str) {
    match decode_message(text) {
        Some(Inbound::Snapshot(update)) => {
            if update.is_empty() {
                debug!(target: "ws_client", "Snapshot carried no usable fields");
                return;
            }
            feed.publish(update);
        }
        Some(Inbound::Hello { protocol_version }) => {
            info!(target: "ws_client", ?protocol_version, "Backend hello");
        }
        Some(Inbound::Ignored) | None => {}
    }
}
