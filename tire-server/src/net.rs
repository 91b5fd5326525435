use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use crate::rig::TireRig;
use crate::state::SharedRigState;

/// Messages a telemetry client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Ping,
    Reset,
    Load { fz: f64 },
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        serde_json::from_str(txt).ok()
    }
}

pub async fn serve(listener: TcpListener, state: Arc<Mutex<SharedRigState>>, rig: Arc<Mutex<TireRig>>) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🌐 WebSocket listening on ws://{addr}");
    }

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };

        let state = Arc::clone(&state);
        let rig = Arc::clone(&rig);
        tokio::spawn(async move {
            if let Err(e) = handle_client(raw, state, rig).await {
                tracing::warn!(%peer, error = %e, "client session ended with error");
            }
        });
    }
}

async fn handle_client(
    raw: TcpStream,
    state: Arc<Mutex<SharedRigState>>,
    rig: Arc<Mutex<TireRig>>,
) -> Result<(), tungstenite::Error> {
    let ws = accept_async(raw).await?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let client_id = state.lock().await.register_client(tx.clone());

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    tracing::info!(client = %client_id, "🟢 client connected");

    let welcome = serde_json::json!({ "type": "welcome", "client_id": client_id.to_string() });
    let _ = tx.send(welcome.to_string());

    // -------------------------------
    // 2) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else { continue };

        match ClientMessage::from_json(text) {
            Some(ClientMessage::Ping) => {
                let _ = tx.send(r#"{"type":"pong"}"#.into());
            }
            Some(ClientMessage::Reset) => {
                if let Err(e) = rig.lock().await.reset() {
                    tracing::warn!(client = %client_id, error = %e, "rig reset failed");
                }
            }
            Some(ClientMessage::Load { fz }) => {
                if let Err(e) = rig.lock().await.set_load(fz) {
                    let reply = serde_json::json!({ "type": "error", "reason": e.to_string() });
                    let _ = tx.send(reply.to_string());
                }
            }
            None => {
                tracing::debug!(client = %client_id, "ignoring unrecognised message");
            }
        }
    }

    tracing::info!(client = %client_id, "🔴 client disconnected");
    state.lock().await.remove_client(&client_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_messages() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
        assert_eq!(ClientMessage::from_json(r#"{"type":"reset"}"#), Some(ClientMessage::Reset));
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"load","fz":3500}"#),
            Some(ClientMessage::Load { fz: 3500.0 })
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"input","throttle":1}"#), None);
        assert_eq!(ClientMessage::from_json("not json"), None);
    }
}
