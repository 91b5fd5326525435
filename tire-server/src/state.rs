use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::rig::RigSnapshot;

/// Connected telemetry clients and the last broadcast tick.
pub struct SharedRigState {
    pub tick: u64,
    pub clients: HashMap<Uuid, UnboundedSender<String>>,
}

impl Default for SharedRigState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedRigState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            clients: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.insert(id, tx);
        id
    }

    pub fn remove_client(&mut self, id: &Uuid) {
        self.clients.remove(id);
    }

    /// Serialize the snapshot once and send it to every client.
    /// Clients whose channel has closed are dropped.
    pub fn broadcast_snapshot(&mut self, snapshot: &RigSnapshot) {
        self.tick = snapshot.tick;

        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, tick = snapshot.tick, "snapshot serialization failed");
                return;
            }
        };

        self.clients.retain(|id, tx| {
            let alive = tx.send(json.clone()).is_ok();
            if !alive {
                tracing::debug!(client = %id, "dropping closed client channel");
            }
            alive
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{RigConfig, TireRig};
    use tokio::sync::mpsc;

    #[test]
    fn broadcast_reaches_live_clients_only() {
        let mut state = SharedRigState::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        state.register_client(tx_a);
        state.register_client(tx_b);
        drop(rx_b);

        let mut rig = TireRig::new(RigConfig::default()).unwrap();
        let snap = rig.step();
        state.broadcast_snapshot(&snap);

        assert_eq!(state.clients.len(), 1);
        let msg = rx_a.try_recv().unwrap();
        let v: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(v["tick"], 0);
        assert_eq!(v["channels"].as_array().unwrap().len(), 3);
        assert_eq!(v["channels"][0]["sweep"], "longitudinal");
    }
}
