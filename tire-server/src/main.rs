use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::{Duration, interval};
use tracing_subscriber::EnvFilter;

use tire_server::net::serve;
use tire_server::rig::{RigConfig, TireRig};
use tire_server::state::SharedRigState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("🚀 Starting tire rig server...");

    // Optional rig config: tire-server [rig.json]
    let config = match std::env::args().nth(1) {
        Some(path) => RigConfig::from_json_file(&path)?,
        None => RigConfig::default(),
    };
    let tick = Duration::from_millis(config.tick_ms);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    let rig = Arc::new(Mutex::new(TireRig::new(config)?));
    let state = Arc::new(Mutex::new(SharedRigState::new()));

    tokio::spawn(serve(listener, Arc::clone(&state), Arc::clone(&rig)));

    // Fixed wall-clock tick; each tick advances the rig by sim_step
    let mut ticker = interval(tick);

    loop {
        ticker.tick().await;

        let snapshot = rig.lock().await.step();
        state.lock().await.broadcast_snapshot(&snapshot);
    }
}
