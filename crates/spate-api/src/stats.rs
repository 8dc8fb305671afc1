//! Stats stream — pushes store and replica counts to one observer.
//!
//! Every connected observer gets its own [`StatsStreamer`] loop. A loop
//! ends when its observer goes away and affects nothing else.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::future::{self, Ready};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Serialize, Serializer};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use spate_store::WorkloadStore;
use spate_telemetry::ReplicaTelemetry;

use crate::ApiState;

/// One message of the stats stream.
///
/// Counts go out as decimal strings:
/// `{"store":"45","desiredReplicas":"3","actualReplicas":"2"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    #[serde(serialize_with = "as_decimal")]
    pub store: u64,
    #[serde(rename = "desiredReplicas", serialize_with = "as_decimal")]
    pub desired: u64,
    #[serde(rename = "actualReplicas", serialize_with = "as_decimal")]
    pub actual: u64,
}

fn as_decimal<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Periodically assembles a [`StatsSnapshot`] and pushes it into a sink.
pub struct StatsStreamer {
    store: Arc<WorkloadStore>,
    telemetry: Arc<ReplicaTelemetry>,
    interval: Duration,
}

impl StatsStreamer {
    pub fn new(store: Arc<WorkloadStore>, telemetry: Arc<ReplicaTelemetry>, interval: Duration) -> Self {
        Self {
            store,
            telemetry,
            interval,
        }
    }

    /// Refresh telemetry and read the store once.
    pub async fn collect(&self) -> StatsSnapshot {
        let replicas = self.telemetry.refresh().await;
        StatsSnapshot {
            store: self.store.snapshot(),
            desired: replicas.desired,
            actual: replicas.actual,
        }
    }

    /// Push a snapshot every interval until the sink rejects one.
    ///
    /// The first snapshot goes out immediately. Returns how many
    /// snapshots were delivered.
    pub async fn run<S>(&self, mut sink: S) -> u64
    where
        S: Sink<StatsSnapshot> + Unpin,
        S::Error: Display,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sent = 0;

        loop {
            ticker.tick().await;
            let snapshot = self.collect().await;
            if let Err(e) = sink.send(snapshot).await {
                debug!(error = %e, sent, "stats push failed, ending stream");
                return sent;
            }
            sent += 1;
        }
    }
}

/// GET /stats (WebSocket upgrade)
pub async fn stats_socket(State(state): State<ApiState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| observe(state, socket))
}

async fn observe(state: ApiState, socket: WebSocket) {
    let streamer = StatsStreamer::new(state.store, state.telemetry, state.stats_interval);
    let (outbound, mut inbound) = socket.split();
    let outbound = outbound.with(encode);

    info!("stats observer connected");
    tokio::select! {
        sent = streamer.run(outbound) => {
            info!(sent, "stats observer disconnected");
        }
        _ = wait_for_close(&mut inbound) => {
            info!("stats observer closed the stream");
        }
    }
}

fn encode(snapshot: StatsSnapshot) -> Ready<Result<Message, axum::Error>> {
    future::ready(
        serde_json::to_string(&snapshot)
            .map(|text| Message::Text(text.into()))
            .map_err(axum::Error::new),
    )
}

/// Drain inbound frames until the observer closes or the socket errors.
async fn wait_for_close<S>(inbound: &mut S)
where
    S: futures::Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = inbound.next().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}
