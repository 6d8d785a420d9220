//! Incremental body relay from the origin to the client.
//!
//! A spawned pump task pulls chunks from the origin and pushes them into a
//! small bounded channel whose receiving end is the outward body. When the
//! client goes away the body (and with it the receiver) is dropped; the pump
//! notices through [`mpsc::Sender::closed`] even while the origin is stalled,
//! stops polling, and drops the origin stream, which aborts the upstream read.

use std::fmt::Display;
use std::io;

use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// Chunks buffered between the origin and the client.
pub const RELAY_CHANNEL_CAPACITY: usize = 4;

/// How a relay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The origin body was delivered completely.
    Completed { bytes: u64 },
    /// The client disconnected; the origin read was abandoned.
    ClientDisconnected { bytes: u64 },
    /// The origin failed mid-transfer; the client response was cut short.
    UpstreamFailed { bytes: u64 },
}

impl RelayOutcome {
    pub fn bytes(&self) -> u64 {
        match *self {
            RelayOutcome::Completed { bytes }
            | RelayOutcome::ClientDisconnected { bytes }
            | RelayOutcome::UpstreamFailed { bytes } => bytes,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Completed { .. } => "completed",
            RelayOutcome::ClientDisconnected { .. } => "client_disconnected",
            RelayOutcome::UpstreamFailed { .. } => "upstream_failed",
        }
    }
}

/// Start relaying `upstream` into a response body.
///
/// `kind` labels logs and metrics (`stream`, `download`, `asset`). The pump
/// task is detached; it logs and counts its own [`RelayOutcome`].
pub fn relay<S, E>(upstream: S, kind: &'static str) -> Body
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    spawn_relay(upstream, kind).0
}

fn spawn_relay<S, E>(upstream: S, kind: &'static str) -> (Body, JoinHandle<RelayOutcome>)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(RELAY_CHANNEL_CAPACITY);
    let task = tokio::spawn(pump(upstream, tx, kind));
    (Body::from_stream(ReceiverStream::new(rx)), task)
}

async fn pump<S, E>(upstream: S, tx: mpsc::Sender<io::Result<Bytes>>, kind: &'static str) -> RelayOutcome
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut bytes: u64 = 0;

    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => break RelayOutcome::ClientDisconnected { bytes },
            next = upstream.next() => next,
        };

        match next {
            None => break RelayOutcome::Completed { bytes },
            Some(Ok(chunk)) => {
                let len = chunk.len() as u64;
                // Fails only once the receiver is gone.
                if tx.send(Ok(chunk)).await.is_err() {
                    break RelayOutcome::ClientDisconnected { bytes };
                }
                bytes += len;
            }
            Some(Err(e)) => {
                tracing::warn!(kind, bytes, error = %e, "Origin body failed mid-transfer");
                let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
                break RelayOutcome::UpstreamFailed { bytes };
            }
        }
    };

    tracing::debug!(kind, bytes = outcome.bytes(), outcome = outcome.label(), "Relay finished");
    metrics::counter!("vrgate_relay_bytes_total", "kind" => kind).increment(outcome.bytes());
    metrics::counter!("vrgate_relay_outcomes_total", "kind" => kind, "outcome" => outcome.label())
        .increment(1);

    outcome
}
