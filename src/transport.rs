//! Interfaces to the wire-protocol clients this core consumes.
//!
//! The actual WebSocket and HTTP clients live outside this crate; the
//! monitor only needs the surface below.

use crate::types::{PeerDescriptor, StatusReport};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the transport clients.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Connection lifecycle notifications pushed by the transport session.
#[derive(Debug)]
pub enum LinkEvent {
    /// The session (re)connected.
    Up,
    /// The session dropped. The transport handles its own reconnection and
    /// will push `Up` again if it succeeds.
    Down,
    /// A transport-level error that did not by itself change the link
    /// state.
    Error(TransportError),
}

/// An open outbound session to the remote node.
///
/// The session reports its own connect/disconnect transitions over the
/// [`LinkEvent`] channel handed to
/// [`PeerMonitor::spawn`](crate::PeerMonitor::spawn).
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Ask the remote node for its current status.
    async fn fetch_status(&self) -> Result<StatusReport, TransportError>;
    /// Ask the remote node for the peers it knows about.
    async fn fetch_peers(&self) -> Result<Vec<PeerDescriptor>, TransportError>;
    /// Close the session and release its resources.
    async fn close(&self);
}

/// One-shot HTTP capability probe, issued at monitor construction.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Fetch the node status over HTTP. Only success or failure is
    /// observed; the payload is discarded.
    async fn fetch_status(&self) -> eyre::Result<StatusReport>;
}
