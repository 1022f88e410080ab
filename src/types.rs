//! Identity and status types for a monitored remote peer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Addressing information for a remote node. Set at construction, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    /// Network address of the remote node.
    pub address: String,
    /// Port the node's WebSocket transport listens on.
    pub ws_port: u16,
    /// Port the node's HTTP API listens on.
    pub http_port: u16,
    /// Network identifier the remote node must belong to.
    pub nethash: String,
    /// Self-reported unique node identifier, if known ahead of time.
    pub nonce: Option<String>,
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.ws_port)
    }
}

/// Our own node description, presented to remote peers when dialing out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNode {
    /// Port our own WebSocket transport listens on.
    pub port: u16,
    /// Port our own HTTP API listens on.
    pub http_port: u16,
    /// Our unique node identifier.
    pub nonce: String,
    /// Our software version string.
    pub version: String,
    /// Our operating system string.
    pub os: String,
}

/// A status snapshot as reported by the remote node itself.
///
/// Remotes are free to report fields this monitor does not know about;
/// those are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Arbitrary additional fields reported by the remote.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The merged view of everything the remote node has reported so far.
///
/// Once any report has been received the owning monitor never clears this
/// snapshot; later reports only merge into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerStatus {
    pub height: Option<u64>,
    pub version: Option<String>,
    pub os: Option<String>,
    pub nonce: Option<String>,
    pub extra: Map<String, Value>,
}

impl PeerStatus {
    /// Build an initial snapshot from the first received report.
    pub fn from_report(report: &StatusReport) -> Self {
        let mut status = Self::default();
        status.merge(report);
        status
    }

    /// Shallow-merge a report over this snapshot: fields present in the
    /// report overwrite, fields absent are retained.
    pub fn merge(&mut self, report: &StatusReport) {
        if report.height.is_some() {
            self.height = report.height;
        }
        if let Some(version) = &report.version {
            self.version = Some(version.clone());
        }
        if let Some(os) = &report.os {
            self.os = Some(os.clone());
        }
        if let Some(nonce) = &report.nonce {
            self.nonce = Some(nonce.clone());
        }
        for (key, value) in &report.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Reachability of the remote node over our outbound transport session.
///
/// Driven solely by transport link events, independent of whether
/// individual polls succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Offline,
    Online,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Offline => write!(f, "offline"),
            ConnectionState::Online => write!(f, "online"),
        }
    }
}

/// Lightweight descriptor of a peer as listed by a remote node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    pub ip: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}
