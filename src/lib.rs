//! Remote-peer health tracking for a p2p network monitor.
//!
//! One [`PeerMonitor`] per remote node: it owns a transport session, polls
//! the node on a fixed interval, merges incoming status reports into a
//! running view, detects stalled height progress, and publishes lifecycle
//! events to subscribers.

pub mod events;
pub mod liveness;
pub mod monitor;
pub mod transport;
pub mod types;

// Re-exports
pub use events::{EventBus, PeerEvent};
pub use liveness::{LivenessTracker, STUCK_THRESHOLD};
pub use monitor::{PeerMonitor, POLL_INTERVAL};
pub use transport::{HttpProbe, LinkEvent, TransportError, TransportSession};
pub use types::{
    ConnectionState, LocalNode, PeerDescriptor, PeerIdentity, PeerStatus, StatusReport,
};
