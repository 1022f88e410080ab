//! The peer monitor entity: polling loop, status ingestion, stuck
//! detection.

use crate::events::{EventBus, PeerEvent};
use crate::liveness::LivenessTracker;
use crate::transport::{HttpProbe, LinkEvent, TransportSession};
use crate::types::{
    ConnectionState, LocalNode, PeerDescriptor, PeerIdentity, PeerStatus, StatusReport,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};

/// How often an online peer is polled for status and peers.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Mutable view of the remote node. The driver task writes, accessors read.
#[derive(Debug)]
struct MonitorState {
    connection: ConnectionState,
    status: Option<PeerStatus>,
    liveness: LivenessTracker,
    peer_list: Vec<PeerDescriptor>,
    incoming_link: bool,
    http_reachable: bool,
    last_seen: Option<DateTime<Utc>>,
}

impl MonitorState {
    fn new(now: Instant) -> Self {
        Self {
            connection: ConnectionState::Offline,
            status: None,
            liveness: LivenessTracker::new(now),
            peer_list: Vec::new(),
            incoming_link: false,
            http_reachable: false,
            last_seen: None,
        }
    }

    /// Apply one status report.
    ///
    /// The height comparison uses the snapshot as it was before the merge:
    /// an unchanged or lower height is exactly the no-progress signal the
    /// stuck check looks for. Returns true when this report flipped the
    /// peer into the stuck state.
    fn ingest_status(&mut self, report: &StatusReport, now: Instant) -> bool {
        let advanced = match (&self.status, report.height) {
            (None, _) => true,
            (Some(prev), Some(height)) => prev.height.map_or(true, |prev_height| height > prev_height),
            (Some(_), None) => false,
        };
        let became_stuck = if advanced {
            self.liveness.record_advance(now);
            false
        } else {
            self.liveness.record_no_progress(now)
        };
        match &mut self.status {
            Some(status) => status.merge(report),
            None => self.status = Some(PeerStatus::from_report(report)),
        }
        self.last_seen = Some(Utc::now());
        became_stuck
    }
}

/// Health tracker for a single remote peer.
///
/// Exactly one instance per remote node. It exclusively owns its transport
/// session handle and its polling timer; both are released by
/// [`PeerMonitor::destroy`]. Dropping the monitor also stops the polling
/// loop, but skips the explicit session close.
pub struct PeerMonitor {
    identity: PeerIdentity,
    local: LocalNode,
    session: Arc<dyn TransportSession>,
    state: Arc<RwLock<MonitorState>>,
    events: EventBus,
    shutdown: oneshot::Sender<()>,
}

impl PeerMonitor {
    /// Start monitoring a remote peer over an established transport
    /// session.
    ///
    /// Spawns the polling driver and fires the one-shot HTTP capability
    /// probe. Link events pushed by the session drive the connection
    /// state; until the first `Up` arrives every tick is a no-op.
    pub fn spawn(
        identity: PeerIdentity,
        local: LocalNode,
        session: Arc<dyn TransportSession>,
        link_events: mpsc::UnboundedReceiver<LinkEvent>,
        probe: Arc<dyn HttpProbe>,
    ) -> Self {
        let state = Arc::new(RwLock::new(MonitorState::new(Instant::now())));
        let events = EventBus::new();
        let (shutdown, shutdown_rx) = oneshot::channel();

        // HTTP is an optional secondary channel: success flips the flag
        // once, failure is swallowed.
        let probe_state = state.clone();
        tokio::spawn(async move {
            if probe.fetch_status().await.is_ok() {
                probe_state.write().unwrap().http_reachable = true;
            }
        });

        let driver = Driver {
            peer: identity.to_string(),
            session: session.clone(),
            state: state.clone(),
            events: events.clone(),
        };
        tokio::spawn(driver.run(link_events, shutdown_rx));

        Self {
            identity,
            local,
            session,
            state,
            events,
            shutdown,
        }
    }

    /// Addressing identity of the monitored peer.
    pub fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    /// Our own node description supplied at construction.
    pub fn local_node(&self) -> &LocalNode {
        &self.local
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.read().unwrap().connection
    }

    /// The merged status snapshot, or `None` if the peer has never
    /// reported.
    pub fn latest_status(&self) -> Option<PeerStatus> {
        self.state.read().unwrap().status.clone()
    }

    /// Best-known node identifier: the latest reported nonce, falling back
    /// to the nonce supplied at construction, if any.
    pub fn resolved_identifier(&self) -> Option<String> {
        let state = self.state.read().unwrap();
        state
            .status
            .as_ref()
            .and_then(|status| status.nonce.clone())
            .or_else(|| self.identity.nonce.clone())
    }

    /// Whether the one-shot HTTP probe issued at construction succeeded.
    pub fn http_reachable(&self) -> bool {
        self.state.read().unwrap().http_reachable
    }

    /// The peer list last reported by the remote node.
    pub fn remote_peer_list(&self) -> Vec<PeerDescriptor> {
        self.state.read().unwrap().peer_list.clone()
    }

    /// Whether the inbound-connection registry currently records a reverse
    /// link from this peer.
    pub fn is_incoming_link_established(&self) -> bool {
        self.state.read().unwrap().incoming_link
    }

    pub fn is_stuck(&self) -> bool {
        self.state.read().unwrap().liveness.is_stuck()
    }

    /// Wall-clock time of the most recent ingested status report.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.state.read().unwrap().last_seen
    }

    /// Record whether a reverse inbound connection from this peer exists.
    /// Tracked by an external registry, independent of our own outbound
    /// session state.
    pub fn mark_incoming_link(&self, established: bool) {
        self.state.write().unwrap().incoming_link = established;
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> UnboundedReceiverStream<PeerEvent> {
        self.events.subscribe()
    }

    /// Stop the polling loop and close the transport session.
    ///
    /// Consumes the monitor, so no call can follow it. Inbound-link
    /// bookkeeping held by the external registry is not affected.
    pub async fn destroy(self) {
        let _ = self.shutdown.send(());
        self.session.close().await;
    }
}

/// The task that owns the polling timer and applies link events.
struct Driver {
    peer: String,
    session: Arc<dyn TransportSession>,
    state: Arc<RwLock<MonitorState>>,
    events: EventBus,
}

impl Driver {
    async fn run(
        self,
        mut link_events: mpsc::UnboundedReceiver<LinkEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut ticker = time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut link_open = true;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = link_events.recv(), if link_open => match event {
                    Some(LinkEvent::Up) => {
                        info!("peer {} connected", self.peer);
                        self.state.write().unwrap().connection = ConnectionState::Online;
                        self.events.emit(PeerEvent::Connected);
                    }
                    Some(LinkEvent::Down) => {
                        info!("peer {} disconnected", self.peer);
                        self.state.write().unwrap().connection = ConnectionState::Offline;
                        self.events.emit(PeerEvent::Disconnected);
                    }
                    Some(LinkEvent::Error(err)) => {
                        // Any resulting disconnect is signalled by the
                        // transport itself via `Down`.
                        warn!("transport error from peer {}: {}", self.peer, err);
                    }
                    None => link_open = false,
                },
                _ = ticker.tick() => self.poll_once().await,
            }
        }
    }

    /// One polling tick: status first, then peers. A failed fetch skips the
    /// rest of the tick; the next scheduled tick is the retry. Ticks run
    /// sequentially inside this task, so they can never pile up.
    async fn poll_once(&self) {
        if self.state.read().unwrap().connection != ConnectionState::Online {
            return;
        }

        let report = match self.session.fetch_status().await {
            Ok(report) => report,
            Err(err) => {
                warn!("failed to fetch status from peer {}: {}", self.peer, err);
                return;
            }
        };
        let became_stuck = self
            .state
            .write()
            .unwrap()
            .ingest_status(&report, Instant::now());
        if became_stuck {
            warn!(
                "peer {} reported no height progress, marking stuck at {:?}",
                self.peer, report.height
            );
            self.events.emit(PeerEvent::Stuck);
        }
        self.events.emit(PeerEvent::StatusUpdated(report));

        let peers = match self.session.fetch_peers().await {
            Ok(peers) => peers,
            Err(err) => {
                warn!("failed to fetch peer list from peer {}: {}", self.peer, err);
                return;
            }
        };
        self.state.write().unwrap().peer_list = peers.clone();
        self.events.emit(PeerEvent::PeersUpdated(peers));
    }
}
