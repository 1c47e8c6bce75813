//! Online-users synchronization.
//!
//! Maintains a client-local view of which other users are currently
//! active, rebuilt wholesale from every presence snapshot the transport
//! delivers. The engine owns at most one channel at a time; auth
//! transitions (`Some` identity appearing, changing, or going away) are
//! the only activation and teardown triggers.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::identity::Identity;
use crate::protocol::{iso_now, PresenceRecord};
use crate::transport::{
    ChannelCommand, ChannelEvent, ChannelHandle, ChannelOpts, ChannelStatus, ChannelTransport,
    PresenceState,
};

/// Snapshot exposed to the UI layer. Replaced as a whole, never patched.
#[derive(Debug, Clone, Default)]
pub struct PresenceSnapshot {
    /// Everyone online except the local user. One entry per session, so a
    /// user connected twice appears twice. Order follows the provider's
    /// key iteration order and is not stable across syncs.
    pub online_users: Vec<PresenceRecord>,
    pub is_connected: bool,
}

/// Engine lifecycle for the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresencePhase {
    /// No identity; no channel exists.
    Idle,
    /// Channel opened, subscribe acknowledgment pending.
    Connecting,
    /// Subscribed; self-presence tracked; syncs rebuild the list.
    Connected,
}

/// Synchronizes the online-users list over one presence channel.
pub struct PresenceSync {
    transport: Arc<dyn ChannelTransport>,
    topic: String,
    snapshot_tx: Arc<watch::Sender<PresenceSnapshot>>,
    active: Option<ActiveChannel>,
}

struct ActiveChannel {
    user_id: String,
    task: JoinHandle<()>,
}

impl PresenceSync {
    /// Create an engine bound to `topic`. Returns the engine and the
    /// receiver the UI layer watches for snapshots.
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        topic: impl Into<String>,
    ) -> (Self, watch::Receiver<PresenceSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(PresenceSnapshot::default());
        (
            Self {
                transport,
                topic: topic.into(),
                snapshot_tx: Arc::new(snapshot_tx),
                active: None,
            },
            snapshot_rx,
        )
    }

    pub fn phase(&self) -> PresencePhase {
        match &self.active {
            None => PresencePhase::Idle,
            Some(_) if self.snapshot_tx.borrow().is_connected => PresencePhase::Connected,
            Some(_) => PresencePhase::Connecting,
        }
    }

    /// Apply an auth transition.
    ///
    /// A new identity activates a channel; `None` deactivates. Changing
    /// directly from one user to another releases the old channel before
    /// the new one is opened — even if the old subscribe acknowledgment
    /// never arrived. Re-submitting the current identity is a no-op.
    pub async fn set_identity(&mut self, identity: Option<Identity>) {
        if let (Some(active), Some(id)) = (&self.active, &identity) {
            if active.user_id == id.user_id {
                return;
            }
        }

        self.deactivate().await;

        if let Some(identity) = identity {
            self.activate(identity).await;
        }
    }

    /// Tear down the channel and reset the snapshot. Safe to call any
    /// number of times.
    pub async fn shutdown(&mut self) {
        self.deactivate().await;
    }

    async fn activate(&mut self, identity: Identity) {
        let opts = ChannelOpts {
            presence_key: identity.user_id.clone(),
        };
        match self.transport.open(&self.topic, opts).await {
            Ok(handle) => {
                let user_id = identity.user_id.clone();
                let task = tokio::spawn(run_channel(
                    handle,
                    identity,
                    Arc::clone(&self.snapshot_tx),
                ));
                self.active = Some(ActiveChannel { user_id, task });
            }
            Err(e) => {
                warn!(topic = %self.topic, error = %e, "failed to open presence channel");
            }
        }
    }

    async fn deactivate(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.transport.remove(&self.topic).await;
        active.task.abort();
        // Wait for the event task to fully stop so no stale write can land
        // after the snapshot reset below.
        let _ = active.task.await;
        self.snapshot_tx.send_replace(PresenceSnapshot::default());
    }
}

impl Drop for PresenceSync {
    fn drop(&mut self) {
        // No async teardown here; callers wanting a clean channel leave
        // call `shutdown` first. Dropping still stops the event task.
        if let Some(active) = self.active.take() {
            active.task.abort();
        }
    }
}

/// Per-activation event loop. Consumes channel events one at a time until
/// the channel is removed or the transport goes away.
async fn run_channel(
    handle: ChannelHandle,
    identity: Identity,
    snapshot_tx: Arc<watch::Sender<PresenceSnapshot>>,
) {
    let ChannelHandle {
        commands,
        mut events,
    } = handle;

    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Status(ChannelStatus::Subscribed) => {
                snapshot_tx.send_modify(|snap| snap.is_connected = true);
                let record = PresenceRecord {
                    user_id: identity.user_id.clone(),
                    username: identity.username(),
                    online_at: iso_now(),
                };
                match serde_json::to_value(&record) {
                    Ok(payload) => {
                        let _ = commands.send(ChannelCommand::Track(payload)).await;
                    }
                    Err(e) => warn!(error = %e, "failed to encode presence record"),
                }
            }
            ChannelEvent::Status(status) => {
                warn!(?status, "presence channel not subscribed");
                snapshot_tx.send_modify(|snap| snap.is_connected = false);
            }
            ChannelEvent::Sync(state) => {
                let online_users = flatten_others(&state, &identity.user_id);
                debug!(online = online_users.len(), "presence sync");
                snapshot_tx.send_modify(|snap| snap.online_users = online_users);
            }
            ChannelEvent::Join { key, metas } => {
                debug!(key = %key, sessions = metas.len(), "presence join");
            }
            ChannelEvent::Leave { key, metas } => {
                debug!(key = %key, sessions = metas.len(), "presence leave");
            }
        }
    }

    // Transport went away; reflect disconnect until a new cycle.
    snapshot_tx.send_modify(|snap| snap.is_connected = false);
}

/// Flatten every key's sessions into one list, skipping entries that fail
/// to parse and every record belonging to the local user — whichever key
/// carries it. Duplicate user_ids across keys are kept deliberately: a
/// user with two live sessions shows up twice.
fn flatten_others(state: &PresenceState, local_user_id: &str) -> Vec<PresenceRecord> {
    state
        .values()
        .flatten()
        .filter_map(PresenceRecord::from_meta)
        .filter(|record| record.user_id != local_user_id)
        .collect()
}
