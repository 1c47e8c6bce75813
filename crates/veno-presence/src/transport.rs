//! Transport seam between the presence engine and the realtime service.
//!
//! `PresenceSync` owns a `ChannelHandle` per activation and drives it
//! through this interface; the production implementation is
//! `realtime::RealtimeClient`, tests substitute a scripted transport.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;
use veno_common::RealtimeError;

/// Full presence snapshot: connection key to that key's meta entries.
pub type PresenceState = HashMap<String, Vec<serde_json::Value>>;

/// Options for opening a presence-enabled channel.
#[derive(Debug, Clone)]
pub struct ChannelOpts {
    /// Key identifying this client in the channel's presence state.
    /// The service collapses concurrent tracks under the same key.
    pub presence_key: String,
}

/// Subscription status reported by the transport. `Subscribed` is the only
/// status the presence engine acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Subscribed,
    TimedOut,
    Closed,
    ChannelError(String),
}

/// Events delivered to the owner of a channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Status(ChannelStatus),
    /// Full authoritative presence snapshot; emitted after every state or
    /// diff application so consumers never patch incrementally.
    Sync(PresenceState),
    /// A key joined or added sessions. Diagnostic only.
    Join {
        key: String,
        metas: Vec<serde_json::Value>,
    },
    /// A key dropped sessions or left entirely. Diagnostic only.
    Leave {
        key: String,
        metas: Vec<serde_json::Value>,
    },
}

/// Commands a channel owner can issue.
#[derive(Debug, Clone)]
pub enum ChannelCommand {
    /// Publish the local presence payload on the channel.
    Track(serde_json::Value),
}

/// An owned handle to one open channel: an event stream in, commands out.
pub struct ChannelHandle {
    pub commands: mpsc::Sender<ChannelCommand>,
    pub events: mpsc::Receiver<ChannelEvent>,
}

impl ChannelHandle {
    /// Build a connected handle/peer pair. The peer half is what a
    /// transport (or a test) uses to feed events and observe commands.
    pub fn pair(buffer: usize) -> (Self, ChannelPeer) {
        let (command_tx, command_rx) = mpsc::channel(buffer);
        let (event_tx, event_rx) = mpsc::channel(buffer);
        (
            Self {
                commands: command_tx,
                events: event_rx,
            },
            ChannelPeer {
                commands: command_rx,
                events: event_tx,
            },
        )
    }
}

/// Transport-side half of a channel.
pub struct ChannelPeer {
    pub commands: mpsc::Receiver<ChannelCommand>,
    pub events: mpsc::Sender<ChannelEvent>,
}

/// A realtime transport capable of opening presence channels.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Open a channel on `topic` and request subscription. The returned
    /// handle is owned by the caller; events flow until the channel is
    /// removed or the transport goes away.
    async fn open(&self, topic: &str, opts: ChannelOpts) -> Result<ChannelHandle, RealtimeError>;

    /// Remove a previously opened channel. Idempotent: removing a topic
    /// that is unknown or already removed is a no-op, not an error.
    async fn remove(&self, topic: &str);
}
