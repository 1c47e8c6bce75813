//! Realtime presence for Veno.
//!
//! Tracks which users are online via the hosted realtime service
//! (Phoenix Channels over WebSocket) and exposes a continuously updated
//! online-users snapshot to the UI layer. `sync::PresenceSync` is the
//! engine; `realtime::RealtimeClient` is the production transport behind
//! the `transport::ChannelTransport` seam.

pub mod identity;
pub mod presence_map;
pub mod protocol;
pub mod realtime;
pub mod sync;
pub mod transport;

pub use identity::Identity;
pub use protocol::PresenceRecord;
pub use realtime::{RealtimeClient, RealtimeConfig};
pub use sync::{PresencePhase, PresenceSnapshot, PresenceSync};
pub use transport::{
    ChannelCommand, ChannelEvent, ChannelHandle, ChannelOpts, ChannelStatus, ChannelTransport,
    PresenceState,
};
