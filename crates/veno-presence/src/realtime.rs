//! Realtime service client over the Phoenix Channels v1 protocol.
//!
//! A single WebSocket connection (`tokio-tungstenite`) multiplexes all
//! channels. Heartbeats, channel join/leave, presence tracking, and
//! auto-reconnect with exponential backoff live here; registered channels
//! are re-joined and their last presence payload re-tracked after every
//! reconnect. This is the production implementation of
//! [`ChannelTransport`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use veno_common::RealtimeError;

use crate::presence_map::PresenceMap;
use crate::protocol::{
    channel_topic, events, join_payload, parse_presence_map, strip_topic_prefix, track_payload,
    PhoenixMessage, HEARTBEAT_TOPIC,
};
use crate::transport::{
    ChannelCommand, ChannelEvent, ChannelHandle, ChannelOpts, ChannelStatus, ChannelTransport,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to the realtime service.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Project reference, the subdomain of the realtime endpoint.
    pub project_ref: String,
    /// Publishable anon key.
    pub api_key: String,
    /// Optional JWT for authenticated connections.
    pub access_token: Option<String>,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay_secs: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            project_ref: String::new(),
            api_key: String::new(),
            access_token: None,
            heartbeat_interval_secs: 25,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
        }
    }
}

impl RealtimeConfig {
    /// WebSocket URL for the realtime endpoint.
    fn ws_url(&self) -> String {
        format!(
            "wss://{}.supabase.co/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.project_ref, self.api_key
        )
    }
}

// ---------------------------------------------------------------------------
// Commands & Client
// ---------------------------------------------------------------------------

/// Monotonically increasing ref counter for protocol messages.
static REF_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_ref() -> String {
    REF_COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

/// Commands routed into the connection task.
enum ClientCommand {
    Open {
        topic: String,
        opts: ChannelOpts,
        reply: oneshot::Sender<ChannelHandle>,
    },
    Remove {
        topic: String,
    },
    Track {
        topic: String,
        payload: serde_json::Value,
    },
}

/// Handle to the realtime connection. Cheap to clone; dropping the last
/// clone closes the connection.
#[derive(Clone)]
pub struct RealtimeClient {
    command_tx: mpsc::Sender<ClientCommand>,
}

impl RealtimeClient {
    /// Start the background connection task.
    pub fn connect(config: RealtimeConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        // The loop keeps only a weak sender for spawning forwarders, so
        // the connection shuts down once every client and handle is gone.
        tokio::spawn(connection_loop(config, command_tx.downgrade(), command_rx));
        Self { command_tx }
    }
}

#[async_trait]
impl ChannelTransport for RealtimeClient {
    async fn open(&self, topic: &str, opts: ChannelOpts) -> Result<ChannelHandle, RealtimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(ClientCommand::Open {
                topic: topic.to_string(),
                opts,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RealtimeError::Closed)?;
        reply_rx.await.map_err(|_| RealtimeError::Closed)
    }

    async fn remove(&self, topic: &str) {
        let _ = self
            .command_tx
            .send(ClientCommand::Remove {
                topic: topic.to_string(),
            })
            .await;
    }
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// One registered channel on the connection.
struct Channel {
    opts: ChannelOpts,
    events: mpsc::Sender<ChannelEvent>,
    presence: PresenceMap,
    /// Last tracked presence record, replayed after rejoin.
    track_payload: Option<serde_json::Value>,
    /// Ref of the in-flight phx_join, used to recognize its reply.
    join_ref: Option<String>,
    subscribed: bool,
    /// Task forwarding owner commands into the connection task.
    forwarder: JoinHandle<()>,
}

/// Background task owning the WebSocket connection, with auto-reconnect.
async fn connection_loop(
    config: RealtimeConfig,
    command_tx: mpsc::WeakSender<ClientCommand>,
    mut command_rx: mpsc::Receiver<ClientCommand>,
) {
    let mut channels: HashMap<String, Channel> = HashMap::new();
    let mut delay = config.reconnect_delay_secs;

    loop {
        let url = config.ws_url();
        info!(project_ref = %config.project_ref, "connecting to realtime service");

        match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _)) => {
                delay = config.reconnect_delay_secs;
                let (mut sink, mut source) = stream.split();

                // (Re)join every registered channel.
                let mut send_failed = false;
                for (topic, ch) in channels.iter_mut() {
                    ch.subscribed = false;
                    let msg_ref = next_ref();
                    ch.join_ref = Some(msg_ref.clone());
                    let join = PhoenixMessage::new(
                        channel_topic(topic),
                        events::JOIN,
                        join_payload(&ch.opts.presence_key, config.access_token.as_deref()),
                        Some(msg_ref),
                    );
                    if send_frame(&mut sink, &join).await.is_err() {
                        send_failed = true;
                        break;
                    }
                }

                if !send_failed {
                    let mut heartbeat = tokio::time::interval(Duration::from_secs(
                        config.heartbeat_interval_secs,
                    ));

                    loop {
                        tokio::select! {
                            _ = heartbeat.tick() => {
                                let ping = PhoenixMessage::new(
                                    HEARTBEAT_TOPIC,
                                    events::HEARTBEAT,
                                    serde_json::json!({}),
                                    Some(next_ref()),
                                );
                                if send_frame(&mut sink, &ping).await.is_err() {
                                    break;
                                }
                            }
                            cmd = command_rx.recv() => {
                                match cmd {
                                    None => {
                                        info!("realtime client dropped, closing connection");
                                        let _ = sink.send(WsMessage::Close(None)).await;
                                        return;
                                    }
                                    Some(cmd) => {
                                        if handle_command(cmd, &mut channels, &mut sink, &config, &command_tx)
                                            .await
                                            .is_err()
                                        {
                                            break;
                                        }
                                    }
                                }
                            }
                            frame = source.next() => {
                                match frame {
                                    Some(Ok(WsMessage::Text(text))) => {
                                        match serde_json::from_str::<PhoenixMessage>(&text) {
                                            Ok(msg) => {
                                                if handle_frame(msg, &mut channels, &mut sink).await.is_err() {
                                                    break;
                                                }
                                            }
                                            Err(_) => debug!(frame = %text, "unrecognized frame"),
                                        }
                                    }
                                    Some(Ok(WsMessage::Close(_))) | None => {
                                        info!("realtime connection closed by peer");
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        warn!(error = %e, "websocket error");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }

                // Connection lost: owners see a Closed status; the
                // transport keeps the registrations for the rejoin.
                for ch in channels.values_mut() {
                    ch.subscribed = false;
                    let _ = ch
                        .events
                        .send(ChannelEvent::Status(ChannelStatus::Closed))
                        .await;
                }
            }
            Err(e) => {
                warn!(error = %e, "realtime connect failed");
            }
        }

        // Drain queued commands so channel registration and teardown
        // never wait on the socket; joins go out in the rejoin pass.
        loop {
            match command_rx.try_recv() {
                Ok(cmd) => handle_command_offline(cmd, &mut channels, &command_tx),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if command_rx.is_closed() {
            return;
        }

        info!(delay, "reconnecting to realtime service");
        tokio::time::sleep(Duration::from_secs(delay)).await;
        delay = (delay * 2).min(config.max_reconnect_delay_secs);
    }
}

/// Apply one client command. `Err` means the connection died mid-send.
async fn handle_command(
    cmd: ClientCommand,
    channels: &mut HashMap<String, Channel>,
    sink: &mut WsSink,
    config: &RealtimeConfig,
    command_tx: &mpsc::WeakSender<ClientCommand>,
) -> Result<(), ()> {
    match cmd {
        ClientCommand::Open { topic, opts, reply } => {
            let presence_key = opts.presence_key.clone();
            let handle = register_channel(&topic, opts, channels, command_tx);
            let _ = reply.send(handle);

            let msg_ref = next_ref();
            if let Some(ch) = channels.get_mut(&topic) {
                ch.join_ref = Some(msg_ref.clone());
            }
            let join = PhoenixMessage::new(
                channel_topic(&topic),
                events::JOIN,
                join_payload(&presence_key, config.access_token.as_deref()),
                Some(msg_ref),
            );
            send_frame(sink, &join).await
        }
        ClientCommand::Remove { topic } => {
            // Unknown topics are a no-op; removal is idempotent.
            let Some(ch) = channels.remove(&topic) else {
                return Ok(());
            };
            ch.forwarder.abort();
            let leave = PhoenixMessage::new(
                channel_topic(&topic),
                events::LEAVE,
                serde_json::json!({}),
                Some(next_ref()),
            );
            send_frame(sink, &leave).await
        }
        ClientCommand::Track { topic, payload } => {
            let Some(ch) = channels.get_mut(&topic) else {
                return Ok(());
            };
            ch.track_payload = Some(payload.clone());
            if ch.subscribed {
                let msg = PhoenixMessage::new(
                    channel_topic(&topic),
                    events::PRESENCE,
                    track_payload(payload),
                    Some(next_ref()),
                );
                return send_frame(sink, &msg).await;
            }
            Ok(())
        }
    }
}

/// Register a channel and its command forwarder, replacing any prior
/// registration for the topic. No frames are sent here; the join goes out
/// from the caller or the rejoin pass.
fn register_channel(
    topic: &str,
    opts: ChannelOpts,
    channels: &mut HashMap<String, Channel>,
    command_tx: &mpsc::WeakSender<ClientCommand>,
) -> ChannelHandle {
    if let Some(old) = channels.remove(topic) {
        old.forwarder.abort();
    }

    let (handle, peer) = ChannelHandle::pair(64);
    let forward_topic = topic.to_string();
    let mut owner_commands = peer.commands;
    let forward_tx = command_tx.upgrade();
    let forwarder = tokio::spawn(async move {
        let Some(forward_tx) = forward_tx else {
            return;
        };
        while let Some(ChannelCommand::Track(payload)) = owner_commands.recv().await {
            let cmd = ClientCommand::Track {
                topic: forward_topic.clone(),
                payload,
            };
            if forward_tx.send(cmd).await.is_err() {
                break;
            }
        }
    });

    channels.insert(
        topic.to_string(),
        Channel {
            opts,
            events: peer.events,
            presence: PresenceMap::new(),
            track_payload: None,
            join_ref: None,
            subscribed: false,
            forwarder,
        },
    );
    handle
}

/// Apply a command while the connection is down: registrations and
/// teardown proceed, frames wait for the next connect.
fn handle_command_offline(
    cmd: ClientCommand,
    channels: &mut HashMap<String, Channel>,
    command_tx: &mpsc::WeakSender<ClientCommand>,
) {
    match cmd {
        ClientCommand::Open { topic, opts, reply } => {
            let handle = register_channel(&topic, opts, channels, command_tx);
            let _ = reply.send(handle);
        }
        ClientCommand::Remove { topic } => {
            if let Some(ch) = channels.remove(&topic) {
                ch.forwarder.abort();
            }
        }
        ClientCommand::Track { topic, payload } => {
            if let Some(ch) = channels.get_mut(&topic) {
                ch.track_payload = Some(payload);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Frame Handling
// ---------------------------------------------------------------------------

/// Route one incoming protocol frame to its channel.
async fn handle_frame(
    msg: PhoenixMessage,
    channels: &mut HashMap<String, Channel>,
    sink: &mut WsSink,
) -> Result<(), ()> {
    if msg.topic == HEARTBEAT_TOPIC {
        debug!("heartbeat reply");
        return Ok(());
    }

    let topic = strip_topic_prefix(&msg.topic).to_string();
    let Some(ch) = channels.get_mut(&topic) else {
        debug!(topic = %topic, event = %msg.event, "frame for unknown channel");
        return Ok(());
    };

    match msg.event.as_str() {
        events::REPLY => {
            // Only the join's own reply flips the subscription; replies to
            // track/leave are acknowledged silently.
            if ch.join_ref.is_none() || ch.join_ref != msg.msg_ref {
                return Ok(());
            }
            let status = msg
                .payload
                .get("status")
                .and_then(|s| s.as_str())
                .unwrap_or_default();
            if status == "ok" {
                ch.subscribed = true;
                ch.join_ref = None;
                debug!(topic = %topic, "channel subscribed");
                let _ = ch
                    .events
                    .send(ChannelEvent::Status(ChannelStatus::Subscribed))
                    .await;
                if let Some(payload) = ch.track_payload.clone() {
                    let retrack = PhoenixMessage::new(
                        channel_topic(&topic),
                        events::PRESENCE,
                        track_payload(payload),
                        Some(next_ref()),
                    );
                    return send_frame(sink, &retrack).await;
                }
            } else {
                let reason = msg
                    .payload
                    .get("response")
                    .and_then(|r| r.get("reason"))
                    .and_then(|r| r.as_str())
                    .unwrap_or("join rejected")
                    .to_string();
                warn!(topic = %topic, status = %status, reason = %reason, "channel join failed");
                let _ = ch
                    .events
                    .send(ChannelEvent::Status(ChannelStatus::ChannelError(reason)))
                    .await;
            }
        }
        events::ERROR => {
            ch.subscribed = false;
            warn!(topic = %topic, "channel error");
            let _ = ch
                .events
                .send(ChannelEvent::Status(ChannelStatus::ChannelError(
                    "channel error".into(),
                )))
                .await;
        }
        events::CLOSE => {
            ch.subscribed = false;
            info!(topic = %topic, "channel closed");
            let _ = ch
                .events
                .send(ChannelEvent::Status(ChannelStatus::Closed))
                .await;
        }
        events::PRESENCE_STATE => {
            let state = parse_presence_map(&msg.payload);
            debug!(topic = %topic, keys = state.len(), "presence state");
            ch.presence.apply_state(state);
            let _ = ch
                .events
                .send(ChannelEvent::Sync(ch.presence.snapshot()))
                .await;
        }
        events::PRESENCE_DIFF => {
            let joins = msg
                .payload
                .get("joins")
                .map(parse_presence_map)
                .unwrap_or_default();
            let leaves = msg
                .payload
                .get("leaves")
                .map(parse_presence_map)
                .unwrap_or_default();
            debug!(
                topic = %topic,
                joins = joins.len(),
                leaves = leaves.len(),
                "presence diff"
            );
            for (key, metas) in &joins {
                let _ = ch
                    .events
                    .send(ChannelEvent::Join {
                        key: key.clone(),
                        metas: metas.clone(),
                    })
                    .await;
            }
            for (key, metas) in &leaves {
                let _ = ch
                    .events
                    .send(ChannelEvent::Leave {
                        key: key.clone(),
                        metas: metas.clone(),
                    })
                    .await;
            }
            ch.presence.apply_joins(&joins);
            ch.presence.apply_leaves(&leaves);
            let _ = ch
                .events
                .send(ChannelEvent::Sync(ch.presence.snapshot()))
                .await;
        }
        other => {
            debug!(topic = %topic, event = %other, "unhandled event");
        }
    }
    Ok(())
}

async fn send_frame(sink: &mut WsSink, msg: &PhoenixMessage) -> Result<(), ()> {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(WsMessage::Text(json.into())).await.map_err(|e| {
            warn!(error = %e, "websocket send failed");
        }),
        Err(e) => {
            warn!(error = %e, "failed to encode frame");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_includes_project_and_key() {
        let config = RealtimeConfig {
            project_ref: "abcdefgh".into(),
            api_key: "anon-key".into(),
            ..RealtimeConfig::default()
        };
        assert_eq!(
            config.ws_url(),
            "wss://abcdefgh.supabase.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }

    #[test]
    fn default_config_backoff_is_bounded() {
        let config = RealtimeConfig::default();
        assert!(config.reconnect_delay_secs <= config.max_reconnect_delay_secs);
        assert_eq!(config.heartbeat_interval_secs, 25);
    }

    #[test]
    fn refs_are_monotonic() {
        let a: u64 = next_ref().parse().unwrap();
        let b: u64 = next_ref().parse().unwrap();
        assert!(b > a);
    }
}
