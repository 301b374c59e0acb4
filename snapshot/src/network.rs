//! Per-connection snapshot sending and receiving.

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use bevy_ecs::prelude::World;
use buffer::{ByteReader, ByteWriter};
use log::{debug, info, warn};
use pattern::{decode_announcement, encode_announcement, PatternExchange, PatternId};
use wire::{
    decode_frame, decompress_payload, encode_frame, peek_message_type, DecodeError, FrameHeader,
    FrameScratch, MessageType,
};

use crate::config::SnapshotConfig;
use crate::error::{SnapshotError, SnapshotResult};
use crate::manager::{ApplyReport, SnapshotManager};
use crate::replicate::collect_replicated_entities;
use crate::runtime::SnapshotRuntime;
use crate::telemetry::{Ema, GenerationMetrics, MetricsSink, SnapshotStats};
use crate::transport::Transport;
use crate::types::{ConnectionId, SnapshotReceiver, SnapshotSender, SnapshotTick};

/// Snapshot state kept for one connection.
#[derive(Debug, Clone)]
pub struct ClientSnapshotState {
    pub want_full_snapshot: bool,
    /// Average generation time in milliseconds.
    pub generation_time_avg: Ema,
    exchange: Option<PatternExchange>,
    runtime: Option<SnapshotRuntime>,
}

impl ClientSnapshotState {
    fn new(smoothing: f32) -> Self {
        Self {
            want_full_snapshot: true,
            generation_time_avg: Ema::new(smoothing),
            exchange: None,
            runtime: None,
        }
    }

    /// Translation table received from the peer, if any.
    #[must_use]
    pub const fn exchange(&self) -> Option<&PatternExchange> {
        self.exchange.as_ref()
    }

    /// Runtime of the last snapshot applied from this peer.
    #[must_use]
    pub const fn runtime(&self) -> Option<&SnapshotRuntime> {
        self.runtime.as_ref()
    }
}

/// Drives snapshot exchange with every connected peer.
///
/// Snapshots are written with local pattern ids; the receiving side translates
/// them through the exchange built from the sender's announcement. A peer that
/// never announced is assumed to share the local bank.
pub struct SnapshotNetwork {
    manager: SnapshotManager,
    config: SnapshotConfig,
    stats: SnapshotStats,
    clients: BTreeMap<ConnectionId, ClientSnapshotState>,
    queue: VecDeque<(ConnectionId, Vec<u8>)>,
    frame: ByteWriter,
    scratch: FrameScratch,
    payload: Vec<u8>,
    metrics: Option<Box<dyn MetricsSink>>,
    /// Exchange used for peers that never announced; reset when the bank may change.
    identity: Option<PatternExchange>,
}

impl SnapshotNetwork {
    pub fn new(config: SnapshotConfig) -> SnapshotResult<Self> {
        let manager = SnapshotManager::new(config.limits.clone())?;
        Ok(Self {
            manager,
            stats: SnapshotStats::new(config.smoothing),
            config,
            clients: BTreeMap::new(),
            queue: VecDeque::new(),
            frame: ByteWriter::new(),
            scratch: FrameScratch::new(),
            payload: Vec::new(),
            metrics: None,
            identity: None,
        })
    }

    #[must_use]
    pub const fn manager(&self) -> &SnapshotManager {
        &self.manager
    }

    /// Used to register streamers before connecting peers.
    pub fn manager_mut(&mut self) -> &mut SnapshotManager {
        self.identity = None;
        &mut self.manager
    }

    #[must_use]
    pub const fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    #[must_use]
    pub const fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    pub fn set_metrics_sink(&mut self, sink: Box<dyn MetricsSink>) {
        self.metrics = Some(sink);
    }

    #[must_use]
    pub fn client(&self, connection: ConnectionId) -> Option<&ClientSnapshotState> {
        self.clients.get(&connection)
    }

    /// Connected peers in ascending order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.clients.keys().copied()
    }

    /// Adds a peer; its first snapshot is full. Reconnecting resets its state.
    pub fn connect(&mut self, connection: ConnectionId) {
        info!("snapshot connection {} opened", connection.raw());
        self.clients.insert(
            connection,
            ClientSnapshotState::new(self.config.smoothing),
        );
    }

    /// Drops every piece of state kept for the peer, queued packets included.
    pub fn disconnect(&mut self, connection: ConnectionId) -> bool {
        self.queue.retain(|(from, _)| *from != connection);
        self.stats.queue_len = self.queue.len();
        let removed = self.clients.remove(&connection).is_some();
        if removed {
            info!("snapshot connection {} closed", connection.raw());
        }
        removed
    }

    /// Makes the next snapshot sent to `connection` a full one.
    pub fn request_full_snapshot(&mut self, connection: ConnectionId) -> SnapshotResult<()> {
        let client = self.client_mut(connection)?;
        client.want_full_snapshot = true;
        Ok(())
    }

    /// Installs a translation table for the peer directly.
    pub fn set_exchange(
        &mut self,
        connection: ConnectionId,
        exchange: PatternExchange,
    ) -> SnapshotResult<()> {
        self.client_mut(connection)?.exchange = Some(exchange);
        Ok(())
    }

    /// Encodes the local pattern bank as an announcement message.
    pub fn announce_patterns(&self) -> SnapshotResult<Vec<u8>> {
        let mut writer = ByteWriter::new();
        writer.write(MessageType::PatternExchange.raw())?;
        encode_announcement(self.manager.bank(), &mut writer)?;
        Ok(writer.finish())
    }

    /// Builds the peer's translation table from its announcement.
    pub fn handle_announcement(
        &mut self,
        connection: ConnectionId,
        bytes: &[u8],
    ) -> SnapshotResult<()> {
        let mut reader = ByteReader::new(bytes);
        let raw = reader.read::<u8>()?;
        if MessageType::parse(raw)? != MessageType::PatternExchange {
            return Err(DecodeError::UnexpectedMessageType { found: raw }.into());
        }
        let announcement = decode_announcement(&mut reader)?;
        let exchange = PatternExchange::from_announcement(self.manager.bank(), &announcement);
        for name in exchange.unmatched() {
            debug!(
                "connection {} announced unknown pattern '{name}'",
                connection.raw()
            );
        }
        self.client_mut(connection)?.exchange = Some(exchange);
        Ok(())
    }

    /// Generates, frames and sends one snapshot to every connected peer.
    ///
    /// A peer whose snapshot cannot be generated or sent is skipped and gets a
    /// full snapshot next time; the remaining peers are still served. Returns
    /// the number of snapshots sent, or the first failure once every peer has
    /// been tried.
    pub fn send_client_snapshots(
        &mut self,
        world: &mut World,
        transport: &mut dyn Transport,
        tick: SnapshotTick,
    ) -> SnapshotResult<usize> {
        if self.clients.is_empty() {
            return Ok(0);
        }
        self.manager.detect_changes(world);
        let entities = collect_replicated_entities(world);
        let snapshot_pattern = self.manager.snapshot_pattern();

        let mut sent = 0;
        let mut first_error = None;
        for (&connection, client) in &mut self.clients {
            let started = Instant::now();
            let receiver = SnapshotReceiver::new(connection, client.want_full_snapshot);
            let result = self
                .manager
                .generate_for_connection(
                    world,
                    &receiver,
                    &entities,
                    self.config.always_full,
                    tick,
                )
                .and_then(|generation| {
                    let header = encode_frame(
                        snapshot_pattern.raw(),
                        generation.flags,
                        &generation.data,
                        self.config.compression_threshold,
                        &self.config.wire_limits,
                        &mut self.scratch,
                        &mut self.frame,
                    )?;
                    transport.send(
                        connection,
                        self.frame.as_slice(),
                        self.config.channel,
                        self.config.delivery,
                    )?;
                    Ok((generation, header))
                });
            let (generation, header) = match result {
                Ok(done) => done,
                Err(err) => {
                    warn!(
                        "snapshot for connection {} not sent: {err}",
                        connection.raw()
                    );
                    // This tick's changes are already folded into the change
                    // records, so only a full snapshot can catch the peer up.
                    client.want_full_snapshot = true;
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            let generation_time = started.elapsed();

            client.want_full_snapshot = false;
            client
                .generation_time_avg
                .push(generation_time.as_secs_f32() * 1000.0);
            record_sent(&mut self.stats, generation.data.len(), self.frame.len());
            if let Some(sink) = self.metrics.as_mut() {
                sink.record_generation(GenerationMetrics {
                    connection,
                    tick,
                    full: generation.flags.is_full_data(),
                    raw_bytes: generation.data.len(),
                    wire_bytes: self.frame.len(),
                    compressed: header.is_compressed,
                    generation_time,
                });
            }
            sent += 1;
        }
        first_error.map_or(Ok(sent), Err)
    }

    /// Validates a snapshot frame from `connection` and queues it.
    pub fn receive(&mut self, connection: ConnectionId, bytes: &[u8]) -> SnapshotResult<()> {
        let message_type = peek_message_type(bytes)?;
        if message_type != MessageType::MessagePattern {
            return Err(DecodeError::UnexpectedMessageType {
                found: message_type.raw(),
            }
            .into());
        }
        let header = FrameHeader::decode(&mut ByteReader::new(bytes))?;
        let client = self
            .clients
            .get(&connection)
            .ok_or(SnapshotError::UnknownConnection {
                connection: connection.raw(),
            })?;
        let remote = PatternId::new(header.pattern_id);
        let local = match &client.exchange {
            Some(exchange) => exchange.origin_id(remote),
            None => Some(remote),
        };
        if local != Some(self.manager.snapshot_pattern()) {
            return Err(SnapshotError::UntranslatedPattern {
                connection: connection.raw(),
                pattern_id: header.pattern_id,
            });
        }
        self.queue.push_back((connection, bytes.to_vec()));
        self.stats.queue_len = self.queue.len();
        Ok(())
    }

    /// Applies every queued packet in arrival order.
    ///
    /// A packet that fails to decode or apply is logged and dropped; the others
    /// are still applied.
    pub fn apply_pending(&mut self, world: &mut World) -> Vec<(ConnectionId, ApplyReport)> {
        let mut reports = Vec::with_capacity(self.queue.len());
        self.stats.received_this_frame = 0;
        while let Some((connection, bytes)) = self.queue.pop_front() {
            match self.apply_packet(world, connection, &bytes) {
                Ok(report) => {
                    self.stats.snapshots_received += 1;
                    self.stats.received_this_frame += 1;
                    reports.push((connection, report));
                }
                Err(err) => {
                    warn!(
                        "dropping snapshot from connection {}: {err}",
                        connection.raw()
                    );
                    self.stats.dropped += 1;
                }
            }
        }
        self.stats.queue_len = 0;
        reports
    }

    fn apply_packet(
        &mut self,
        world: &mut World,
        connection: ConnectionId,
        bytes: &[u8],
    ) -> SnapshotResult<ApplyReport> {
        let frame = decode_frame(bytes, &self.config.wire_limits)?;
        let identity = self
            .identity
            .get_or_insert_with(|| PatternExchange::identity(self.manager.bank()));
        let client = self
            .clients
            .get_mut(&connection)
            .ok_or(SnapshotError::UnknownConnection {
                connection: connection.raw(),
            })?;
        decompress_payload(&frame, &mut self.payload)?;

        let sender = SnapshotSender::new(connection, frame.header.flags);
        let exchange = client.exchange.as_ref().unwrap_or(&*identity);
        let (runtime, report) = self.manager.apply_snapshot_from_data(
            world,
            &sender,
            &self.payload,
            client.runtime.as_ref(),
            exchange,
        )?;
        debug!(
            "applied snapshot from connection {}: {} entities, {} spawned, {} despawned",
            connection.raw(),
            report.entity_count,
            report.spawned,
            report.despawned
        );
        client.runtime = Some(runtime);
        Ok(report)
    }

    fn client_mut(&mut self, connection: ConnectionId) -> SnapshotResult<&mut ClientSnapshotState> {
        self.clients
            .get_mut(&connection)
            .ok_or(SnapshotError::UnknownConnection {
                connection: connection.raw(),
            })
    }
}

#[allow(clippy::cast_precision_loss)]
fn record_sent(stats: &mut SnapshotStats, raw_bytes: usize, wire_bytes: usize) {
    stats.snapshot_size.push(raw_bytes as f32);
    stats.compressed_size.push(wire_bytes as f32);
    stats.snapshots_sent += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;

    fn network() -> SnapshotNetwork {
        SnapshotNetwork::new(SnapshotConfig::for_testing()).unwrap()
    }

    #[test]
    fn connect_wants_full() {
        let mut net = network();
        net.connect(ConnectionId::new(3));
        assert!(net.client(ConnectionId::new(3)).unwrap().want_full_snapshot);
        assert!(net.disconnect(ConnectionId::new(3)));
        assert!(net.client(ConnectionId::new(3)).is_none());
        assert!(!net.disconnect(ConnectionId::new(3)));
    }

    #[test]
    fn request_full_unknown_connection() {
        let mut net = network();
        assert!(matches!(
            net.request_full_snapshot(ConnectionId::new(9)),
            Err(SnapshotError::UnknownConnection { connection: 9 })
        ));
    }

    #[test]
    fn no_clients_sends_nothing() {
        let mut net = network();
        let mut world = World::new();
        let mut transport = LoopbackTransport::new();
        let sent = net
            .send_client_snapshots(&mut world, &mut transport, SnapshotTick::new(1))
            .unwrap();
        assert_eq!(sent, 0);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn first_send_clears_full_request() {
        let mut net = network();
        let mut world = World::new();
        let mut transport = LoopbackTransport::new();
        net.connect(ConnectionId::new(1));
        net.send_client_snapshots(&mut world, &mut transport, SnapshotTick::new(1))
            .unwrap();
        assert!(!net.client(ConnectionId::new(1)).unwrap().want_full_snapshot);
        assert_eq!(net.stats().snapshots_sent, 1);
        assert_eq!(transport.sent()[0].delivery, net.config().delivery);
    }

    #[test]
    fn receive_rejects_announcement_bytes() {
        let mut net = network();
        net.connect(ConnectionId::new(1));
        let announcement = net.announce_patterns().unwrap();
        assert!(matches!(
            net.receive(ConnectionId::new(1), &announcement),
            Err(SnapshotError::Decode(DecodeError::UnexpectedMessageType { found: 2 }))
        ));
    }

    #[test]
    fn announcement_requires_connection() {
        let mut net = network();
        let announcement = net.announce_patterns().unwrap();
        assert!(matches!(
            net.handle_announcement(ConnectionId::new(4), &announcement),
            Err(SnapshotError::UnknownConnection { connection: 4 })
        ));
    }

    #[test]
    fn disconnect_drops_queued_packets() {
        let mut server = network();
        let mut client = network();
        let mut world = World::new();
        let mut transport = LoopbackTransport::new();
        server.connect(ConnectionId::new(1));
        client.connect(ConnectionId::new(0));
        server
            .send_client_snapshots(&mut world, &mut transport, SnapshotTick::new(1))
            .unwrap();
        for packet in transport.drain() {
            client.receive(ConnectionId::new(0), &packet.payload).unwrap();
        }
        assert_eq!(client.stats().queue_len, 1);
        client.disconnect(ConnectionId::new(0));
        assert_eq!(client.stats().queue_len, 0);
        let mut client_world = World::new();
        assert!(client.apply_pending(&mut client_world).is_empty());
    }

    #[test]
    fn identity_exchange_is_reused_until_bank_changes() {
        let mut server = network();
        let mut client = network();
        let mut world = World::new();
        let mut transport = LoopbackTransport::new();
        server.connect(ConnectionId::new(1));
        client.connect(ConnectionId::new(0));
        assert!(client.identity.is_none());

        for tick in 1..=2 {
            server
                .send_client_snapshots(&mut world, &mut transport, SnapshotTick::new(tick))
                .unwrap();
        }
        for packet in transport.drain() {
            client.receive(ConnectionId::new(0), &packet.payload).unwrap();
        }
        let mut client_world = World::new();
        assert_eq!(client.apply_pending(&mut client_world).len(), 2);
        assert_eq!(client.identity.as_ref().map(PatternExchange::len), Some(1));

        client.manager_mut();
        assert!(client.identity.is_none());
    }
}
