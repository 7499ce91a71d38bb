//! Bat routing engine
//!
//! One [`BatRoutingNode`] per drone. The node is purely reactive: the
//! owner delivers maintenance ticks and inbound messages in simulated-time
//! order, one at a time, and the node answers with outbound transmissions.
//! Nothing here blocks, retries, or touches another node's state — a
//! discovered route travels back to its origin as a [`RouteReply`] relayed
//! along the reverse path, and the origin installs it itself.

use crate::bat_params::BatParameters;
use crate::config::ProtocolConfig;
use crate::fitness;
use crate::messages::{
    DataPacket, DiscoveryMessage, Recipient, RouteReply, RoutingMessage, Transmission,
    Transmissions,
};
use crate::rng::RngSource;
use crate::route_table::{RouteInfo, RouteTable};
use crate::topology::TopologyOracle;
use crate::types::{NodeId, Result, MAX_NEIGHBORS, MAX_PATH_NODES};
use heapless::FnvIndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

/// Fire-and-forget telemetry counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoutingStats {
    /// Discovery probes originated
    pub discoveries_sent: u64,
    /// Probes relayed onward (loudness gate passed)
    pub discoveries_relayed: u64,
    /// Probes not relayed (loudness gate failed)
    pub relays_suppressed: u64,
    /// Probes discarded by the loop check
    pub loops_discarded: u64,
    /// Probes discarded at the hop ceiling
    pub hop_limit_drops: u64,
    /// Routes installed into the local table
    pub routes_discovered: u64,
    /// Route replies relayed toward their origin
    pub replies_forwarded: u64,
    /// Route replies dropped (misdelivered or unusable)
    pub replies_dropped: u64,
    /// Data packets given a route
    pub packets_routed: u64,
    /// Data packets dropped for lack of a route
    pub packets_dropped_no_route: u64,
    /// Data packets that reached their destination
    pub packets_delivered: u64,
    /// Data packets arriving at a node not on their attached path
    pub packets_misrouted: u64,
}

/// Per-node bat routing protocol instance
#[derive(Debug, Clone)]
pub struct BatRoutingNode<R: RngSource> {
    node_id: NodeId,
    config: ProtocolConfig,
    bat: BatParameters,
    table: RouteTable,
    neighbor_last_seen: FnvIndexMap<u32, u64, MAX_NEIGHBORS>,
    stats: RoutingStats,
    rng: R,
}

impl<R: RngSource> BatRoutingNode<R> {
    /// Create a node with a validated configuration and an injected
    /// randomness source
    pub fn new(node_id: NodeId, config: ProtocolConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            node_id,
            bat: BatParameters::new(&config),
            config,
            table: RouteTable::new(),
            neighbor_last_seen: FnvIndexMap::new(),
            stats: RoutingStats::default(),
            rng,
        })
    }

    /// This node's identifier
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Telemetry counters
    pub fn stats(&self) -> &RoutingStats {
        &self.stats
    }

    /// Current adaptive bat parameters
    pub fn bat_parameters(&self) -> &BatParameters {
        &self.bat
    }

    /// Read access to the route table
    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    /// Best known route to `dest`, if any
    pub fn best_route(&self, dest: NodeId) -> Option<&RouteInfo> {
        self.table.select_best(dest)
    }

    /// Neighbors heard from recently
    pub fn neighbor_count(&self) -> usize {
        self.neighbor_last_seen.len()
    }

    /// Dispatch one inbound message. Exactly one handler runs to
    /// completion per call; returned transmissions go to the medium.
    pub fn handle_message<T: TopologyOracle>(
        &mut self,
        message: RoutingMessage,
        now_ms: u64,
        oracle: &T,
    ) -> Transmissions {
        match message {
            RoutingMessage::Discovery(msg) => self.process_discovery(msg, now_ms, oracle),
            RoutingMessage::RouteReply(reply) => self.process_route_reply(reply, now_ms),
            RoutingMessage::Data(pkt) => self.route_data(pkt),
        }
    }

    /// Full maintenance pass: probe destinations (then adapt the bat
    /// parameters), re-evaluate stored routes, sweep out expired ones,
    /// prune silent neighbors. The owner reschedules the next pass after
    /// `routing_update_interval_ms`.
    pub fn on_maintenance<T: TopologyOracle>(
        &mut self,
        now_ms: u64,
        oracle: &T,
    ) -> Transmissions {
        let transmissions = self.run_discovery_cycle(now_ms, oracle);
        self.reoptimize(oracle);
        self.table.expire_sweep(now_ms, self.config.route_timeout_ms);
        let timeout = self.config.route_timeout_ms;
        self.neighbor_last_seen
            .retain(|_, last_seen| now_ms.saturating_sub(*last_seen) <= timeout);
        transmissions
    }

    /// Probe destinations for this cycle, gated per destination by the
    /// pulse rate, then adapt loudness and pulse rate once. Probing uses
    /// the pre-adaptation values.
    fn run_discovery_cycle<T: TopologyOracle>(
        &mut self,
        now_ms: u64,
        oracle: &T,
    ) -> Transmissions {
        let mut out = Transmissions::new();
        for dest in oracle.node_ids() {
            if dest == self.node_id {
                continue;
            }
            // Exploration signal of the bat model; the draw itself is the
            // point, nothing consumes the value.
            let _frequency = self.bat.draw_frequency(&mut self.rng);

            if self.rng.next_f32() < self.bat.pulse_rate() {
                trace!("{}: probing route to {}", self.node_id, dest);
                let probe = DiscoveryMessage::originate(self.node_id, dest);
                if out
                    .push(Transmission {
                        to: Recipient::Broadcast,
                        message: RoutingMessage::Discovery(probe),
                    })
                    .is_err()
                {
                    break;
                }
                self.stats.discoveries_sent += 1;
            }
        }
        self.bat.adapt(now_ms);
        out
    }

    /// Process an inbound discovery probe: loop check, cost accumulation,
    /// then either terminate it (we are the destination) or relay fresh
    /// copies to unvisited neighbors, gated by loudness.
    fn process_discovery<T: TopologyOracle>(
        &mut self,
        mut msg: DiscoveryMessage,
        now_ms: u64,
        oracle: &T,
    ) -> Transmissions {
        let mut out = Transmissions::new();

        // A probe traverses any node at most once
        if msg.has_visited(self.node_id) {
            trace!("{}: dropping looping probe from {}", self.node_id, msg.source);
            self.stats.loops_discarded += 1;
            return out;
        }

        if let Some(prev) = msg.visited.last().copied() {
            self.touch_neighbor(prev, now_ms);
        }

        if msg.visited.push(self.node_id).is_err() {
            self.stats.hop_limit_drops += 1;
            return out;
        }

        if msg.visited.len() > 1 {
            let prev = msg.visited[msg.visited.len() - 2];
            let quality =
                fitness::link_quality(oracle, prev, self.node_id, self.config.communication_range);
            // The relay link penalty is scaled by the hop count weight,
            // matching the reference protocol exactly.
            msg.accumulated_fitness +=
                fitness::link_penalty(quality) * self.config.hop_count_weight;
        }

        if msg.dest == self.node_id {
            return self.complete_discovery(&msg, now_ms);
        }

        // Relay gate: hop ceiling first, then loudness
        if msg.visited.len() >= MAX_PATH_NODES {
            self.stats.hop_limit_drops += 1;
        } else if self.rng.next_f32() < self.bat.loudness() {
            let neighbors = oracle.neighbors_within_range(self.node_id, self.config.communication_range);
            for neighbor in neighbors {
                if msg.has_visited(neighbor) {
                    continue;
                }
                // One fresh copy per neighbor so downstream paths never
                // alias each other's state
                if out
                    .push(Transmission {
                        to: Recipient::Unicast(neighbor),
                        message: RoutingMessage::Discovery(msg.clone()),
                    })
                    .is_err()
                {
                    break;
                }
            }
            trace!(
                "{}: relaying probe {} -> {}",
                self.node_id,
                msg.source,
                msg.dest
            );
            self.stats.discoveries_relayed += 1;
        } else {
            self.stats.relays_suppressed += 1;
        }
        out
    }

    /// The probe reached its destination: turn the traversed path into a
    /// route and send the reply back along it.
    fn complete_discovery(&mut self, msg: &DiscoveryMessage, now_ms: u64) -> Transmissions {
        let mut out = Transmissions::new();
        let route = RouteInfo::from_path(msg.visited.clone(), msg.accumulated_fitness, now_ms);
        let hops = route.path.len();
        if hops < 2 {
            return out;
        }
        debug!(
            "{}: discovery from {} complete, {} hops",
            self.node_id,
            msg.source,
            hops - 1
        );
        let hop_index = hops - 2;
        let next = route.path[hop_index];
        let _ = out.push(Transmission {
            to: Recipient::Unicast(next),
            message: RoutingMessage::RouteReply(RouteReply { route, hop_index }),
        });
        out
    }

    /// Relay a route reply toward its origin, or install the route if this
    /// node is the origin.
    fn process_route_reply(&mut self, reply: RouteReply, now_ms: u64) -> Transmissions {
        let mut out = Transmissions::new();

        match reply.route.path.get(reply.hop_index) {
            Some(expected) if *expected == self.node_id => {}
            _ => {
                warn!("{}: misdelivered route reply", self.node_id);
                self.stats.replies_dropped += 1;
                return out;
            }
        }

        if let Some(next_toward_dest) = reply.route.path.get(reply.hop_index + 1) {
            self.touch_neighbor(*next_toward_dest, now_ms);
        }

        if reply.hop_index == 0 {
            let dest = match reply.route.destination() {
                Some(dest) => dest,
                None => {
                    self.stats.replies_dropped += 1;
                    return out;
                }
            };
            match self
                .table
                .upsert(dest, reply.route, self.config.max_routes_per_destination)
            {
                Ok(()) => {
                    debug!("{}: route to {} installed", self.node_id, dest);
                    self.stats.routes_discovered += 1;
                }
                Err(_) => {
                    // Table full: same outcome as a lost reply
                    warn!("{}: route table full, dropping route to {}", self.node_id, dest);
                    self.stats.replies_dropped += 1;
                }
            }
        } else {
            let hop_index = reply.hop_index - 1;
            let next = reply.route.path[hop_index];
            let _ = out.push(Transmission {
                to: Recipient::Unicast(next),
                message: RoutingMessage::RouteReply(RouteReply {
                    route: reply.route,
                    hop_index,
                }),
            });
            self.stats.replies_forwarded += 1;
        }
        out
    }

    /// Attach the best known path to an outgoing payload.
    ///
    /// Returns the routed packet with a snapshot of the path and the hop
    /// cursor reset, or `None` when no route exists — a terminal outcome,
    /// no buffering or retry.
    pub fn forward_data(&mut self, mut packet: DataPacket) -> Option<DataPacket> {
        match self.table.select_best(packet.dest) {
            Some(route) => {
                packet.route_path = route.path.clone();
                packet.current_hop = 0;
                self.stats.packets_routed += 1;
                Some(packet)
            }
            None => {
                debug!("{}: no route to {}, dropping packet", self.node_id, packet.dest);
                self.stats.packets_dropped_no_route += 1;
                None
            }
        }
    }

    /// Data arm of the dispatcher. An unrouted packet gets the best path
    /// attached and leaves toward the first hop; an in-transit packet is
    /// source-routed along its attached path by advancing the hop cursor.
    fn route_data(&mut self, packet: DataPacket) -> Transmissions {
        let mut out = Transmissions::new();

        if packet.route_path.is_empty() {
            if let Some(mut routed) = self.forward_data(packet) {
                if let Some(next) = routed.route_path.get(1).copied() {
                    routed.current_hop = 1;
                    let _ = out.push(Transmission {
                        to: Recipient::Unicast(next),
                        message: RoutingMessage::Data(routed),
                    });
                }
            }
            return out;
        }

        match packet.route_path.get(packet.current_hop) {
            Some(expected) if *expected == self.node_id => {}
            _ => {
                self.stats.packets_misrouted += 1;
                return out;
            }
        }
        if packet.current_hop + 1 >= packet.route_path.len() {
            self.stats.packets_delivered += 1;
            return out;
        }
        let mut forwarded = packet;
        forwarded.current_hop += 1;
        let next = forwarded.route_path[forwarded.current_hop];
        let _ = out.push(Transmission {
            to: Recipient::Unicast(next),
            message: RoutingMessage::Data(forwarded),
        });
        out
    }

    /// Re-estimate metrics and fitness for every stored route, restoring
    /// the sorted invariant.
    fn reoptimize<T: TopologyOracle>(&mut self, oracle: &T) {
        let config = self.config;
        self.table.reoptimize(|route| {
            route.link_quality =
                fitness::path_link_quality(oracle, &route.path, config.communication_range);
            route.energy_cost =
                fitness::path_energy_cost(oracle, &route.path, config.communication_range);
            route.fitness = fitness::route_fitness(route, &config, oracle);
        });
    }

    fn touch_neighbor(&mut self, id: NodeId, now_ms: u64) {
        if id == self.node_id {
            return;
        }
        // A full map simply stops admitting new neighbors until the next prune
        let _ = self.neighbor_last_seen.insert(id.as_u32(), now_ms);
    }
}
