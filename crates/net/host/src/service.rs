//! Swarm event loop serving lookup and connect requests.

use std::collections::HashMap;

use eyre::{Result, WrapErr};
use futures::StreamExt;
use libp2p::{
    Multiaddr, PeerId, Swarm, SwarmBuilder, identify, kad,
    multiaddr::Protocol,
    noise,
    swarm::{
        DialError, SwarmEvent,
        dial_opts::{DialOpts, PeerCondition},
    },
    tcp, yamux,
};
use tether_maintainer::{ConnectError, LookupError};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::behaviour::{HostBehaviour, HostEvent};
use crate::command::{ConnectReply, HostCommand, LookupReply};
use crate::config::HostConfig;
use crate::handle::HostHandle;
use crate::identity::load_or_generate_keypair;

struct PendingLookup {
    target: PeerId,
    reply: LookupReply,
}

/// Owns the libp2p swarm and answers [`HostHandle`] requests.
///
/// Build with [`HostService::build`], then drive with [`HostService::run`].
pub struct HostService {
    swarm: Swarm<HostBehaviour>,
    config: HostConfig,
    command_rx: mpsc::UnboundedReceiver<HostCommand>,
    pending_lookups: HashMap<kad::QueryId, PendingLookup>,
    pending_dials: HashMap<PeerId, Vec<ConnectReply>>,
}

impl HostService {
    /// Create the swarm and a handle to it. Nothing is dialed until [`run`](Self::run).
    pub fn build(config: HostConfig) -> Result<(Self, HostHandle)> {
        let keypair = load_or_generate_keypair(config.key_file.as_deref())?;
        let query_timeout = config.query_timeout;
        let idle_timeout = config.idle_timeout;

        let swarm = SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )?
            .with_dns()?
            .with_behaviour(|keypair| Ok(HostBehaviour::new(keypair.public(), query_timeout)))?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(idle_timeout))
            .build();

        let local_peer_id = *swarm.local_peer_id();
        info!(%local_peer_id, "Host peer ID");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let service = Self {
            swarm,
            config,
            command_rx,
            pending_lookups: HashMap::new(),
            pending_dials: HashMap::new(),
        };

        Ok((service, HostHandle::new(local_peer_id, command_tx)))
    }

    pub fn local_peer_id(&self) -> &PeerId {
        self.swarm.local_peer_id()
    }

    /// Start listening on configured addresses.
    pub fn start_listening(&mut self) -> Result<()> {
        for addr in &self.config.listen_addrs {
            self.swarm
                .listen_on(addr.clone())
                .wrap_err_with(|| format!("failed to listen on {addr}"))?;
            info!(%addr, "Listening on address");
        }
        Ok(())
    }

    /// Seed the routing table from bootnodes, dial them and start a bootstrap.
    ///
    /// Returns the number of bootnodes dialed.
    pub fn connect_bootnodes(&mut self) -> usize {
        if self.config.bootnodes.is_empty() {
            warn!("No bootnodes configured, lookups rely on inbound peers");
            return 0;
        }

        let mut added = 0;
        let mut dialed = 0;
        for bootnode in self.config.bootnodes.clone() {
            let mut transport = bootnode.clone();
            let Some(Protocol::P2p(peer_id)) = transport.pop() else {
                warn!(%bootnode, "Bootnode address has no /p2p component, skipping");
                continue;
            };
            self.swarm.behaviour_mut().add_address(&peer_id, transport);
            added += 1;

            match self.swarm.dial(bootnode.clone()) {
                Ok(()) => {
                    debug!(%bootnode, "Dialing bootnode");
                    dialed += 1;
                }
                Err(e) => warn!(%bootnode, %e, "Failed to dial bootnode"),
            }
        }

        if added > 0
            && let Err(e) = self.swarm.behaviour_mut().kademlia.bootstrap()
        {
            warn!(%e, "Kademlia bootstrap not started");
        }

        info!(dialed, "Connecting to bootnodes");
        dialed
    }

    /// Listen, bootstrap and serve requests until every handle is dropped.
    pub async fn run(mut self) -> Result<()> {
        self.start_listening()?;
        self.connect_bootnodes();

        info!("Starting host event loop");
        loop {
            tokio::select! {
                event = self.swarm.select_next_some() => self.handle_swarm_event(event),
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("All host handles dropped, stopping event loop");
                        return Ok(());
                    }
                },
            }
        }
    }

    fn handle_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::Lookup { peer_id, reply } => self.start_lookup(peer_id, reply),
            HostCommand::Connect {
                peer_id,
                addrs,
                reply,
            } => self.start_dial(peer_id, addrs, reply),
        }
    }

    fn start_lookup(&mut self, peer_id: PeerId, reply: LookupReply) {
        let query_id = self
            .swarm
            .behaviour_mut()
            .kademlia
            .get_closest_peers(peer_id);
        trace!(%peer_id, ?query_id, "Started peer lookup");
        self.pending_lookups.insert(
            query_id,
            PendingLookup {
                target: peer_id,
                reply,
            },
        );
    }

    fn start_dial(&mut self, peer_id: PeerId, addrs: Vec<Multiaddr>, reply: ConnectReply) {
        if self.swarm.is_connected(&peer_id) {
            let _ = reply.send(Ok(()));
            return;
        }

        if let Some(waiters) = self.pending_dials.get_mut(&peer_id) {
            waiters.push(reply);
            return;
        }

        let opts = DialOpts::peer_id(peer_id)
            .addresses(addrs)
            .condition(PeerCondition::DisconnectedAndNotDialing)
            .build();

        match self.swarm.dial(opts) {
            Ok(()) => {
                trace!(%peer_id, "Dial initiated");
                self.pending_dials.insert(peer_id, vec![reply]);
            }
            // Already being dialed elsewhere; wait for that attempt's outcome.
            Err(DialError::DialPeerConditionFalse(_)) => {
                self.pending_dials.insert(peer_id, vec![reply]);
            }
            Err(e) => {
                let _ = reply.send(Err(ConnectError::Dial(e.to_string())));
            }
        }
    }

    fn finish_dial(&mut self, peer_id: &PeerId, result: Result<(), ConnectError>) {
        if let Some(waiters) = self.pending_dials.remove(peer_id) {
            for reply in waiters {
                let _ = reply.send(result.clone());
            }
        }
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<HostEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                info!(%address, "New listen address");
            }
            SwarmEvent::ExpiredListenAddr { address, .. } => {
                info!(%address, "Expired listen address");
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                endpoint,
                num_established,
                ..
            } => {
                debug!(
                    %peer_id,
                    endpoint = %endpoint.get_remote_address(),
                    num_established,
                    "Connection established"
                );
                if endpoint.is_dialer() {
                    self.swarm
                        .behaviour_mut()
                        .add_address(&peer_id, endpoint.get_remote_address().clone());
                }
                self.finish_dial(&peer_id, Ok(()));
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                debug!(%peer_id, num_established, cause = ?cause, "Connection closed");
            }
            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                if let Some(peer_id) = peer_id {
                    debug!(%peer_id, %error, "Outgoing connection error");
                    self.finish_dial(&peer_id, Err(ConnectError::Dial(error.to_string())));
                } else {
                    debug!(%error, "Outgoing connection error (unknown peer)");
                }
            }
            SwarmEvent::Behaviour(event) => self.handle_behaviour_event(event),
            _ => {}
        }
    }

    fn handle_behaviour_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Identify(event) => self.handle_identify_event(*event),
            HostEvent::Kademlia(event) => self.handle_kademlia_event(*event),
            HostEvent::Ping(event) => {
                if let Err(error) = event.result {
                    trace!(peer_id = %event.peer, %error, "Ping failed");
                }
            }
        }
    }

    fn handle_identify_event(&mut self, event: identify::Event) {
        match event {
            identify::Event::Received { peer_id, info, .. } => {
                debug!(
                    %peer_id,
                    protocol_version = %info.protocol_version,
                    agent_version = %info.agent_version,
                    "Received identify info"
                );
                if info.protocols.contains(&kad::PROTOCOL_NAME) {
                    for addr in info.listen_addrs {
                        self.swarm.behaviour_mut().add_address(&peer_id, addr);
                    }
                }
            }
            identify::Event::Error { peer_id, error, .. } => {
                debug!(%peer_id, %error, "Identify error");
            }
            _ => {}
        }
    }

    fn handle_kademlia_event(&mut self, event: kad::Event) {
        match event {
            kad::Event::OutboundQueryProgressed {
                id,
                result: kad::QueryResult::GetClosestPeers(result),
                step,
                ..
            } => {
                let peers = match result {
                    Ok(ok) => ok.peers,
                    Err(kad::GetClosestPeersError::Timeout { peers, .. }) => peers,
                };
                self.on_closest_peers(id, peers, step.last);
            }
            kad::Event::OutboundQueryProgressed {
                result: kad::QueryResult::Bootstrap(result),
                ..
            } => match result {
                Ok(ok) => trace!(remaining = ok.num_remaining, "Bootstrap progressed"),
                Err(e) => debug!(%e, "Bootstrap failed"),
            },
            kad::Event::RoutingUpdated { peer, .. } => {
                trace!(%peer, "Routing table updated");
            }
            _ => {}
        }
    }

    fn on_closest_peers(&mut self, id: kad::QueryId, peers: Vec<kad::PeerInfo>, last: bool) {
        let Some(target) = self.pending_lookups.get(&id).map(|pending| pending.target) else {
            return;
        };

        let found = peers
            .into_iter()
            .find(|info| info.peer_id == target && !info.addrs.is_empty());

        let result = match found {
            Some(info) => {
                if !last && let Some(mut query) = self.swarm.behaviour_mut().kademlia.query_mut(&id) {
                    query.finish();
                }
                Ok(info.addrs)
            }
            None if last => Err(LookupError::NotFound),
            None => return,
        };

        if let Some(pending) = self.pending_lookups.remove(&id) {
            debug!(peer_id = %pending.target, found = result.is_ok(), "Peer lookup finished");
            let _ = pending.reply.send(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tcp_listen_addr;

    fn local_config() -> HostConfig {
        let addr = tcp_listen_addr("127.0.0.1", 0).unwrap();
        HostConfig::default().with_listen_addrs(vec![addr])
    }

    #[tokio::test]
    async fn test_build_uses_persisted_identity() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("host.key");

        let (service, handle) = HostService::build(local_config().with_key_file(&key_file)).unwrap();
        let first = *service.local_peer_id();
        assert_eq!(handle.local_peer_id(), &first);
        drop(service);

        let (service, _handle) = HostService::build(local_config().with_key_file(&key_file)).unwrap();
        assert_eq!(service.local_peer_id(), &first);
    }

    #[tokio::test]
    async fn test_bootnode_without_peer_id_is_skipped() {
        let config =
            local_config().with_bootnodes(vec!["/ip4/127.0.0.1/tcp/1".parse().unwrap()]);
        let (mut service, _handle) = HostService::build(config).unwrap();
        assert_eq!(service.connect_bootnodes(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_when_handles_dropped() {
        let (service, handle) = HostService::build(local_config()).unwrap();
        let task = tokio::spawn(service.run());
        drop(handle);
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
