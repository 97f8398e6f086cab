//! Connection registry for the relay
//!
//! This module tracks which connections are currently open and the identity
//! assigned to each of them:
//! - Identity minting from a monotonic counter owned by the registry
//! - Idempotent removal when a connection's read loop ends
//! - Point-in-time membership snapshots for fan-out
//! - Capacity enforcement
//!
//! The registry itself is plain data. The relay wraps it in a single
//! `tokio::sync::Mutex` and every operation runs under that lock. Callers
//! copy a snapshot out and release the lock before doing any network I/O.

use log::info;
use shared::ParticipantId;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Sending half of a connection's outbound line queue
pub type Outbound = mpsc::Sender<String>;

/// A registered connection
#[derive(Debug)]
pub struct Peer {
    /// Remote address the connection was accepted from; not unique
    pub addr: SocketAddr,
    /// Queue drained by the connection's writer task
    pub outbound: Outbound,
}

/// Copy of one registry entry handed out by [`ConnectionRegistry::snapshot`]
#[derive(Debug, Clone)]
pub struct PeerHandle {
    pub addr: SocketAddr,
    pub identity: ParticipantId,
    pub outbound: Outbound,
}

/// Maps each open connection to the identity assigned to it
///
/// Entries are keyed by identity, not by peer address: two live connections
/// may share a remote address (multi-homed relay, reused source port) and
/// each still gets its own entry.
pub struct ConnectionRegistry {
    /// Open connections indexed by the identity minted for them
    peers: HashMap<ParticipantId, Peer>,
    /// Number of identities minted so far; never reused or decremented
    issued: u64,
    /// Maximum number of concurrent participants
    max_participants: usize,
}

impl ConnectionRegistry {
    pub fn new(max_participants: usize) -> Self {
        Self {
            peers: HashMap::new(),
            issued: 0,
            max_participants,
        }
    }

    /// Registers a connection and mints a fresh identity for it
    ///
    /// Returns None if the registry is at capacity. The returned identity is
    /// the connection's handle for [`unregister`](Self::unregister) and for
    /// sender exclusion. It comes from the registry's own counter, never
    /// from the live connection count, so two racing registrations can never
    /// observe the same value.
    pub fn register(&mut self, addr: SocketAddr, outbound: Outbound) -> Option<ParticipantId> {
        if self.peers.len() >= self.max_participants {
            return None;
        }

        self.issued += 1;
        let identity = ParticipantId::numbered(self.issued);

        info!("Participant {} connected from {}", identity, addr);
        self.peers.insert(identity.clone(), Peer { addr, outbound });

        Some(identity)
    }

    /// Removes a connection
    ///
    /// Idempotent: returns the peer address the first time and None
    /// afterwards.
    pub fn unregister(&mut self, identity: &ParticipantId) -> Option<SocketAddr> {
        let peer = self.peers.remove(identity)?;
        info!("Participant {} disconnected", identity);
        Some(peer.addr)
    }

    /// Copies the current membership for fan-out
    pub fn snapshot(&self) -> Vec<PeerHandle> {
        self.peers
            .iter()
            .map(|(identity, peer)| PeerHandle {
                addr: peer.addr,
                identity: identity.clone(),
                outbound: peer.outbound.clone(),
            })
            .collect()
    }

    pub fn contains(&self, identity: &ParticipantId) -> bool {
        self.peers.contains_key(identity)
    }

    pub fn addr_of(&self, identity: &ParticipantId) -> Option<SocketAddr> {
        self.peers.get(identity).map(|peer| peer.addr)
    }

    /// Returns the number of currently registered connections
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn max_participants(&self) -> usize {
        self.max_participants
    }
}
