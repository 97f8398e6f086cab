//! # Relay Server Library
//!
//! This library provides the relay that keeps every participant's view of
//! the shared space in sync. It accepts participant connections, assigns
//! each one an identity, and fans every received state record out to the
//! other participants.
//!
//! ## Core Responsibilities
//!
//! ### Identity Assignment
//! Every accepted connection is registered and receives an identity of the
//! form `id-<n>`. The counter behind it belongs to the registry and only
//! moves forward, so identities never collide for the lifetime of the
//! process.
//!
//! ### State Relaying
//! Each line a participant sends (`x,y,facing,isMoving`) is validated,
//! prefixed with the sender's identity and delivered to every other
//! registered participant. The relay holds no game state of its own.
//!
//! ### Departure Notices
//! When a connection ends, its entry is removed and the remaining
//! participants receive `identity,leave` so their caches converge on the
//! true membership. A leave notice waits briefly for room in a busy
//! peer's queue instead of being dropped outright.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! Every connection gets a reader task and a writer task on the tokio
//! runtime. Fan-out runs inline on the sender's reader task: it copies the
//! registry membership under the lock, releases it, then pushes the line
//! into each peer's bounded outbound queue. No lock is ever held while
//! writing to a socket.
//!
//! ### Failure Isolation
//! A full queue drops the update for that peer only. A failed or timed-out
//! write ends that peer's writer; the peer is unregistered when its own
//! reader notices the broken connection. Lines are capped at
//! `MAX_LINE_LEN` bytes, so a peer that never terminates a line cannot grow
//! the relay's memory. Nothing a single connection does can stop the relay.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! - Per-connection entries keyed by minted identity
//! - Identity minting and capacity limits
//! - Point-in-time membership snapshots
//!
//! ### Network Module (`network`)
//! - TCP accept loop and per-connection tasks
//! - Line framing, validation and fan-out
//! - Read and write deadlines
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{RelayConfig, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("0.0.0.0:8080", RelayConfig::default()).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod registry;
