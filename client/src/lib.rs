//! # Participant Client Library
//!
//! This library provides the client side of the state relay: it publishes
//! the local participant's pose every tick and keeps an up-to-date picture
//! of every other participant for whatever draws the scene.
//!
//! ## Architecture Overview
//!
//! Two concurrent tasks share one piece of state:
//!
//! ### Receive Loop
//! Blocks on the relay connection, decodes each line and writes the result
//! into the [`cache::RemoteStateCache`]. Departure notices remove entries,
//! malformed lines are logged and skipped, and the self-echo sentinel never
//! reaches the cache.
//!
//! ### Update Loop
//! Runs on a fixed tick and never waits on the network for reads. Each tick
//! it samples the local state, publishes it, copies a snapshot of the cache
//! and hands both to a frame consumer. The cache lock is held only while
//! copying.
//!
//! ## Module Organization
//!
//! ### Cache Module (`cache`)
//! Identity to last-known state map shared between the two loops.
//!
//! ### Game Module (`game`)
//! Local participant movement from directional input.
//!
//! ### Input Module (`input`)
//! The local state provider seam and a headless wandering provider.
//!
//! ### Publisher Module (`publisher`)
//! One encoded line per tick; write failures end the session.
//!
//! ### Rendering Module (`rendering`)
//! The frame consumer seam and a logging consumer.
//!
//! ### Network Module (`network`)
//! Connection setup, the receive loop and the update loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::input::Wanderer;
//! use client::network::Client;
//! use client::rendering::LogRenderer;
//! use shared::Position;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:8080", 60).await?;
//!     let provider = Wanderer::new(Position::new(400.0, 300.0), None);
//!     client.run(provider, LogRenderer::new(60)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Consistency Model
//!
//! Updates are not sequenced or timestamped. Every arrival is treated as the
//! latest known state of its sender, and nothing is ordered across
//! participants.

pub mod cache;
pub mod game;
pub mod input;
pub mod network;
pub mod publisher;
pub mod rendering;
