//! # Scoreboard Server Library
//!
//! This library provides the server half of the snake game: a per-context
//! high score and a bounded feed of player comments, kept in a simple
//! key-value store and served over UDP.
//!
//! ## Core Responsibilities
//!
//! ### Read (`init`)
//! Returns the caller's display name, the stored high score (0 when absent)
//! and the recent comments for a context. Never writes. A comment log that
//! fails to parse is logged and served as empty.
//!
//! ### Conditional write (`submit`)
//! Validates the score, raises the stored high score when it is beaten and
//! appends a comment when a message was supplied. The log keeps the 20 most
//! recent comments in insertion order.
//!
//! ## Module Organization
//!
//! - `store`: the key-value contract (`get`, `set`, `incr_by`,
//!   `compare_and_set`) with an in-memory and a file-backed implementation
//! - `scoreboard`: the service itself, generic over the store
//! - `identity`: turns the hosting context's caller info into a display name
//! - `network`: datagram decoding and the UDP server loop
//! - `error`: client vs server error taxonomy
//!
//! ## Concurrency
//!
//! Each request runs independently. Updates to the high score and the
//! comment log are compare-and-set loops, so two players finishing at the
//! same moment cannot lose each other's writes.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::identity::HostIdentity;
//! use server::network::Server;
//! use server::scoreboard::ScoreboardService;
//! use server::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ScoreboardService::new(MemoryStore::new(), HostIdentity);
//!     let server = Server::bind("127.0.0.1:8080", service).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod identity;
pub mod network;
pub mod scoreboard;
pub mod store;
