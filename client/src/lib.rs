//! # Snake Client Library
//!
//! Everything the player runs: the snake simulation, its tick scheduling,
//! keyboard input, drawing, and the connection to the scoreboard server.
//!
//! ## Architecture Overview
//!
//! The game runs entirely locally. The scoreboard is a side channel: the
//! frame loop hands requests to a background network worker and picks up
//! results on later frames, so a slow or missing server never stalls play.
//!
//! ### Frame Loop
//! macroquad drives one frame at a time. Each frame [`app::App`] drains
//! finished network results into the scoreboard view, applies key presses
//! to the session, lets the [`scheduler::TickScheduler`] advance the snake
//! if a tick is due, and draws.
//!
//! ### Simulation
//! [`game::GameSession`] owns the board. Steering only buffers a direction;
//! the board changes exclusively inside `tick`, which always runs to
//! completion. Eating speeds the game up by ten percent down to a floor.
//!
//! ### Scoreboard
//! [`network::spawn_worker`] runs a [`network::ScoreboardClient`] on its own
//! tokio runtime. Requests go out as JSON datagrams and replies are matched
//! by sequence number. [`scoreboard::ScoreboardView`] merges the server's
//! answers into what the player sees.
//!
//! ## Module Organization
//!
//! - `app`: per-frame orchestration and score submission
//! - `game`: movement, collisions, growth, speed and board projection
//! - `input`: key edge detection and the comment field
//! - `network`: UDP client, worker thread and its channels
//! - `rendering`: board, HUD and comment feed
//! - `scheduler`: fixed-delay tick timing
//! - `scoreboard`: client-side high score and comment feed
//!
//! ## Usage Example
//!
//! ```rust
//! use client::game::{GameSession, TickOutcome};
//! use shared::{Cell, Direction};
//!
//! let snake = vec![Cell::new(10, 10), Cell::new(9, 10)];
//! let mut session =
//!     GameSession::with_layout(snake, Direction::Right, Cell::new(0, 0), 42).unwrap();
//! session.start();
//! session.steer(Direction::Down);
//!
//! assert_eq!(session.tick(), TickOutcome::Moved);
//! assert_eq!(session.direction(), Direction::Down);
//! ```

pub mod app;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod scheduler;
pub mod scoreboard;
