//! Watch progress tracking for TV shows.
//!
//! watch-progress keeps, per user, a watch status and annotations (journal,
//! note, favorite flag, rating) for every episode of every show, and derives
//! progress facts from that state together with catalog metadata supplied by
//! the caller.
//!
//! # Features
//!
//! - Premiere and finale labelling of episodes
//! - Per-season and per-show completion against aired episodes
//! - "Up next" lookup in watch order
//! - Bulk plans for marking a season, a show or the gap before an episode
//!
//! All operations work on plain values: load a [`store::Library`], pass it in,
//! save it back.
//!
//! # Usage
//!
//! ```bash
//! # Mark an episode and see what's next
//! cargo run -- mark 1399 S01E01
//! cargo run -- next 1399
//! ```

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod planner;
pub mod store;
pub mod types;
