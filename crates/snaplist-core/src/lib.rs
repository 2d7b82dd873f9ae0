//! snaplist-core library.
//!
//! The snapshot list controller derives a filtered, ordered view of a
//! project's report or test-suite snapshots and keeps the tag/metadata
//! filters mirrored in the location's query string.
//!
//! ```text
//! collection ─▶ filter::by_tags ─▶ filter::by_metadata ─▶ sort::by_timestamp ─▶ rows
//!                                   ▲
//!          query::read_filters ─────┘ (once, on mount)
//!          query::write_filters ◀──── (on every tag/query change, history replace)
//! ```
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums carrying an [`error::ErrorCode`]; `anyhow` only
//!   for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod actions;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod lock;
pub mod model;
pub mod pipeline;
pub mod prefs;
pub mod query;
pub mod route;
pub mod slots;
pub mod sort;
pub mod store;
pub mod view;
