//! Terminal user interface (TUI) for snaplist.
//!
//! ## Entry points
//!
//! - [`list::run_list_tui`]: interactive snapshot list with tag/metadata
//!   filtering, sorting, refresh and delete.

pub mod list;
mod worker;
