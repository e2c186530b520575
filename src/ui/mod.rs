//! # UI Module
//!
//! This module provides the terminal user interface for the dashboard.
//!
//! ## Components
//!
//! - [`Screen`] - Row-oriented drawing and key polling over a ratatui terminal
//! - [`mod@page`] - Button carousel, keybindings and shared page chrome
//! - [`ProcessListPage`] - The top-level process table
//! - [`TailLogPage`] - Bottom-anchored view of one process log stream
//!
//! ## Layout
//!
//! Both pages share the same frame:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          Supervisor - <page> (<refresh time>)    │
//! │ Button  Button  Button                           │
//! ├─────────────────────────────────────────────────┤
//! │                                                  │
//! │   Page content (table + status, or log tail)     │
//! │                                                  │
//! ├─────────────────────────────────────────────────┤
//! │ Esc: Exit Page | Tab: Switch Section | ...       │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//!
//! Pages run their own loop and nest strictly: the process list enters the
//! tail page and resumes once it exits.

pub mod error;
pub mod keys;
pub mod page;
pub mod process_list;
pub mod process_table;
pub mod screen;
pub mod tail_log;

pub use error::UiError;
pub use keys::Key;
pub use process_list::ProcessListPage;
pub use screen::{CrosstermEventReader, EventReader, Screen};
pub use tail_log::TailLogPage;
