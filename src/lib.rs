//! Supervisor TUI - a keyboard-driven terminal dashboard for Supervisor
//!
//! This library provides the page engine, the process list and tail pages,
//! and the [`supervisor::Supervisor`] contract they drive.

pub mod config;
pub mod supervisor;
pub mod ui;
