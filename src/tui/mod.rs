//! TUI debugger for the Intcode VM.
//!
//! Provides an interactive terminal-based debugger with:
//! - Machine state (instruction pointer, cycles, result cell, I/O)
//! - Memory view
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
