//! # Intcode VM
//!
//! A small virtual machine for Intcode programs.
//!
//! An Intcode program is a flat list of signed integers that is both code
//! and data. The machine loads it into memory, then fetches, decodes and
//! executes instructions until HALT, the end of memory, or a fault.

pub mod vm;
pub mod program;

#[cfg(test)]
mod property_tests;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use vm::{Machine, MachineState, VmError, Memory, Instruction, Opcode, ParamMode};
pub use vm::{InputSource, OutputSink};
pub use program::{parse_program, load_program_file, disassemble, Listing, LoadError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
