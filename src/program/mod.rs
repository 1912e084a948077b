//! Program text tooling.
//!
//! This module provides:
//! - A loader (comma-separated text → memory image)
//! - A disassembler (memory image → readable listing)

pub mod loader;
pub mod disasm;

pub use loader::{parse_program, format_program, load_program_file, save_program, LoadError};
pub use disasm::{describe_instruction, disassemble, listings, Listing};
