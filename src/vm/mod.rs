//! The Intcode interpreter.
//!
//! This module implements the whole machine:
//! - a flat memory of signed 64-bit cells shared by code and data
//! - the instruction decoder (opcode + per-operand addressing modes)
//! - the fetch-decode-execute loop with IN/OUT streams

pub mod memory;
pub mod decode;
pub mod io;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use decode::{Instruction, Opcode, ParamMode, Role, DecodeError};
pub use io::{InputSource, OutputSink, LineReader, LineWriter};
pub use execute::{Machine, MachineState, VmError};
