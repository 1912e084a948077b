//! Execution engine for Intcode.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::vm::Memory;
use crate::vm::decode::{self, DecodeError, Instruction, Opcode, ParamMode};
use crate::vm::io::{InputSource, LineReader, LineWriter, OutputSink};
use crate::vm::memory::MemoryError;
use crate::program::disasm::{self, Listing};
use crate::program::loader::{self, LoadError};
use log::{debug, info, trace, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// Machine is running normally.
    Running,
    /// Machine executed HALT.
    Halted,
    /// Instruction pointer walked off the end of memory without a HALT.
    /// Counts as a normal termination.
    EndOfMemory,
    /// Machine hit a fault.
    Faulted,
}

impl MachineState {
    /// Terminated without a fault.
    pub fn is_finished(self) -> bool {
        matches!(self, MachineState::Halted | MachineState::EndOfMemory)
    }
}

/// An Intcode machine: memory plus instruction pointer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Code and data.
    pub mem: Memory,
    /// Index of the next instruction word.
    pub ip: usize,
    /// Current execution state.
    pub state: MachineState,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Machine {
    /// Create a machine from a loaded program image.
    pub fn new(program: Vec<i64>) -> Self {
        let mem = Memory::new(program);
        let state = if mem.is_empty() {
            MachineState::EndOfMemory
        } else {
            MachineState::Running
        };

        Self {
            mem,
            ip: 0,
            state,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Parse program text and create a machine from it.
    pub fn from_source(source: &str) -> Result<Self, LoadError> {
        Ok(Self::new(loader::parse_program(source)?))
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error. Any error
    /// other than `NotRunning` leaves the machine `Faulted` with the
    /// instruction pointer still on the faulting instruction.
    pub fn step<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<Instruction, VmError>
    where
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        if self.state != MachineState::Running {
            return Err(VmError::NotRunning(self.state));
        }

        // Fetch
        let word = self.fetch(0)?;

        // Decode
        let instr = decode::decode(word);
        if log::log_enabled!(log::Level::Trace) {
            if let Some(listing) = self.inspect(self.ip) {
                trace!("{}", listing);
            }
        }

        // Execute
        if let Err(e) = self.execute(instr, input, output) {
            self.state = MachineState::Faulted;
            return Err(e);
        }

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until halt, end of memory, or fault.
    ///
    /// Returns the value left in memory cell 0.
    pub fn run_with<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<i64, VmError>
    where
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        if self.state == MachineState::Faulted {
            return Err(VmError::NotRunning(self.state));
        }

        while self.state == MachineState::Running {
            self.step(input, output)?;
        }

        let result = self.result()?;
        info!(
            "Program terminated ({:?}) after {} cycles. Result: {}",
            self.state, self.cycles, result
        );

        Ok(result)
    }

    /// Run with IN bound to stdin and OUT bound to stdout.
    pub fn run(&mut self) -> Result<i64, VmError> {
        self.run_with(&mut LineReader::stdin(), &mut LineWriter::stdout())
    }

    /// The run result: the value at memory cell 0.
    pub fn result(&self) -> Result<i64, VmError> {
        self.mem.read(0).map_err(|e| self.bad_address(e))
    }

    /// Execute a decoded instruction.
    fn execute<I, O>(&mut self, instr: Instruction, input: &mut I, output: &mut O) -> Result<(), VmError>
    where
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        let op = match instr.op() {
            Some(op) if op.is_implemented() => op,
            _ => {
                return Err(VmError::InvalidOpcode { opcode: instr.opcode, ip: self.ip });
            }
        };

        match op {
            Opcode::Add => {
                let a = self.operand(&instr, 1)?;
                let b = self.operand(&instr, 2)?;
                let dest = self.target(3)?;
                let result = a.wrapping_add(b);
                debug!("ADD {} {}: [{}] = {}", a, b, dest, result);
                self.store(dest, result)?;
            }

            Opcode::Mul => {
                let a = self.operand(&instr, 1)?;
                let b = self.operand(&instr, 2)?;
                let dest = self.target(3)?;
                let result = a.wrapping_mul(b);
                debug!("MUL {} {}: [{}] = {}", a, b, dest, result);
                self.store(dest, result)?;
            }

            Opcode::In => {
                let dest = self.target(1)?;
                let value = input
                    .next_value()
                    .map_err(|e| VmError::Io { ip: self.ip, message: e.to_string() })?
                    .ok_or(VmError::InputExhausted { ip: self.ip })?;
                debug!("IN [{}] = {}", dest, value);
                self.store(dest, value)?;
            }

            Opcode::Out => {
                let value = self.operand(&instr, 1)?;
                debug!("OUT {}", value);
                output
                    .emit(value)
                    .map_err(|e| VmError::Io { ip: self.ip, message: e.to_string() })?;
            }

            Opcode::Halt => {
                self.state = MachineState::Halted;
                return Ok(());
            }

            Opcode::Div | Opcode::Jge => {
                return Err(VmError::InvalidOpcode { opcode: instr.opcode, ip: self.ip });
            }
        }

        // Advance by opcode size + # of operands
        self.ip += 1 + op.operand_count();
        if self.ip >= self.mem.len() {
            warn!("Instruction pointer ran past the end of memory ({}) without HALT", self.mem.len());
            self.state = MachineState::EndOfMemory;
        }

        Ok(())
    }

    /// Raw word `offset` cells after the instruction pointer.
    fn fetch(&self, offset: usize) -> Result<i64, VmError> {
        let addr = self.ip + offset;
        self.mem.read(addr).map_err(|e| self.bad_address(e))
    }

    /// Value of a read operand.
    fn operand(&self, instr: &Instruction, n: usize) -> Result<i64, VmError> {
        let raw = self.fetch(n)?;
        let mode = instr
            .mode(n)
            .map_err(|source| VmError::Decode { ip: self.ip, source })?;

        match mode {
            ParamMode::Immediate => Ok(raw),
            ParamMode::Position => self.mem.read_at(raw).map_err(|e| self.bad_address(e)),
        }
    }

    /// Destination address of a write operand. The mode digit is ignored:
    /// write targets are always addresses.
    fn target(&self, n: usize) -> Result<usize, VmError> {
        let raw = self.fetch(n)?;
        self.mem.resolve(raw).map_err(|e| self.bad_address(e))
    }

    fn store(&mut self, addr: usize, value: i64) -> Result<(), VmError> {
        self.mem.write(addr, value).map_err(|e| self.bad_address(e))
    }

    fn bad_address(&self, e: MemoryError) -> VmError {
        VmError::BadAddress { address: e.address(), ip: self.ip }
    }

    /// Describe the instruction at `addr` without touching machine state.
    pub fn inspect(&self, addr: usize) -> Option<Listing> {
        disasm::describe_instruction(self.mem.as_slice(), addr)
    }

    /// Human-readable report of a fault: the faulting instruction followed
    /// by the reason.
    pub fn fault_report(&self, err: &VmError) -> String {
        let mut report = String::new();
        if let Some(listing) = err.ip().and_then(|ip| self.inspect(ip)) {
            report.push_str(&listing.to_string());
            report.push('\n');
        }
        report.push_str(&format!("Panic: {}", err.reason()));
        report
    }

    /// Consume the machine and hand back its memory.
    pub fn into_memory(self) -> Vec<i64> {
        self.mem.into_vec()
    }

    /// Memory contents.
    pub fn memory(&self) -> &[i64] {
        self.mem.as_slice()
    }

    /// Index of the next instruction word.
    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Instructions executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the machine halted (explicitly or at the end of memory).
    pub fn is_halted(&self) -> bool {
        self.state.is_finished()
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }
}

impl std::str::FromStr for Machine {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_source(s)
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("ip", &self.ip)
            .field("cycles", &self.cycles)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("machine not running: {0:?}")]
    NotRunning(MachineState),

    #[error("bad position {address} (instruction at {ip})")]
    BadAddress { address: i64, ip: usize },

    #[error("wrong opcode {opcode} (instruction at {ip})")]
    InvalidOpcode { opcode: i64, ip: usize },

    #[error("{source} (instruction at {ip})")]
    Decode { ip: usize, source: DecodeError },

    #[error("no input left for IN (instruction at {ip})")]
    InputExhausted { ip: usize },

    #[error("i/o error: {message} (instruction at {ip})")]
    Io { ip: usize, message: String },
}

impl VmError {
    /// Address of the faulting instruction.
    pub fn ip(&self) -> Option<usize> {
        match self {
            VmError::NotRunning(_) => None,
            VmError::BadAddress { ip, .. }
            | VmError::InvalidOpcode { ip, .. }
            | VmError::Decode { ip, .. }
            | VmError::InputExhausted { ip }
            | VmError::Io { ip, .. } => Some(*ip),
        }
    }

    /// Short reason used in fault reports.
    pub fn reason(&self) -> String {
        match self {
            VmError::NotRunning(state) => format!("not running ({:?})", state),
            VmError::BadAddress { address, .. } => format!("bad position {}", address),
            VmError::InvalidOpcode { opcode, .. } => format!("wrong opcode {}", opcode),
            VmError::Decode { source, .. } => source.to_string(),
            VmError::InputExhausted { .. } => "input exhausted".to_string(),
            VmError::Io { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::decode::encode;
    use std::collections::VecDeque;

    fn run(source: &str) -> (Machine, Result<i64, VmError>) {
        let mut machine = Machine::from_source(source).unwrap();
        let result = machine.run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new());
        (machine, result)
    }

    #[test]
    fn test_halt_only() {
        let (machine, result) = run("99");

        assert_eq!(result, Ok(99));
        assert_eq!(machine.state, MachineState::Halted);
        assert_eq!(machine.ip, 0);
        assert_eq!(machine.cycles, 1);
    }

    #[test]
    fn test_add_doubles_cell_zero() {
        assert_eq!(run("1,0,0,0,99").1, Ok(2));
    }

    #[test]
    fn test_mul_examples() {
        let (machine, _) = run("2,3,0,3,99");
        assert_eq!(machine.memory()[3], 6);

        let (machine, _) = run("2,4,4,5,99,0");
        assert_eq!(machine.memory()[5], 9801);
    }

    #[test]
    fn test_self_modifying_program() {
        let (machine, result) = run("1,1,1,4,99,5,6,0,99");

        assert_eq!(result, Ok(30));
        assert_eq!(machine.memory()[4], 2);
    }

    #[test]
    fn test_day2_example() {
        assert_eq!(run("1,9,10,3,2,3,11,0,99,30,40,50").1, Ok(3500));
    }

    #[test]
    fn test_immediate_mode() {
        assert_eq!(run("1101,30,40,3,1002,3,50,0,99").1, Ok(3500));
    }

    #[test]
    fn test_program_with_no_halt() {
        let (machine, result) = run("1,0,1,0");

        assert_eq!(result, Ok(1));
        assert_eq!(machine.state, MachineState::EndOfMemory);
        assert!(machine.is_halted());
    }

    #[test]
    fn test_invalid_opcode() {
        let (machine, result) = run("1,0,0,0,7,0,0,0,99");

        assert_eq!(result, Err(VmError::InvalidOpcode { opcode: 7, ip: 4 }));
        assert_eq!(machine.state, MachineState::Faulted);
        assert_eq!(machine.ip, 4);
    }

    #[test]
    fn test_reserved_opcodes_fault() {
        assert_eq!(
            run("50,0,0,0,99").1,
            Err(VmError::InvalidOpcode { opcode: 50, ip: 0 })
        );
        assert_eq!(
            run("1160,0,0,0,99").1,
            Err(VmError::InvalidOpcode { opcode: 60, ip: 0 })
        );
    }

    #[test]
    fn test_bad_position_read() {
        assert_eq!(
            run("1,999999,0,0,99").1,
            Err(VmError::BadAddress { address: 999999, ip: 0 })
        );
        assert_eq!(
            run("1,-1,0,0,99").1,
            Err(VmError::BadAddress { address: -1, ip: 0 })
        );
    }

    #[test]
    fn test_immediate_operand_skips_address_check() {
        assert_eq!(run("101,999999,0,0,99").1, Ok(1000100));
    }

    #[test]
    fn test_write_target_ignores_immediate_mode() {
        // Mode digit 1 on operand 3 still writes to address 0.
        assert_eq!(run("11101,2,3,0,99").1, Ok(5));
        assert_eq!(
            run("11101,2,3,50,99").1,
            Err(VmError::BadAddress { address: 50, ip: 0 })
        );
    }

    #[test]
    fn test_truncated_instruction() {
        let (_, result) = run("1,0,0");
        assert_eq!(result, Err(VmError::BadAddress { address: 3, ip: 0 }));
    }

    #[test]
    fn test_bad_mode_digit() {
        let (_, result) = run("201,0,0,0,99");
        assert_eq!(
            result,
            Err(VmError::Decode {
                ip: 0,
                source: DecodeError::InvalidMode { operand: 1, digit: 2 },
            })
        );
    }

    #[test]
    fn test_input_and_output() {
        let mut machine = Machine::from_source("3,0,4,0,104,-7,99").unwrap();
        let mut input: VecDeque<i64> = VecDeque::from(vec![42]);
        let mut output: Vec<i64> = Vec::new();

        let result = machine.run_with(&mut input, &mut output).unwrap();

        assert_eq!(result, 42);
        assert_eq!(output, vec![42, -7]);
        assert!(input.is_empty());
    }

    #[test]
    fn test_input_exhausted() {
        let mut machine = Machine::from_source("3,0,99").unwrap();
        let result = machine.run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new());

        assert_eq!(result, Err(VmError::InputExhausted { ip: 0 }));
        assert_eq!(machine.state, MachineState::Faulted);
    }

    #[test]
    fn test_input_from_lines() {
        let mut machine = Machine::from_source("3,0,99").unwrap();
        let mut input = LineReader::new("17\n".as_bytes());

        assert_eq!(machine.run_with(&mut input, &mut Vec::<i64>::new()), Ok(17));
    }

    #[test]
    fn test_step_and_not_running() {
        let mut machine = Machine::new(vec![
            encode(Opcode::Add, &[ParamMode::Immediate, ParamMode::Immediate]),
            2,
            3,
            0,
            encode(Opcode::Halt, &[]),
        ]);
        let mut input: VecDeque<i64> = VecDeque::new();
        let mut output: Vec<i64> = Vec::new();

        let first = machine.step(&mut input, &mut output).unwrap();
        assert_eq!(first.op(), Some(Opcode::Add));
        assert_eq!(machine.ip, 4);
        assert_eq!(machine.memory()[0], 5);

        machine.step(&mut input, &mut output).unwrap();
        assert_eq!(machine.last_instruction().and_then(|i| i.op()), Some(Opcode::Halt));
        assert_eq!(
            machine.step(&mut input, &mut output),
            Err(VmError::NotRunning(MachineState::Halted))
        );
    }

    #[test]
    fn test_accessors_follow_execution() {
        let mut machine = Machine::from_source("1101,2,3,0,4,0,99").unwrap();
        let mut input: VecDeque<i64> = VecDeque::new();
        let mut output: Vec<i64> = Vec::new();

        assert_eq!(machine.ip(), 0);
        assert_eq!(machine.state(), MachineState::Running);
        assert_eq!(machine.cycles(), 0);

        machine.step(&mut input, &mut output).unwrap();
        assert_eq!(machine.ip(), 4);
        assert_eq!(machine.cycles(), 1);

        machine.run_with(&mut input, &mut output).unwrap();
        assert_eq!(machine.ip(), 6);
        assert_eq!(machine.state(), MachineState::Halted);
        assert_eq!(machine.cycles(), 3);
        assert_eq!(output, vec![5]);
    }

    #[test]
    fn test_run_after_fault_is_rejected() {
        let (mut machine, _) = run("7");
        let again = machine.run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new());

        assert_eq!(again, Err(VmError::NotRunning(MachineState::Faulted)));
    }

    #[test]
    fn test_fault_report() {
        let (machine, result) = run("1,0,0,0,7,0,0,0,99");
        let report = machine.fault_report(&result.unwrap_err());

        assert_eq!(report, "    4: INVALID(    7) \nPanic: wrong opcode 7");
    }

    #[test]
    fn test_fault_report_bad_position() {
        let (machine, result) = run("1,999999,0,0,99");
        let report = machine.fault_report(&result.unwrap_err());

        assert_eq!(
            report,
            "    0:   ADD(    1) 999999     0     0 \nPanic: bad position 999999"
        );
    }

    #[test]
    fn test_empty_program() {
        let mut machine = Machine::new(Vec::new());

        assert_eq!(machine.state, MachineState::EndOfMemory);
        assert_eq!(
            machine.run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new()),
            Err(VmError::BadAddress { address: 0, ip: 0 })
        );
    }

    #[test]
    fn test_into_memory_releases_buffer() {
        let (machine, _) = run("2,3,0,3,99");
        assert_eq!(machine.into_memory(), vec![2, 3, 0, 6, 99]);
    }

    #[test]
    fn test_from_str() {
        let machine: Machine = "1,2,3".parse().unwrap();
        assert_eq!(machine.memory(), &[1, 2, 3]);
        assert!("1,x".parse::<Machine>().is_err());
    }
}
