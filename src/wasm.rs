//! WebAssembly bindings for the Intcode VM.
//!
//! This module provides JavaScript-friendly wrappers around the core machine.

use wasm_bindgen::prelude::*;
use crate::Machine;
use crate::program::loader::parse_program;
use crate::program::disasm;
use std::collections::VecDeque;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    program: Vec<i64>,
    input: VecDeque<i64>,
    output: Vec<i64>,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create an empty machine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(Vec::new()),
            program: Vec::new(),
            input: VecDeque::new(),
            output: Vec::new(),
        }
    }

    /// Load a program from comma-separated text. Returns the memory size.
    #[wasm_bindgen]
    pub fn load(&mut self, source: &str) -> Result<usize, JsError> {
        let program = parse_program(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = program.len();
        self.machine = Machine::new(program.clone());
        self.program = program;
        self.input.clear();
        self.output.clear();

        Ok(len)
    }

    /// Queue a value for IN.
    #[wasm_bindgen]
    pub fn push_input(&mut self, value: i64) {
        self.input.push_back(value);
    }

    /// Step one instruction. Returns the listing of the executed instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let listing = self.machine.inspect(self.machine.ip);
        self.machine.step(&mut self.input, &mut self.output)
            .map_err(|e| JsError::new(&self.machine.fault_report(&e)))?;

        Ok(listing.map(|l| l.to_string()).unwrap_or_default())
    }

    /// Run to completion. Returns the value in memory cell 0.
    #[wasm_bindgen]
    pub fn run(&mut self) -> Result<i64, JsError> {
        self.machine.run_with(&mut self.input, &mut self.output)
            .map_err(|e| JsError::new(&self.machine.fault_report(&e)))
    }

    /// Reload the last program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine = Machine::new(self.program.clone());
        self.output.clear();
    }

    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.machine.is_running()
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.machine.cycles
    }

    /// Get instruction pointer.
    #[wasm_bindgen]
    pub fn ip(&self) -> usize {
        self.machine.ip
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.machine.state)
    }

    /// Get all memory cells.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<i64> {
        self.machine.memory().to_vec()
    }

    /// Values emitted by OUT so far.
    #[wasm_bindgen]
    pub fn outputs(&self) -> Vec<i64> {
        self.output.clone()
    }

    /// Whole machine snapshot as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble comma-separated program text.
#[wasm_bindgen]
pub fn wasm_disassemble(source: &str) -> Result<String, JsError> {
    let program = parse_program(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(disasm::disassemble(&program))
}
