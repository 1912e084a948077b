//! Debugger application state and logic.

use crate::Machine;
use crate::program::disasm::{describe_instruction, listings, Listing};
use std::collections::{HashSet, VecDeque};

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Original program for reference.
    pub program: Vec<i64>,
    /// Values given on the command line for IN.
    pub initial_input: Vec<i64>,
    /// Values not yet consumed by IN.
    pub input: VecDeque<i64>,
    /// Values emitted by OUT.
    pub output: Vec<i64>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Step over a breakpoint at the current ip on the next tick.
    resume_past_breakpoint: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<i64>, input: Vec<i64>) -> Self {
        Self {
            machine: Machine::new(program.clone()),
            program,
            input: input.iter().copied().collect(),
            initial_input: input,
            output: Vec::new(),
            breakpoints: HashSet::new(),
            running: false,
            resume_past_breakpoint: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.machine.is_running() {
            self.status = format!("Machine stopped: {:?}", self.machine.state);
            self.running = false;
            return;
        }

        let ip = self.machine.ip;
        let listing = self.machine.inspect(ip);
        match self.machine.step(&mut self.input, &mut self.output) {
            Ok(_) => {
                self.status = match listing {
                    Some(listing) => listing.to_string(),
                    None => format!("IP={}", ip),
                };
            }
            Err(e) => {
                self.status = format!("Fault: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or fault.
    pub fn run(&mut self) {
        self.running = true;
        self.resume_past_breakpoint = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.machine.is_running() {
            self.running = false;
            self.status = match self.machine.result() {
                Ok(result) => format!(
                    "{:?} after {} cycles, result {}",
                    self.machine.state, self.machine.cycles, result
                ),
                Err(e) => format!("Stopped: {}", e),
            };
            return;
        }

        let ip = self.machine.ip;
        let resuming = std::mem::take(&mut self.resume_past_breakpoint);
        if !resuming && self.breakpoints.contains(&ip) {
            self.running = false;
            self.status = format!("Breakpoint at IP={}", ip);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the current instruction pointer.
    pub fn toggle_breakpoint(&mut self) {
        let ip = self.machine.ip;
        if self.breakpoints.remove(&ip) {
            self.status = format!("Removed breakpoint at IP={}", ip);
        } else {
            self.breakpoints.insert(ip);
            self.status = format!("Set breakpoint at IP={}", ip);
        }
    }

    /// Reload the original program and input.
    pub fn reset(&mut self) {
        self.machine = Machine::new(self.program.clone());
        self.input = self.initial_input.iter().copied().collect();
        self.output.clear();
        self.running = false;
        self.resume_past_breakpoint = false;
        self.status = "Reset. Ready.".into();
    }

    /// Scroll the memory view, clamped to the image.
    pub fn scroll(&mut self, delta: isize) {
        let max = self.machine.mem.len().saturating_sub(1);
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Listings around the instruction pointer.
    ///
    /// Decoding restarts from address 0 each time, so the window follows the
    /// same instruction boundaries as a full disassembly.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(Listing, bool)> {
        let memory = self.machine.memory();
        let ip = self.machine.ip;

        let mut all = listings(memory);
        // Self-modifying code can leave ip between listed boundaries.
        if !all.iter().any(|l| l.addr == ip) {
            if let Some(listing) = describe_instruction(memory, ip) {
                let at = all.partition_point(|l| l.addr < ip);
                all.insert(at, listing);
            }
        }

        let current = all.iter().position(|l| l.addr == ip).unwrap_or(all.len());
        let start = current.saturating_sub(lines / 2);

        all.into_iter()
            .skip(start)
            .take(lines)
            .map(|listing| {
                let is_current = listing.addr == ip;
                (listing, is_current)
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<i64>, input: Vec<i64>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, input);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll(-1),
                        KeyCode::Down => app.scroll(1),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
