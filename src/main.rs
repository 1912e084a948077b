//! Intcode VM - CLI Entry Point
//!
//! Commands:
//! - `intcode-vm run <program>` - Run a program file
//! - `intcode-vm debug <program>` - Interactive debugger
//! - `intcode-vm disasm <program>` - Disassemble a program file
//! - `intcode-vm test` - Built-in self-test

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "intcode-vm")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "A small virtual machine for Intcode programs")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv instruction trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the comma-separated program file
        program: String,
        /// Values for IN instructions (read from stdin when omitted)
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
        input: Option<Vec<i64>>,
        /// Print a JSON run report instead of the bare result
        #[arg(long)]
        json: bool,
        /// Write the final memory image to this file
        #[arg(long)]
        dump: Option<String>,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program file to debug
        program: String,
        /// Values for IN instructions
        #[arg(short, long, num_args = 1.., allow_negative_numbers = true)]
        input: Vec<i64>,
    },
    /// Disassemble a program file to readable text
    Disasm {
        /// Path to the program file
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

/// What `run --json` prints.
#[derive(Serialize)]
struct RunReport<'a> {
    result: i64,
    state: intcode::MachineState,
    cycles: u64,
    memory: &'a [i64],
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { program, input, json, dump }) => {
            run_program(&program, input, json, dump.as_deref());
        }
        Some(Commands::Debug { program, input }) => {
            debug_program(&program, input);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("Intcode VM v0.1.0");
            println!("Runs comma-separated Intcode programs");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialise logging: {}", e);
    }
}

fn load_or_exit(path: &str) -> Vec<i64> {
    match intcode::load_program_file(path) {
        Ok(program) => {
            log::info!("Loaded {} cells from {}", program.len(), path);
            program
        }
        Err(e) => {
            eprintln!("Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, input: Option<Vec<i64>>, json: bool, dump: Option<&str>) {
    use intcode::Machine;
    use intcode::vm::{LineReader, LineWriter};
    use std::collections::VecDeque;

    let mut machine = Machine::new(load_or_exit(path));
    let mut output = LineWriter::stdout();

    let result = match input {
        Some(values) => machine.run_with(&mut VecDeque::from(values), &mut output),
        None => machine.run_with(&mut LineReader::stdin(), &mut output),
    };

    if let Some(dump_path) = dump {
        if let Err(e) = intcode::program::save_program(dump_path, machine.memory()) {
            eprintln!("Failed to write memory dump: {}", e);
        }
    }

    let result = match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}", machine.fault_report(&e));
            std::process::exit(1);
        }
    };

    if json {
        let report = RunReport {
            result,
            state: machine.state,
            cycles: machine.cycles,
            memory: machine.memory(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialise run report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", result);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, input: Vec<i64>) {
    let program = load_or_exit(path);

    if let Err(e) = intcode::run_debugger(program, input) {
        eprintln!("Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _input: Vec<i64>) {
    eprintln!("This build has no debugger (enable the `tui` feature)");
    std::process::exit(1);
}

fn disassemble_file(path: &str) {
    let program = load_or_exit(path);
    print!("{}", intcode::disassemble(&program));
}

fn run_self_test() {
    use intcode::{Machine, VmError};
    use std::collections::VecDeque;

    println!("Intcode VM Self-Test");
    println!();

    // (program, cell to check, expected value)
    let cases: [(&str, usize, i64); 6] = [
        ("1,0,0,0,99", 0, 2),
        ("2,3,0,3,99", 3, 6),
        ("2,4,4,5,99,0", 5, 9801),
        ("1,1,1,4,99,5,6,0,99", 0, 30),
        ("1,9,10,3,2,3,11,0,99,30,40,50", 0, 3500),
        ("1101,30,40,3,1002,3,50,0,99", 0, 3500),
    ];

    let mut passed = 0;
    let mut failed = 0;

    for (source, cell, expected) in cases {
        print!("{} -> [{}] == {}... ", source, cell, expected);
        let outcome = Machine::from_source(source)
            .map_err(|e| e.to_string())
            .and_then(|mut machine| {
                machine
                    .run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new())
                    .map_err(|e| e.to_string())?;
                Ok(machine.memory()[cell])
            });
        match outcome {
            Ok(value) if value == expected => {
                println!("ok");
                passed += 1;
            }
            Ok(value) => {
                println!("FAILED (got {})", value);
                failed += 1;
            }
            Err(e) => {
                println!("FAILED ({})", e);
                failed += 1;
            }
        }
    }

    print!("Invalid opcode faults... ");
    let mut machine = Machine::new(vec![7, 0, 0, 0, 99]);
    match machine.run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new()) {
        Err(VmError::InvalidOpcode { opcode: 7, .. }) => {
            println!("ok");
            passed += 1;
        }
        other => {
            println!("FAILED ({:?})", other);
            failed += 1;
        }
    }

    print!("Bad position faults... ");
    let mut machine = Machine::new(vec![1, 999999, 0, 0, 99]);
    match machine.run_with(&mut VecDeque::<i64>::new(), &mut Vec::<i64>::new()) {
        Err(VmError::BadAddress { address: 999999, .. }) => {
            println!("ok");
            passed += 1;
        }
        other => {
            println!("FAILED ({:?})", other);
            failed += 1;
        }
    }

    println!();
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}
