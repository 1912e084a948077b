//! Property-based tests for the machine.
//!
//! Uses proptest to verify invariants across randomly generated programs.

use crate::program::loader::{format_program, parse_program};
use crate::vm::{Machine, MachineState, VmError};
use proptest::prelude::*;
use std::collections::VecDeque;

fn run(machine: &mut Machine) -> (Result<i64, VmError>, Vec<i64>) {
    let mut output = Vec::new();
    let result = machine.run_with(&mut VecDeque::from(vec![0i64; 64]), &mut output);
    (result, output)
}

proptest! {
    /// Loading n integers yields n cells in source order, ip at 0.
    #[test]
    fn prop_load_preserves_program(program in prop::collection::vec(any::<i64>(), 1..64)) {
        let text = format_program(&program);
        let machine = Machine::from_source(&text).unwrap();

        prop_assert_eq!(machine.mem.len(), program.len());
        prop_assert_eq!(machine.memory(), program.as_slice());
        prop_assert_eq!(machine.ip, 0);
        prop_assert_eq!(machine.state, MachineState::Running);
        prop_assert_eq!(parse_program(&text).unwrap(), program);
    }

    /// HALT at position 0 stops at once and leaves cell 0 alone.
    #[test]
    fn prop_halt_first_returns_cell_zero(
        modes in 0i64..1000,
        tail in prop::collection::vec(any::<i64>(), 0..16),
    ) {
        let word = 99 + modes * 100;
        let mut program = vec![word];
        program.extend(tail);
        let mut machine = Machine::new(program);

        let (result, output) = run(&mut machine);

        prop_assert_eq!(result, Ok(word));
        prop_assert_eq!(machine.state, MachineState::Halted);
        prop_assert_eq!(machine.cycles, 1);
        prop_assert!(output.is_empty());
    }

    /// Running off the end of memory is a normal termination.
    #[test]
    fn prop_walk_off_end_is_not_a_fault(values in prop::collection::vec(any::<i64>(), 1..32)) {
        let program: Vec<i64> = values.iter().flat_map(|v| [104, *v]).collect();
        let mut machine = Machine::new(program);

        let (result, output) = run(&mut machine);

        prop_assert_eq!(result, Ok(104));
        prop_assert_eq!(machine.state, MachineState::EndOfMemory);
        prop_assert_eq!(output, values);
    }

    /// Immediate operands behave like position operands pointing at the same value.
    #[test]
    fn prop_immediate_matches_position(a in any::<i64>(), b in any::<i64>(), mul in any::<bool>()) {
        let op = if mul { 2 } else { 1 };
        let mut immediate = Machine::new(vec![1100 + op, a, b, 0, 99]);
        let mut position = Machine::new(vec![op, 5, 6, 0, 99, a, b]);

        let expected = if mul { a.wrapping_mul(b) } else { a.wrapping_add(b) };

        prop_assert_eq!(run(&mut immediate).0, Ok(expected));
        prop_assert_eq!(run(&mut position).0, Ok(expected));
    }

    /// Arbitrary images either terminate or fault; a fault leaves the
    /// instruction pointer on a real instruction.
    #[test]
    fn prop_arbitrary_programs_terminate(program in prop::collection::vec(-3i64..120, 1..48)) {
        let len = program.len();
        let mut machine = Machine::new(program);

        match run(&mut machine).0 {
            Ok(_) => prop_assert!(machine.state.is_finished()),
            Err(err) => {
                prop_assert_eq!(machine.state, MachineState::Faulted);
                prop_assert!(machine.ip < len);
                prop_assert_eq!(err.ip(), Some(machine.ip));
                prop_assert!(machine.fault_report(&err).contains("Panic:"));
            }
        }
    }
}
