//! Instruction decoder for Intcode.
//!
//! An instruction word packs the opcode in its two low decimal digits and
//! one addressing-mode digit per operand above that:
//!
//! ```text
//!   A B C D E
//!   | | | +-+-- opcode (word % 100)
//!   | | +------ mode of operand 1
//!   | +-------- mode of operand 2
//!   +---------- mode of operand 3
//! ```

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamMode {
    /// Operand is an address (digit 0)
    Position,
    /// Operand is the value itself (digit 1)
    Immediate,
}

impl ParamMode {
    /// Create from a mode digit.
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(ParamMode::Position),
            1 => Some(ParamMode::Immediate),
            _ => None,
        }
    }

    /// Convert to a mode digit.
    pub fn to_digit(self) -> i64 {
        match self {
            ParamMode::Position => 0,
            ParamMode::Immediate => 1,
        }
    }
}

/// How an opcode uses one of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Read,
    Write,
}

/// Opcodes known to the machine.
///
/// `Div` and `Jge` are reserved: they have names and an operand layout for
/// listings, but the executor rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// `[c] := a + b`
    Add,
    /// `[c] := a * b`
    Mul,
    /// `[a] := next input value`
    In,
    /// Emit `a` on the output stream
    Out,
    /// Stop; the run result is `memory[0]`
    Halt,
    /// Reserved
    Div,
    /// Reserved
    Jge,
}

impl Opcode {
    pub const ALL: [Opcode; 7] = [
        Opcode::Add,
        Opcode::Mul,
        Opcode::In,
        Opcode::Out,
        Opcode::Halt,
        Opcode::Div,
        Opcode::Jge,
    ];

    const ADD: i64 = 1;
    const MUL: i64 = 2;
    const IN: i64 = 3;
    const OUT: i64 = 4;
    const HALT: i64 = 99;
    const DIV: i64 = 50;
    const JGE: i64 = 60;

    /// Look up an opcode number.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::ADD => Some(Opcode::Add),
            Self::MUL => Some(Opcode::Mul),
            Self::IN => Some(Opcode::In),
            Self::OUT => Some(Opcode::Out),
            Self::HALT => Some(Opcode::Halt),
            Self::DIV => Some(Opcode::Div),
            Self::JGE => Some(Opcode::Jge),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => Self::ADD,
            Opcode::Mul => Self::MUL,
            Opcode::In => Self::IN,
            Opcode::Out => Self::OUT,
            Opcode::Halt => Self::HALT,
            Opcode::Div => Self::DIV,
            Opcode::Jge => Self::JGE,
        }
    }

    /// Mnemonic used in listings.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::In => "IN",
            Opcode::Out => "OUT",
            Opcode::Halt => "HALT",
            Opcode::Div => "DIV",
            Opcode::Jge => "JGE",
        }
    }

    /// Operand roles, in operand order.
    pub fn roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Opcode::Add | Opcode::Mul => &[Read, Read, Write],
            Opcode::In => &[Write],
            Opcode::Out => &[Read],
            Opcode::Halt => &[],
            // a, b, target
            Opcode::Div => &[Read, Read, Write],
            Opcode::Jge => &[Read, Read, Read],
        }
    }

    pub fn operand_count(self) -> usize {
        self.roles().len()
    }

    /// Whether the executor dispatches this opcode.
    pub fn is_implemented(self) -> bool {
        !matches!(self, Opcode::Div | Opcode::Jge)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded instruction word.
///
/// Decoding never fails: unknown opcodes and bad mode digits are kept as
/// raw numbers and only rejected when the executor needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The raw word.
    pub word: i64,
    /// `word % 100`.
    pub opcode: i64,
    /// Mode digits for operands 1..=3.
    pub modes: [i64; 3],
}

impl Instruction {
    /// The known opcode, if any.
    pub fn op(&self) -> Option<Opcode> {
        Opcode::from_code(self.opcode)
    }

    /// Mnemonic, or `INVALID` for unknown opcodes.
    pub fn name(&self) -> &'static str {
        self.op().map_or("INVALID", Opcode::name)
    }

    /// Operands following the word; zero for unknown opcodes.
    pub fn operand_count(&self) -> usize {
        self.op().map_or(0, Opcode::operand_count)
    }

    /// Addressing mode of operand `n` (1-indexed).
    pub fn mode(&self, n: usize) -> Result<ParamMode, DecodeError> {
        let digit = *self.modes
            .get(n.wrapping_sub(1))
            .ok_or(DecodeError::NoSuchOperand(n))?;
        ParamMode::from_digit(digit).ok_or(DecodeError::InvalidMode { operand: n, digit })
    }
}

/// Split an instruction word into opcode and mode digits.
pub fn decode(word: i64) -> Instruction {
    let modes = word / 100;
    Instruction {
        word,
        opcode: word % 100,
        modes: [modes % 10, modes / 10 % 10, modes / 100 % 10],
    }
}

/// Build an instruction word from an opcode and per-operand modes.
///
/// Missing trailing modes default to position mode.
pub fn encode(opcode: Opcode, modes: &[ParamMode]) -> i64 {
    modes
        .iter()
        .take(3)
        .enumerate()
        .fold(opcode.code(), |word, (i, mode)| {
            word + mode.to_digit() * 100 * 10i64.pow(i as u32)
        })
}

/// Errors that can occur while interpreting a decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid addressing mode {digit} for operand {operand}")]
    InvalidMode { operand: usize, digit: i64 },

    #[error("instructions have at most 3 operands, not {0}")]
    NoSuchOperand(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_opcode() {
        let instr = decode(2);
        assert_eq!(instr.op(), Some(Opcode::Mul));
        assert_eq!(instr.modes, [0, 0, 0]);
        assert_eq!(instr.mode(1), Ok(ParamMode::Position));
    }

    #[test]
    fn test_decode_modes() {
        let instr = decode(1002);
        assert_eq!(instr.op(), Some(Opcode::Mul));
        assert_eq!(instr.mode(1), Ok(ParamMode::Position));
        assert_eq!(instr.mode(2), Ok(ParamMode::Immediate));
        assert_eq!(instr.mode(3), Ok(ParamMode::Position));

        let instr = decode(11101);
        assert_eq!(instr.op(), Some(Opcode::Add));
        assert_eq!(instr.modes, [1, 1, 1]);
    }

    #[test]
    fn test_decode_unknown_opcode() {
        let instr = decode(7);
        assert_eq!(instr.op(), None);
        assert_eq!(instr.name(), "INVALID");
        assert_eq!(instr.operand_count(), 0);
    }

    #[test]
    fn test_reserved_opcodes_are_named_but_not_implemented() {
        let div = decode(50).op().unwrap();
        let jge = decode(1160).op().unwrap();

        assert_eq!(div.name(), "DIV");
        assert_eq!(jge.name(), "JGE");
        assert_eq!(div.operand_count(), 3);
        assert!(!div.is_implemented());
        assert!(!jge.is_implemented());
        assert!(Opcode::Halt.is_implemented());
    }

    #[test]
    fn test_bad_mode_digit() {
        let instr = decode(201);
        assert_eq!(
            instr.mode(1),
            Err(DecodeError::InvalidMode { operand: 1, digit: 2 })
        );
        assert_eq!(instr.mode(2), Ok(ParamMode::Position));
        assert_eq!(instr.mode(4), Err(DecodeError::NoSuchOperand(4)));
        assert_eq!(instr.mode(0), Err(DecodeError::NoSuchOperand(0)));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(Opcode::Halt, &[]), 99);
        assert_eq!(encode(Opcode::Add, &[ParamMode::Immediate, ParamMode::Immediate]), 1101);
        assert_eq!(
            encode(Opcode::Mul, &[ParamMode::Position, ParamMode::Immediate, ParamMode::Position]),
            1002
        );
    }

    #[test]
    fn test_opcode_codes_match_table() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_code(op.code()), Some(op));
        }
        assert_eq!(Opcode::In.roles(), &[Role::Write]);
        assert_eq!(Opcode::Out.roles(), &[Role::Read]);
        assert_eq!(Opcode::Halt.operand_count(), 0);
    }
}
