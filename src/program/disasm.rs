//! Disassembler for Intcode memory images.
//!
//! Listings never execute anything; they read the image as it is.

use crate::vm::decode::decode;

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Address of the instruction word.
    pub addr: usize,
    /// The raw instruction word.
    pub word: i64,
    /// Mnemonic, or `INVALID`.
    pub name: &'static str,
    /// Operand words; `None` where the instruction runs past memory.
    pub operands: Vec<Option<i64>>,
    /// Address of the following instruction.
    pub next: usize,
}

impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:5}: {:>5}({:5}) ", self.addr, self.name, self.word)?;
        for operand in &self.operands {
            match operand {
                Some(value) => write!(f, "{:5} ", value)?,
                None => write!(f, "{:>5} ", "?")?,
            }
        }
        Ok(())
    }
}

/// Describe the instruction at `addr`, or `None` past the end of memory.
pub fn describe_instruction(memory: &[i64], addr: usize) -> Option<Listing> {
    let word = *memory.get(addr)?;
    let instr = decode(word);
    let count = instr.operand_count();

    Some(Listing {
        addr,
        word,
        name: instr.name(),
        operands: (1..=count).map(|i| memory.get(addr + i).copied()).collect(),
        next: addr + 1 + count,
    })
}

/// Walk the image from address 0, one instruction after another.
pub fn listings(memory: &[i64]) -> Vec<Listing> {
    let mut out = Vec::new();
    let mut addr = 0;

    while let Some(listing) = describe_instruction(memory, addr) {
        addr = listing.next;
        out.push(listing);
    }

    out
}

/// Disassemble a whole memory image to text.
pub fn disassemble(memory: &[i64]) -> String {
    let mut output = String::new();
    output.push_str("; Intcode Disassembly\n");
    output.push_str("; -------------------\n\n");

    for listing in listings(memory) {
        output.push_str(&listing.to_string());
        output.push('\n');
    }

    output
}
