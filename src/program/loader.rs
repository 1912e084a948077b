//! Program text loader.
//!
//! Programs are comma-separated signed decimal integers, e.g.
//! `1,9,10,3,2,3,11,0,99,30,40,50`. Whitespace around a value (such as the
//! trailing newline of a file) is ignored.

use std::path::Path;
use std::io::Write;
use thiserror::Error;

/// Parse program text into a memory image.
///
/// The image has one cell per comma-separated token, in source order.
pub fn parse_program(source: &str) -> Result<Vec<i64>, LoadError> {
    let mut program = Vec::with_capacity(source.matches(',').count() + 1);

    for (index, token) in source.split(',').enumerate() {
        let text = token.trim();
        let value = text.parse::<i64>()
            .map_err(|_| LoadError::MalformedProgram {
                index,
                token: text.to_string(),
            })?;
        program.push(value);
    }

    Ok(program)
}

/// Render a memory image back to program text.
pub fn format_program(program: &[i64]) -> String {
    program
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Load a program file from disk.
pub fn load_program_file<P: AsRef<Path>>(path: P) -> Result<Vec<i64>, LoadError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| LoadError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_program(&source)
}

/// Save a memory image as program text.
pub fn save_program<P: AsRef<Path>>(path: P, program: &[i64]) -> Result<(), LoadError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| LoadError::IoError(e.to_string()))?;

    writeln!(file, "{}", format_program(program))
        .map_err(|e| LoadError::IoError(e.to_string()))?;

    Ok(())
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("malformed program: token {index} (`{token}`) is not an integer")]
    MalformedProgram { index: usize, token: String },
}
