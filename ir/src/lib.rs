//! Shared Bril IR support for the optimization passes in this workspace:
//! the program model, JSON reading/writing, and basic-block utilities.

pub mod block;
mod error;
mod program;

pub use error::BrilError;
pub use program::{
    Argument, Code, ConstOps, EffectOps, Function, Instruction, Literal, Program, Type, ValueOps,
};

use std::io::{Read, Write};

/// Read a whole JSON program document.
pub fn load_program<R: Read>(input: R) -> Result<Program, BrilError> {
    Ok(serde_json::from_reader(input)?)
}

/// Write the program document as a single line.
pub fn output_program<W: Write>(program: &Program, mut output: W) -> Result<(), BrilError> {
    serde_json::to_writer(&mut output, program)?;
    writeln!(output)?;
    Ok(())
}
