//! Instruction codec and opcode metadata.
//!
//! The dispatch loop lives outside this crate; it fetches raw words from a
//! [`Prototype`](crate::chunk::Prototype), wraps them in [`Instruction`] and
//! consults the opcode table to decide how each operand is interpreted.

mod instruction;
mod opcodes;

pub use instruction::*;
pub use opcodes::*;
