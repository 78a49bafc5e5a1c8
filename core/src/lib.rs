//! Lua 5.3 binary chunk loading, the embedding stack API and the 32-bit
//! instruction codec.

pub mod chunk;
pub mod state;
pub mod val;

// Instruction decoding and opcode metadata
pub mod vm;
