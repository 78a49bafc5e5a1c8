//! Lua 5.3 precompiled chunk support.
//!
//! A chunk is a fixed header, one byte holding the main closure's upvalue
//! count, and the main function prototype with its nested prototypes. All
//! multi-byte fields are little-endian.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::val::Val;
use crate::vm::Instruction;

mod config;
mod error;
mod listing;
mod reader;
mod writer;

pub use config::{DEFAULT_MAX_DEPTH, LoadConfig};
pub use error::ChunkError;
pub use listing::listing;
pub use reader::Reader;
pub use writer::dump;

pub const LUA_SIGNATURE: &[u8; 4] = b"\x1bLua";
pub const LUAC_VERSION: u8 = 0x53;
pub const LUAC_FORMAT: u8 = 0;
pub const LUAC_DATA: &[u8; 6] = b"\x19\x93\r\n\x1a\n";
pub const CINT_SIZE: u8 = 4;
pub const CSIZET_SIZE: u8 = 8;
pub const INSTRUCTION_SIZE: u8 = 4;
pub const LUA_INTEGER_SIZE: u8 = 8;
pub const LUA_NUMBER_SIZE: u8 = 8;
pub const LUAC_INT: i64 = 0x5678;
pub const LUAC_NUM: f64 = 370.5;

/// Total header length, sentinels included.
pub const HEADER_SIZE: usize = 4 + 1 + 1 + 6 + 5 + 8 + 8;

pub const TAG_NIL: u8 = 0x00;
pub const TAG_BOOLEAN: u8 = 0x01;
pub const TAG_NUMBER: u8 = 0x03;
pub const TAG_INTEGER: u8 = 0x13;
pub const TAG_SHORT_STR: u8 = 0x04;
pub const TAG_LONG_STR: u8 = 0x14;

/// Strings up to this many bytes are dumped with the short-string tag.
pub const LUAI_MAXSHORTLEN: usize = 40;

/// Upvalue descriptor: captured from the enclosing function's registers when
/// `instack` is non-zero, otherwise from the enclosing closure's upvalues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Upvalue {
    pub instack: u8,
    pub idx: u8,
}

impl Upvalue {
    #[inline]
    pub fn is_stack_local(&self) -> bool {
        self.instack != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocVar {
    pub name: String,
    pub start_pc: u32,
    pub end_pc: u32,
}

/// One compiled function body.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Prototype {
    pub source: String,
    pub line_defined: u32,
    pub last_line_defined: u32,
    pub num_params: u8,
    pub is_vararg: u8,
    pub max_stack_size: u8,
    pub code: Vec<u32>,
    pub constants: Vec<Val>,
    pub upvalues: Vec<Upvalue>,
    pub protos: Vec<Prototype>,
    /// Source line per instruction; empty when debug info was stripped.
    pub line_info: Vec<u32>,
    pub loc_vars: Vec<LocVar>,
    pub upvalue_names: Vec<String>,
}

impl Prototype {
    #[inline]
    pub fn instruction(&self, pc: usize) -> Option<Instruction> {
        self.code.get(pc).copied().map(Instruction)
    }

    pub fn instructions(&self) -> impl Iterator<Item = Instruction> + '_ {
        self.code.iter().copied().map(Instruction)
    }

    #[inline]
    pub fn has_varargs(&self) -> bool {
        self.is_vararg != 0
    }

    #[inline]
    pub fn is_main(&self) -> bool {
        self.line_defined == 0
    }

    /// Source line of the instruction at `pc`, if debug info is present.
    #[inline]
    pub fn line_at(&self, pc: usize) -> Option<u32> {
        self.line_info.get(pc).copied()
    }

    /// Number of prototypes in this tree, `self` included.
    pub fn count_protos(&self) -> usize {
        1 + self.protos.iter().map(Prototype::count_protos).sum::<usize>()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialise prototype")
    }
}

/// A decoded chunk: the main function plus the upvalue count its closure is
/// instantiated with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub upvalue_count: u8,
    pub main: Prototype,
}

impl Chunk {
    pub fn load(bytes: &[u8]) -> std::result::Result<Self, ChunkError> {
        Self::load_with(bytes, LoadConfig::default())
    }

    pub fn load_with(bytes: &[u8], config: LoadConfig) -> std::result::Result<Self, ChunkError> {
        let mut reader = Reader::with_config(bytes, config);
        reader.check_header()?;
        let upvalue_count = reader.read_byte()?;
        let main = reader.read_proto("")?;
        if !reader.is_at_end() {
            return Err(ChunkError::TrailingBytes {
                count: reader.remaining(),
            });
        }
        debug!(
            target: "lunar::chunk",
            source = %main.source,
            bytes = bytes.len(),
            prototypes = main.count_protos(),
            upvalues = upvalue_count,
            "chunk loaded"
        );
        Ok(Self { upvalue_count, main })
    }

    pub fn dump(&self, strip: bool) -> Vec<u8> {
        dump(self, strip)
    }
}

/// Decodes a chunk and returns its main prototype.
pub fn undump(bytes: &[u8]) -> std::result::Result<Prototype, ChunkError> {
    Chunk::load(bytes).map(|chunk| chunk.main)
}

/// Like [`undump`], attaching the chunk name to any error.
pub fn undump_named(bytes: &[u8], chunk_name: &str) -> Result<Prototype> {
    undump(bytes).with_context(|| format!("failed to load chunk `{}`", chunk_name))
}

#[cfg(test)]
mod chunk_test;
