//! Forward-only cursor over a precompiled chunk.

use tracing::{trace, warn};

use crate::val::{LuaString, Val};

use super::config::LoadConfig;
use super::error::ChunkError;
use super::{
    CINT_SIZE, CSIZET_SIZE, INSTRUCTION_SIZE, LUA_INTEGER_SIZE, LUA_NUMBER_SIZE, LUA_SIGNATURE, LUAC_DATA,
    LUAC_FORMAT, LUAC_INT, LUAC_NUM, LUAC_VERSION, LocVar, Prototype, TAG_BOOLEAN, TAG_INTEGER, TAG_LONG_STR,
    TAG_NIL, TAG_NUMBER, TAG_SHORT_STR, Upvalue,
};

const TRACE_TARGET: &str = "lunar::chunk";

/// Smallest possible encoding of a nested prototype: empty source, two line
/// numbers, three header bytes and six empty counts.
const MIN_PROTO_SIZE: usize = 1 + 4 + 4 + 3 + 6 * 4;
/// Empty name plus start and end pc.
const MIN_LOCVAR_SIZE: usize = 1 + 4 + 4;

type Result<T> = std::result::Result<T, ChunkError>;

pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    config: LoadConfig,
    depth: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, LoadConfig::default())
    }

    pub fn with_config(data: &'a [u8], config: LoadConfig) -> Self {
        Self {
            data,
            pos: 0,
            config,
            depth: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(ChunkError::UnexpectedEof { what, offset: self.pos });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, what)?);
        Ok(buf)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1, "byte")?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take_array("u32").map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.take_array("u64").map(u64::from_le_bytes)
    }

    pub fn read_lua_integer(&mut self) -> Result<i64> {
        self.read_u64().map(|bits| bits as i64)
    }

    pub fn read_lua_number(&mut self) -> Result<f64> {
        self.read_u64().map(f64::from_bits)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n, "bytes")
    }

    /// Size byte, `0xFF` escaping to a full `size_t`, then `size - 1` bytes.
    /// Size 0 encodes the absent string and reads back as empty.
    pub fn read_string(&mut self) -> Result<LuaString> {
        let start = self.pos;
        let mut size = self.read_byte()? as u64;
        if size == 0 {
            return Ok(LuaString::empty());
        }
        if size == 0xFF {
            size = self.read_u64()?;
            if size == 0 {
                return Err(ChunkError::UnexpectedEof { what: "string", offset: start });
            }
        }
        let len = usize::try_from(size - 1).map_err(|_| ChunkError::UnexpectedEof {
            what: "string",
            offset: start,
        })?;
        let bytes = self.take(len, "string")?;
        Ok(LuaString::from(bytes))
    }

    fn read_name(&mut self) -> Result<String> {
        self.read_string().map(|s| s.to_str_lossy().into_owned())
    }

    /// Element count, rejected up front when the remaining input cannot hold
    /// that many elements of at least `min_width` bytes each.
    fn read_count(&mut self, min_width: usize, what: &'static str) -> Result<usize> {
        let offset = self.pos;
        let count = self.read_u32()? as usize;
        match count.checked_mul(min_width) {
            Some(needed) if needed <= self.remaining() => Ok(count),
            _ => Err(ChunkError::UnexpectedEof { what, offset }),
        }
    }

    pub fn check_header(&mut self) -> Result<()> {
        let result = self.check_header_fields();
        if let Err(err) = &result {
            warn!(target: TRACE_TARGET, error = %err, "rejected chunk header");
        }
        result
    }

    fn check_header_fields(&mut self) -> Result<()> {
        if self.take(LUA_SIGNATURE.len(), "signature")? != LUA_SIGNATURE {
            return Err(ChunkError::NotAChunk);
        }
        let version = self.read_byte()?;
        if version != LUAC_VERSION {
            return Err(ChunkError::VersionMismatch { found: version });
        }
        let format = self.read_byte()?;
        if format != LUAC_FORMAT {
            return Err(ChunkError::FormatMismatch { found: format });
        }
        if self.take(LUAC_DATA.len(), "LUAC_DATA")? != LUAC_DATA {
            return Err(ChunkError::Corrupted);
        }
        for (what, expected) in [
            ("int", CINT_SIZE),
            ("size_t", CSIZET_SIZE),
            ("Instruction", INSTRUCTION_SIZE),
            ("lua_Integer", LUA_INTEGER_SIZE),
            ("lua_Number", LUA_NUMBER_SIZE),
        ] {
            let found = self.read_byte()?;
            if found != expected {
                return Err(ChunkError::SizeMismatch { what, expected, found });
            }
        }
        if self.read_lua_integer()? != LUAC_INT {
            return Err(ChunkError::EndiannessMismatch);
        }
        let bits = self.read_u64()?;
        let num = f64::from_bits(bits);
        if num != LUAC_NUM {
            if f64::from_bits(bits.swap_bytes()) == LUAC_NUM {
                return Err(ChunkError::EndiannessMismatch);
            }
            return Err(ChunkError::FloatFormatMismatch { found: num });
        }
        Ok(())
    }

    /// Decodes one function prototype and, recursively, everything it owns.
    pub fn read_proto(&mut self, parent_source: &str) -> Result<Prototype> {
        self.depth += 1;
        let result = if self.depth > self.config.max_depth {
            Err(ChunkError::NestingTooDeep {
                limit: self.config.max_depth,
            })
        } else {
            self.read_proto_body(parent_source)
        };
        self.depth -= 1;
        result
    }

    fn read_proto_body(&mut self, parent_source: &str) -> Result<Prototype> {
        let start = self.pos;
        let mut source = self.read_name()?;
        if source.is_empty() {
            source = parent_source.to_owned();
        }
        let line_defined = self.read_u32()?;
        let last_line_defined = self.read_u32()?;
        let num_params = self.read_byte()?;
        let is_vararg = self.read_byte()?;
        let max_stack_size = self.read_byte()?;
        let code = self.read_code()?;
        let constants = self.read_constants()?;
        let upvalues = self.read_upvalues()?;
        let protos = self.read_protos(&source)?;
        let line_info = self.read_line_info()?;
        if !line_info.is_empty() && line_info.len() != code.len() {
            return Err(ChunkError::LineInfoMismatch {
                code: code.len(),
                line_info: line_info.len(),
            });
        }
        let loc_vars = self.read_loc_vars()?;
        let upvalue_names = self.read_upvalue_names()?;

        trace!(
            target: TRACE_TARGET,
            source = %source,
            line = line_defined,
            depth = self.depth,
            offset = start,
            code = code.len(),
            constants = constants.len(),
            protos = protos.len(),
            "decoded prototype"
        );

        Ok(Prototype {
            source,
            line_defined,
            last_line_defined,
            num_params,
            is_vararg,
            max_stack_size,
            code,
            constants,
            upvalues,
            protos,
            line_info,
            loc_vars,
            upvalue_names,
        })
    }

    fn read_code(&mut self) -> Result<Vec<u32>> {
        let n = self.read_count(4, "code")?;
        (0..n).map(|_| self.read_u32()).collect()
    }

    fn read_constant(&mut self) -> Result<Val> {
        let offset = self.pos;
        let tag = self.read_byte()?;
        Ok(match tag {
            TAG_NIL => Val::Nil,
            TAG_BOOLEAN => Val::Bool(self.read_byte()? != 0),
            TAG_INTEGER => Val::Int(self.read_lua_integer()?),
            TAG_NUMBER => Val::Float(self.read_lua_number()?),
            TAG_SHORT_STR | TAG_LONG_STR => Val::Str(self.read_string()?),
            other => return Err(ChunkError::UnknownConstantTag { tag: other, offset }),
        })
    }

    fn read_constants(&mut self) -> Result<Vec<Val>> {
        let n = self.read_count(1, "constants")?;
        (0..n).map(|_| self.read_constant()).collect()
    }

    fn read_upvalues(&mut self) -> Result<Vec<Upvalue>> {
        let n = self.read_count(2, "upvalues")?;
        (0..n)
            .map(|_| -> Result<Upvalue> {
                Ok(Upvalue {
                    instack: self.read_byte()?,
                    idx: self.read_byte()?,
                })
            })
            .collect()
    }

    fn read_protos(&mut self, parent_source: &str) -> Result<Vec<Prototype>> {
        let n = self.read_count(MIN_PROTO_SIZE, "prototypes")?;
        (0..n).map(|_| self.read_proto(parent_source)).collect()
    }

    fn read_line_info(&mut self) -> Result<Vec<u32>> {
        let n = self.read_count(4, "line info")?;
        (0..n).map(|_| self.read_u32()).collect()
    }

    fn read_loc_vars(&mut self) -> Result<Vec<LocVar>> {
        let n = self.read_count(MIN_LOCVAR_SIZE, "local variables")?;
        (0..n)
            .map(|_| -> Result<LocVar> {
                Ok(LocVar {
                    name: self.read_name()?,
                    start_pc: self.read_u32()?,
                    end_pc: self.read_u32()?,
                })
            })
            .collect()
    }

    fn read_upvalue_names(&mut self) -> Result<Vec<String>> {
        let n = self.read_count(1, "upvalue names")?;
        (0..n).map(|_| self.read_name()).collect()
    }
}
