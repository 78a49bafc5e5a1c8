//! Chunk serialisation, the inverse of [`Reader`](super::Reader).

use crate::val::Val;

use super::{
    CINT_SIZE, CSIZET_SIZE, Chunk, INSTRUCTION_SIZE, LUA_INTEGER_SIZE, LUA_NUMBER_SIZE, LUA_SIGNATURE, LUAC_DATA,
    LUAC_FORMAT, LUAC_INT, LUAC_NUM, LUAC_VERSION, LUAI_MAXSHORTLEN, Prototype, TAG_BOOLEAN, TAG_INTEGER,
    TAG_LONG_STR, TAG_NIL, TAG_NUMBER, TAG_SHORT_STR,
};

/// Serialises `chunk` in the reference binary format.
///
/// Nested prototypes sharing their parent's source get an absent source, as
/// the reference dumper does. With `strip` set, source names, line info,
/// local variables and upvalue names are left out.
pub fn dump(chunk: &Chunk, strip: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    write_header(&mut out);
    write_u8(&mut out, chunk.upvalue_count);
    write_function(&mut out, &chunk.main, "", strip);
    out
}

pub(crate) fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(LUA_SIGNATURE);
    write_u8(out, LUAC_VERSION);
    write_u8(out, LUAC_FORMAT);
    out.extend_from_slice(LUAC_DATA);
    write_u8(out, CINT_SIZE);
    write_u8(out, CSIZET_SIZE);
    write_u8(out, INSTRUCTION_SIZE);
    write_u8(out, LUA_INTEGER_SIZE);
    write_u8(out, LUA_NUMBER_SIZE);
    write_i64(out, LUAC_INT);
    write_f64(out, LUAC_NUM);
}

fn write_function(out: &mut Vec<u8>, f: &Prototype, parent_source: &str, strip: bool) {
    if strip || f.source == parent_source {
        write_string(out, None);
    } else {
        write_string(out, Some(f.source.as_bytes()));
    }
    write_u32(out, f.line_defined);
    write_u32(out, f.last_line_defined);
    write_u8(out, f.num_params);
    write_u8(out, f.is_vararg);
    write_u8(out, f.max_stack_size);

    write_count(out, f.code.len());
    for word in &f.code {
        write_u32(out, *word);
    }

    write_count(out, f.constants.len());
    for k in &f.constants {
        write_constant(out, k);
    }

    write_count(out, f.upvalues.len());
    for uv in &f.upvalues {
        write_u8(out, uv.instack);
        write_u8(out, uv.idx);
    }

    write_count(out, f.protos.len());
    for p in &f.protos {
        write_function(out, p, &f.source, strip);
    }

    if strip {
        // line info, local variables, upvalue names
        for _ in 0..3 {
            write_count(out, 0);
        }
        return;
    }

    write_count(out, f.line_info.len());
    for line in &f.line_info {
        write_u32(out, *line);
    }

    write_count(out, f.loc_vars.len());
    for var in &f.loc_vars {
        write_string(out, Some(var.name.as_bytes()));
        write_u32(out, var.start_pc);
        write_u32(out, var.end_pc);
    }

    write_count(out, f.upvalue_names.len());
    for name in &f.upvalue_names {
        write_string(out, Some(name.as_bytes()));
    }
}

fn write_constant(out: &mut Vec<u8>, k: &Val) {
    match k {
        Val::Nil => write_u8(out, TAG_NIL),
        Val::Bool(b) => {
            write_u8(out, TAG_BOOLEAN);
            write_u8(out, u8::from(*b));
        }
        Val::Int(i) => {
            write_u8(out, TAG_INTEGER);
            write_i64(out, *i);
        }
        Val::Float(f) => {
            write_u8(out, TAG_NUMBER);
            write_f64(out, *f);
        }
        Val::Str(s) => {
            let tag = if s.len() <= LUAI_MAXSHORTLEN { TAG_SHORT_STR } else { TAG_LONG_STR };
            write_u8(out, tag);
            write_string(out, Some(s.as_bytes()));
        }
    }
}

fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Counts are `int` in the format; larger tables cannot come from a
/// reference compiler.
fn write_count(out: &mut Vec<u8>, len: usize) {
    debug_assert!(len <= u32::MAX as usize);
    write_u32(out, len as u32);
}

fn write_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_string(out: &mut Vec<u8>, bytes: Option<&[u8]>) {
    let Some(bytes) = bytes else {
        write_u8(out, 0);
        return;
    };
    let size = bytes.len() as u64 + 1;
    if size < 0xFF {
        write_u8(out, size as u8);
    } else {
        write_u8(out, 0xFF);
        out.extend_from_slice(&size.to_le_bytes());
    }
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::HEADER_SIZE;

    #[test]
    fn header_has_expected_length() {
        let mut out = Vec::new();
        write_header(&mut out);
        assert_eq!(out.len(), HEADER_SIZE);
        assert_eq!(&out[..4], b"\x1bLua");
        assert_eq!(out[4], 0x53);
    }

    #[test]
    fn string_prefixes() {
        let mut out = Vec::new();
        write_string(&mut out, None);
        write_string(&mut out, Some(b""));
        write_string(&mut out, Some(b"ab"));
        assert_eq!(out, vec![0x00, 0x01, 0x03, b'a', b'b']);

        let long = vec![b'z'; 254];
        let mut out = Vec::new();
        write_string(&mut out, Some(&long));
        assert_eq!(out[0], 0xFF);
        assert_eq!(&out[1..9], &255u64.to_le_bytes());
        assert_eq!(out.len(), 1 + 8 + 254);
    }
}
