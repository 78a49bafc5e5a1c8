use super::*;
use crate::val::LuaString;
use crate::vm::{Instruction, OpCode, rk_as_k};

/// `luac -o hello.luac hello.lua` for `print("hello")`, written out by hand.
fn hello_chunk() -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"\x1bLua");
    b.push(0x53);
    b.push(0x00);
    b.extend_from_slice(b"\x19\x93\r\n\x1a\n");
    b.extend_from_slice(&[4, 8, 4, 8, 8]);
    b.extend_from_slice(&[0x78, 0x56, 0, 0, 0, 0, 0, 0]);
    b.extend_from_slice(&[0, 0, 0, 0, 0, 0x28, 0x77, 0x40]);
    // main closure upvalues
    b.push(1);
    b.push(11);
    b.extend_from_slice(b"@hello.lua");
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&[0, 1, 2]);
    b.extend_from_slice(&4u32.to_le_bytes());
    for word in [0x0040_0006u32, 0x0000_4041, 0x0100_4024, 0x0080_0026] {
        b.extend_from_slice(&word.to_le_bytes());
    }
    b.extend_from_slice(&2u32.to_le_bytes());
    b.extend_from_slice(&[0x04, 6]);
    b.extend_from_slice(b"print");
    b.extend_from_slice(&[0x04, 6]);
    b.extend_from_slice(b"hello");
    b.extend_from_slice(&1u32.to_le_bytes());
    b.extend_from_slice(&[1, 0]);
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&4u32.to_le_bytes());
    for _ in 0..4 {
        b.extend_from_slice(&1u32.to_le_bytes());
    }
    b.extend_from_slice(&0u32.to_le_bytes());
    b.extend_from_slice(&1u32.to_le_bytes());
    b.push(5);
    b.extend_from_slice(b"_ENV");
    b
}

fn leaf(source: &str, line: u32) -> Prototype {
    Prototype {
        source: source.to_owned(),
        line_defined: line,
        last_line_defined: line + 2,
        num_params: 2,
        max_stack_size: 3,
        code: vec![
            Instruction::abc(OpCode::Add, 2, 0, 1).raw(),
            Instruction::abc(OpCode::Return, 2, 2, 0).raw(),
        ],
        line_info: vec![line + 1, line + 1],
        loc_vars: vec![
            LocVar {
                name: "a".into(),
                start_pc: 0,
                end_pc: 2,
            },
            LocVar {
                name: "b".into(),
                start_pc: 0,
                end_pc: 2,
            },
        ],
        ..Prototype::default()
    }
}

fn nested_chunk() -> Chunk {
    let mut inner = leaf("@nested.lua", 4);
    inner.protos.push(leaf("@nested.lua", 5));
    inner.protos.push(leaf("@other.lua", 9));
    let main = Prototype {
        source: "@nested.lua".into(),
        is_vararg: 1,
        max_stack_size: 4,
        code: vec![
            Instruction::abx(OpCode::Closure, 0, 0).raw(),
            Instruction::abx(OpCode::LoadK, 1, 0).raw(),
            Instruction::asbx(OpCode::Jmp, 0, -2).raw(),
            Instruction::abc(OpCode::Return, 0, 1, 0).raw(),
        ],
        constants: vec![
            Val::Nil,
            Val::Bool(false),
            Val::Int(-7),
            Val::Float(0.5),
            Val::from("short"),
            Val::Str(LuaString::from(vec![b'L'; 300])),
        ],
        upvalues: vec![Upvalue { instack: 1, idx: 0 }],
        protos: vec![inner],
        line_info: vec![1, 2, 3, 3],
        upvalue_names: vec!["_ENV".into()],
        ..Prototype::default()
    };
    Chunk { upvalue_count: 1, main }
}

#[test]
fn loads_reference_hello_chunk() {
    let chunk = Chunk::load(&hello_chunk()).expect("load");
    assert_eq!(chunk.upvalue_count, 1);
    let main = &chunk.main;
    assert_eq!(main.source, "@hello.lua");
    assert_eq!((main.line_defined, main.last_line_defined), (0, 0));
    assert_eq!((main.num_params, main.is_vararg, main.max_stack_size), (0, 1, 2));
    assert_eq!(main.code.len(), 4);
    assert_eq!(main.constants, vec![Val::from("print"), Val::from("hello")]);
    assert_eq!(main.upvalues, vec![Upvalue { instack: 1, idx: 0 }]);
    assert!(main.upvalues[0].is_stack_local());
    assert!(main.protos.is_empty());
    assert_eq!(main.line_info, vec![1, 1, 1, 1]);
    assert!(main.loc_vars.is_empty());
    assert_eq!(main.upvalue_names, vec!["_ENV".to_string()]);

    let ops: Vec<_> = main.instructions().filter_map(Instruction::op).collect();
    assert_eq!(ops, vec![OpCode::GetTabUp, OpCode::LoadK, OpCode::Call, OpCode::Return]);
    assert_eq!(
        main.instruction(0),
        Some(Instruction::abc(OpCode::GetTabUp, 0, 0, rk_as_k(0)))
    );
    assert_eq!(main.instruction(2).map(Instruction::abc_fields), Some((0, 2, 1)));
    assert_eq!(main.instruction(4), None);
}

#[test]
fn dump_reproduces_reference_bytes() {
    let bytes = hello_chunk();
    let chunk = Chunk::load(&bytes).expect("load");
    assert_eq!(chunk.dump(false), bytes);
}

#[test]
fn nested_chunk_round_trips() {
    let chunk = nested_chunk();
    let bytes = dump(&chunk, false);
    let loaded = Chunk::load(&bytes).expect("load");
    assert_eq!(loaded, chunk);
    assert_eq!(loaded.main.count_protos(), 4);
    assert_eq!(loaded.main.protos[0].protos[1].source, "@other.lua");
}

#[test]
fn nested_sources_are_inherited() {
    let mut chunk = nested_chunk();
    // Children sharing the parent's source are written with an absent name.
    let shared = dump(&chunk, false);
    chunk.main.protos[0].protos[1].source = chunk.main.source.clone();
    let all_shared = dump(&chunk, false);
    assert!(all_shared.len() < shared.len());

    let loaded = Chunk::load(&all_shared).expect("load");
    let inner = &loaded.main.protos[0];
    assert_eq!(inner.source, "@nested.lua");
    assert!(inner.protos.iter().all(|p| p.source == "@nested.lua"));
}

#[test]
fn stripped_chunk_drops_debug_info() {
    let chunk = nested_chunk();
    let loaded = Chunk::load(&dump(&chunk, true)).expect("load stripped");
    let main = &loaded.main;
    assert_eq!(main.source, "");
    assert!(main.line_info.is_empty());
    assert!(main.upvalue_names.is_empty());
    assert_eq!(main.code, chunk.main.code);
    assert_eq!(main.constants, chunk.main.constants);
    let inner = &main.protos[0];
    assert!(inner.loc_vars.is_empty());
    assert_eq!(inner.source, "");
    assert_eq!(inner.line_at(0), None);
}

#[test]
fn every_single_byte_header_change_is_rejected() {
    let bytes = hello_chunk();
    for i in 0..HEADER_SIZE {
        for delta in [0x01u8, 0x80] {
            let mut corrupted = bytes.clone();
            corrupted[i] ^= delta;
            let err = Chunk::load(&corrupted).expect_err("corrupted header must not load");
            assert!(err.is_header_error(), "byte {} -> {:?}", i, err);
        }
    }
}

#[test]
fn header_errors_name_the_field() {
    let bytes = hello_chunk();

    let mut b = bytes.clone();
    b[0] = b'#';
    assert_eq!(undump(&b), Err(ChunkError::NotAChunk));

    let mut b = bytes.clone();
    b[4] = 0x52;
    assert_eq!(undump(&b), Err(ChunkError::VersionMismatch { found: 0x52 }));

    let mut b = bytes.clone();
    b[5] = 1;
    assert_eq!(undump(&b), Err(ChunkError::FormatMismatch { found: 1 }));

    let mut b = bytes.clone();
    b[8] = b'\n';
    assert_eq!(undump(&b), Err(ChunkError::Corrupted));

    let mut b = bytes.clone();
    b[14] = 8;
    assert_eq!(
        undump(&b),
        Err(ChunkError::SizeMismatch {
            what: "Instruction",
            expected: 4,
            found: 8
        })
    );

    let mut b = bytes;
    b[12] = 8;
    let err = undump(&b).expect_err("int size");
    assert_eq!(err.to_string(), "int size mismatch (found 8, expected 4)");
}

#[test]
fn byte_swapped_float_sentinel_is_an_endianness_error() {
    let mut bytes = hello_chunk();
    let float_at = HEADER_SIZE - 8;
    bytes[float_at..HEADER_SIZE].reverse();
    assert_eq!(Chunk::load(&bytes), Err(ChunkError::EndiannessMismatch));
}

#[test]
fn big_endian_integer_sentinel_is_an_endianness_error() {
    let mut bytes = hello_chunk();
    let int_at = HEADER_SIZE - 16;
    bytes[int_at..int_at + 8].reverse();
    assert_eq!(Chunk::load(&bytes), Err(ChunkError::EndiannessMismatch));
}

#[test]
fn other_float_sentinels_are_format_errors() {
    let mut bytes = hello_chunk();
    let float_at = HEADER_SIZE - 8;
    bytes[float_at..HEADER_SIZE].copy_from_slice(&370.25f64.to_le_bytes());
    assert_eq!(
        Chunk::load(&bytes),
        Err(ChunkError::FloatFormatMismatch { found: 370.25 })
    );
}

#[test]
fn every_truncation_is_an_error() {
    let bytes = dump(&nested_chunk(), false);
    for len in 0..bytes.len() {
        assert!(Chunk::load(&bytes[..len]).is_err(), "prefix of {} bytes loaded", len);
    }
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = hello_chunk();
    bytes.push(0);
    assert_eq!(Chunk::load(&bytes), Err(ChunkError::TrailingBytes { count: 1 }));
}

#[test]
fn unknown_constant_tag_aborts_load() {
    let mut bytes = hello_chunk();
    // First constant tag follows header, upvalue byte, source, lines, flags
    // and the four-word code array.
    let tag_at = HEADER_SIZE + 1 + 11 + 8 + 3 + 4 + 16 + 4;
    assert_eq!(bytes[tag_at], TAG_SHORT_STR);
    bytes[tag_at] = 0x09;
    assert_eq!(
        Chunk::load(&bytes),
        Err(ChunkError::UnknownConstantTag {
            tag: 0x09,
            offset: tag_at
        })
    );
}

fn chain(depth: usize) -> Chunk {
    let mut proto = leaf("@deep.lua", 1);
    for line in 1..depth {
        let mut parent = leaf("@deep.lua", line as u32 + 1);
        parent.protos.push(proto);
        proto = parent;
    }
    proto.line_defined = 0;
    Chunk {
        upvalue_count: 0,
        main: proto,
    }
}

#[test]
fn nesting_depth_is_bounded() {
    let bytes = dump(&chain(5), false);
    assert!(Chunk::load_with(&bytes, LoadConfig::default().with_max_depth(5)).is_ok());
    assert_eq!(
        Chunk::load_with(&bytes, LoadConfig::default().with_max_depth(4)),
        Err(ChunkError::NestingTooDeep { limit: 4 })
    );
}

#[test]
fn line_info_must_cover_code() {
    let mut chunk = nested_chunk();
    chunk.main.line_info.pop();
    assert_eq!(
        Chunk::load(&dump(&chunk, false)),
        Err(ChunkError::LineInfoMismatch { code: 4, line_info: 3 })
    );
}

#[test]
fn undump_named_adds_context() {
    let err = undump_named(b"not lua", "script.luac").expect_err("must fail");
    let rendered = format!("{:#}", err);
    assert!(rendered.starts_with("failed to load chunk `script.luac`"), "{}", rendered);
    assert_eq!(err.downcast_ref::<ChunkError>(), Some(&ChunkError::NotAChunk));
}

#[test]
fn prototypes_export_as_json() {
    let proto = undump(&hello_chunk()).expect("load");
    let json: serde_json::Value = serde_json::from_str(&proto.to_json().expect("json")).expect("parse");
    assert_eq!(json["source"], "@hello.lua");
    assert_eq!(json["constants"][1], "hello");
    assert_eq!(json["upvalues"][0]["instack"], 1);
    assert_eq!(json["code"].as_array().map(Vec::len), Some(4));
}

#[test]
fn load_config_deserializes_with_defaults() {
    let cfg: LoadConfig = serde_json::from_str("{}").expect("empty config");
    assert_eq!(cfg, LoadConfig::default());
    assert_eq!(cfg.max_depth, DEFAULT_MAX_DEPTH);
    let cfg: LoadConfig = serde_json::from_str(r#"{"max_depth": 3}"#).expect("config");
    assert_eq!(cfg.max_depth, 3);
}
