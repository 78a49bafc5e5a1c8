use criterion::{Criterion, criterion_group, criterion_main};
use lunar_core::{
    chunk::{Chunk, LocVar, Prototype, Upvalue, listing},
    val::Val,
    vm::{Instruction, OpCode, rk_as_k},
};
use std::hint::black_box;

// A function body with a realistic mix of constants and debug info
fn body(line: u32, width: usize) -> Prototype {
    let mut code = Vec::with_capacity(width + 1);
    for i in 0..width {
        let op = if i % 2 == 0 {
            Instruction::abx(OpCode::LoadK, 0, (i % 16) as u32)
        } else {
            Instruction::abc(OpCode::Add, 1, 0, rk_as_k((i % 16) as u32))
        };
        code.push(op.raw());
    }
    code.push(Instruction::abc(OpCode::Return, 0, 1, 0).raw());

    let constants = (0..16)
        .map(|i| match i % 4 {
            0 => Val::Int(i),
            1 => Val::Float(i as f64 + 0.5),
            2 => Val::from(format!("k{}", i)),
            _ => Val::from("x".repeat(64)),
        })
        .collect();

    Prototype {
        source: "@bench.lua".into(),
        line_defined: line,
        last_line_defined: line + width as u32,
        num_params: 1,
        max_stack_size: 2,
        line_info: (0..code.len() as u32).map(|pc| line + pc).collect(),
        code,
        constants,
        upvalues: vec![Upvalue { instack: 1, idx: 0 }],
        loc_vars: vec![LocVar {
            name: "acc".into(),
            start_pc: 0,
            end_pc: width as u32,
        }],
        upvalue_names: vec!["_ENV".into()],
        ..Prototype::default()
    }
}

// Main function with `fanout` children, each with `fanout` grandchildren
fn build_chunk(fanout: usize, width: usize) -> Chunk {
    let mut main = body(0, width);
    main.is_vararg = 1;
    for i in 0..fanout {
        let mut child = body(10 * (i as u32 + 1), width);
        for j in 0..fanout {
            child.protos.push(body(1000 + j as u32, width));
        }
        main.protos.push(child);
    }
    Chunk {
        upvalue_count: 1,
        main,
    }
}

fn bench_load(c: &mut Criterion) {
    let chunk = build_chunk(8, 128);
    let bytes = chunk.dump(false);
    let stripped = chunk.dump(true);

    c.bench_function("chunk_load", |b| {
        b.iter(|| {
            let loaded = Chunk::load(black_box(&bytes)).unwrap();
            black_box(loaded);
        })
    });

    c.bench_function("chunk_load_stripped", |b| {
        b.iter(|| {
            let loaded = Chunk::load(black_box(&stripped)).unwrap();
            black_box(loaded);
        })
    });

    c.bench_function("chunk_dump", |b| {
        b.iter(|| black_box(chunk.dump(false)))
    });
}

fn bench_listing(c: &mut Criterion) {
    let chunk = build_chunk(4, 64);
    c.bench_function("chunk_listing", |b| {
        b.iter(|| black_box(listing(&chunk.main)))
    });
}

criterion_group!(benches, bench_load, bench_listing);
criterion_main!(benches);
