//! `luac -l -l` style listing of a prototype tree.

use std::fmt::Write as _;

use crate::val::Val;

use super::Prototype;

/// Renders `proto` and every nested prototype, depth first.
pub fn listing(proto: &Prototype) -> String {
    let mut out = String::new();
    list_proto(&mut out, proto);
    out
}

fn list_proto(out: &mut String, f: &Prototype) {
    print_header(out, f);
    print_code(out, f);
    print_detail(out, f);
    for p in &f.protos {
        list_proto(out, p);
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn display_source(source: &str) -> &str {
    match source.as_bytes().first() {
        Some(b'@') | Some(b'=') => &source[1..],
        Some(0x1b) => "binary string",
        _ => "string",
    }
}

fn print_header(out: &mut String, f: &Prototype) {
    let kind = if f.is_main() { "main" } else { "function" };
    let _ = writeln!(
        out,
        "\n{} <{}:{},{}> ({} instruction{})",
        kind,
        display_source(&f.source),
        f.line_defined,
        f.last_line_defined,
        f.code.len(),
        plural(f.code.len())
    );
    let _ = writeln!(
        out,
        "{}{} param{}, {} slot{}, {} upvalue{}, {} local{}, {} constant{}, {} function{}",
        f.num_params,
        if f.has_varargs() { "+" } else { "" },
        plural(f.num_params as usize),
        f.max_stack_size,
        plural(f.max_stack_size as usize),
        f.upvalues.len(),
        plural(f.upvalues.len()),
        f.loc_vars.len(),
        plural(f.loc_vars.len()),
        f.constants.len(),
        plural(f.constants.len()),
        f.protos.len(),
        plural(f.protos.len()),
    );
}

fn print_code(out: &mut String, f: &Prototype) {
    for (pc, ins) in f.instructions().enumerate() {
        let line = f.line_at(pc).map_or_else(|| "-".to_owned(), |l| l.to_string());
        let _ = writeln!(out, "\t{}\t[{}]\t{}", pc + 1, line, ins);
    }
}

fn constant_repr(k: &Val) -> String {
    match k {
        Val::Str(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

fn print_detail(out: &mut String, f: &Prototype) {
    let _ = writeln!(out, "constants ({}):", f.constants.len());
    for (i, k) in f.constants.iter().enumerate() {
        let _ = writeln!(out, "\t{}\t{}", i + 1, constant_repr(k));
    }

    let _ = writeln!(out, "locals ({}):", f.loc_vars.len());
    for (i, var) in f.loc_vars.iter().enumerate() {
        let _ = writeln!(out, "\t{}\t{}\t{}\t{}", i, var.name, var.start_pc + 1, var.end_pc + 1);
    }

    let _ = writeln!(out, "upvalues ({}):", f.upvalues.len());
    for (i, uv) in f.upvalues.iter().enumerate() {
        let name = f.upvalue_names.get(i).map_or("-", String::as_str);
        let _ = writeln!(out, "\t{}\t{}\t{}\t{}", i, name, uv.instack, uv.idx);
    }
}
