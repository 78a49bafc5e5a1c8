//! 32-bit instruction word codec.
//!
//! Field layout, low bits first:
//!
//! ```text
//!  iABC   | B:9 | C:9 | A:8 | op:6 |
//!  iABx   |   Bx:18   | A:8 | op:6 |
//!  iAsBx  |  sBx:18   | A:8 | op:6 |
//!  iAx    |        Ax:26    | op:6 |
//! ```
//!
//! `sBx` is stored in excess-K form with `K = MAXARG_SBX`.

use std::fmt;

use serde::Serialize;

use super::opcodes::{OpArgMode, OpCode, OpInfo, OpMode};

pub const SIZE_OP: u32 = 6;
pub const SIZE_A: u32 = 8;
pub const SIZE_B: u32 = 9;
pub const SIZE_C: u32 = 9;
pub const SIZE_BX: u32 = SIZE_B + SIZE_C;
pub const SIZE_AX: u32 = SIZE_A + SIZE_BX;

pub const POS_OP: u32 = 0;
pub const POS_A: u32 = POS_OP + SIZE_OP;
pub const POS_C: u32 = POS_A + SIZE_A;
pub const POS_B: u32 = POS_C + SIZE_C;
pub const POS_BX: u32 = POS_C;
pub const POS_AX: u32 = POS_A;

pub const MAXARG_A: u32 = (1 << SIZE_A) - 1;
pub const MAXARG_B: u32 = (1 << SIZE_B) - 1;
pub const MAXARG_C: u32 = (1 << SIZE_C) - 1;
pub const MAXARG_BX: u32 = (1 << SIZE_BX) - 1;
pub const MAXARG_SBX: i32 = (MAXARG_BX >> 1) as i32;
pub const MAXARG_AX: u32 = (1 << SIZE_AX) - 1;

const MASK_OP: u32 = (1 << SIZE_OP) - 1;

/// Marks a B/C operand as a constant index rather than a register.
pub const BITRK: u32 = 1 << (SIZE_B - 1);
pub const MAXINDEXRK: u32 = BITRK - 1;

#[inline]
pub const fn is_k(x: u32) -> bool {
    x & BITRK != 0
}

#[inline]
pub const fn index_k(x: u32) -> u32 {
    x & !BITRK
}

#[inline]
pub const fn rk_as_k(idx: u32) -> u32 {
    idx | BITRK
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Instruction(pub u32);

impl Instruction {
    pub const fn abc(op: OpCode, a: u32, b: u32, c: u32) -> Self {
        Self(
            ((op as u32) << POS_OP)
                | ((a & MAXARG_A) << POS_A)
                | ((b & MAXARG_B) << POS_B)
                | ((c & MAXARG_C) << POS_C),
        )
    }

    pub const fn abx(op: OpCode, a: u32, bx: u32) -> Self {
        Self(((op as u32) << POS_OP) | ((a & MAXARG_A) << POS_A) | ((bx & MAXARG_BX) << POS_BX))
    }

    /// `sbx` must lie in `-MAXARG_SBX..=MAXARG_SBX + 1`.
    pub const fn asbx(op: OpCode, a: u32, sbx: i32) -> Self {
        Self::abx(op, a, (sbx + MAXARG_SBX) as u32)
    }

    pub const fn ax(op: OpCode, ax: u32) -> Self {
        Self(((op as u32) << POS_OP) | ((ax & MAXARG_AX) << POS_AX))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Raw 6-bit opcode field; may name no known opcode.
    #[inline]
    pub const fn opcode(self) -> u8 {
        ((self.0 >> POS_OP) & MASK_OP) as u8
    }

    #[inline]
    pub const fn a(self) -> u32 {
        (self.0 >> POS_A) & MAXARG_A
    }

    #[inline]
    pub const fn b(self) -> u32 {
        (self.0 >> POS_B) & MAXARG_B
    }

    #[inline]
    pub const fn c(self) -> u32 {
        (self.0 >> POS_C) & MAXARG_C
    }

    #[inline]
    pub const fn bx(self) -> u32 {
        self.0 >> POS_BX
    }

    #[inline]
    pub const fn sbx(self) -> i32 {
        self.bx() as i32 - MAXARG_SBX
    }

    #[inline]
    pub const fn abc_fields(self) -> (u32, u32, u32) {
        (self.a(), self.b(), self.c())
    }

    #[inline]
    pub const fn abx_fields(self) -> (u32, u32) {
        (self.a(), self.bx())
    }

    #[inline]
    pub const fn asbx_fields(self) -> (u32, i32) {
        (self.a(), self.sbx())
    }

    #[inline]
    pub const fn ax_field(self) -> u32 {
        self.0 >> POS_AX
    }

    #[inline]
    pub fn op(self) -> Option<OpCode> {
        OpCode::from_u8(self.opcode())
    }

    #[inline]
    pub fn info(self) -> Option<&'static OpInfo> {
        self.op().map(OpCode::info)
    }

    #[inline]
    pub fn op_name(self) -> Option<&'static str> {
        self.info().map(|i| i.name)
    }

    #[inline]
    pub fn op_mode(self) -> Option<OpMode> {
        self.info().map(|i| i.mode)
    }

    #[inline]
    pub fn b_mode(self) -> Option<OpArgMode> {
        self.info().map(|i| i.b_mode)
    }

    #[inline]
    pub fn c_mode(self) -> Option<OpArgMode> {
        self.info().map(|i| i.c_mode)
    }

    /// Operands as `luac -l` prints them: constant references show up as
    /// `-1 - index`, unused operands are omitted.
    pub fn operands(self) -> Vec<i64> {
        let Some(info) = self.info() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(3);
        match info.mode {
            OpMode::IABC => {
                out.push(self.a() as i64);
                if info.b_mode != OpArgMode::N {
                    out.push(rk_operand(self.b()));
                }
                if info.c_mode != OpArgMode::N {
                    out.push(rk_operand(self.c()));
                }
            }
            OpMode::IABx => {
                out.push(self.a() as i64);
                match info.b_mode {
                    OpArgMode::K => out.push(-1 - self.bx() as i64),
                    OpArgMode::U => out.push(self.bx() as i64),
                    _ => {}
                }
            }
            OpMode::IAsBx => {
                out.push(self.a() as i64);
                out.push(self.sbx() as i64);
            }
            OpMode::IAx => out.push(-1 - self.ax_field() as i64),
        }
        out
    }
}

#[inline]
fn rk_operand(x: u32) -> i64 {
    if is_k(x) { -1 - index_k(x) as i64 } else { x as i64 }
}

impl From<u32> for Instruction {
    #[inline]
    fn from(word: u32) -> Self {
        Self(word)
    }
}

impl From<Instruction> for u32 {
    #[inline]
    fn from(ins: Instruction) -> Self {
        ins.0
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instruction({:#010x} {})", self.0, self)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(name) = self.op_name() else {
            return write!(f, "<bad opcode {}>", self.opcode());
        };
        write!(f, "{:<9}", name)?;
        for (i, operand) in self.operands().iter().enumerate() {
            if i == 0 {
                write!(f, "\t{}", operand)?;
            } else {
                write!(f, " {}", operand)?;
            }
        }
        Ok(())
    }
}
