use std::fmt;

use serde::Serialize;

/// Operand layout of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpMode {
    IABC,
    IABx,
    IAsBx,
    IAx,
}

/// How the dispatch loop should interpret a B or C operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpArgMode {
    /// Operand unused.
    N,
    /// Operand used as a plain number.
    U,
    /// Register index or jump offset.
    R,
    /// Constant index or register/constant (RK).
    K,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpInfo {
    pub test_flag: bool,
    pub set_a_flag: bool,
    pub b_mode: OpArgMode,
    pub c_mode: OpArgMode,
    pub mode: OpMode,
    pub name: &'static str,
}

const fn info(
    test_flag: bool,
    set_a_flag: bool,
    b_mode: OpArgMode,
    c_mode: OpArgMode,
    mode: OpMode,
    name: &'static str,
) -> OpInfo {
    OpInfo {
        test_flag,
        set_a_flag,
        b_mode,
        c_mode,
        mode,
        name,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum OpCode {
    Move = 0,
    LoadK,
    LoadKx,
    LoadBool,
    LoadNil,
    GetUpval,
    GetTabUp,
    GetTable,
    SetTabUp,
    SetUpval,
    SetTable,
    NewTable,
    SelfOp,
    Add,
    Sub,
    Mul,
    Mod,
    Pow,
    Div,
    IDiv,
    BAnd,
    BOr,
    BXor,
    Shl,
    Shr,
    Unm,
    BNot,
    Not,
    Len,
    Concat,
    Jmp,
    Eq,
    Lt,
    Le,
    Test,
    TestSet,
    Call,
    TailCall,
    Return,
    ForLoop,
    ForPrep,
    TForCall,
    TForLoop,
    SetList,
    Closure,
    VarArg,
    ExtraArg,
}

pub const NUM_OPCODES: usize = OpCode::ExtraArg as usize + 1;

use OpArgMode::{K, N, R, U};
use OpMode::{IABC, IABx, IAsBx, IAx};

#[rustfmt::skip]
static OPCODE_TABLE: [OpInfo; NUM_OPCODES] = [
    //   T      A      B  C  mode   name
    info(false, true,  R, N, IABC,  "MOVE"),
    info(false, true,  K, N, IABx,  "LOADK"),
    info(false, true,  N, N, IABx,  "LOADKX"),
    info(false, true,  U, U, IABC,  "LOADBOOL"),
    info(false, true,  U, N, IABC,  "LOADNIL"),
    info(false, true,  U, N, IABC,  "GETUPVAL"),
    info(false, true,  U, K, IABC,  "GETTABUP"),
    info(false, true,  R, K, IABC,  "GETTABLE"),
    info(false, false, K, K, IABC,  "SETTABUP"),
    info(false, false, U, N, IABC,  "SETUPVAL"),
    info(false, false, K, K, IABC,  "SETTABLE"),
    info(false, true,  U, U, IABC,  "NEWTABLE"),
    info(false, true,  R, K, IABC,  "SELF"),
    info(false, true,  K, K, IABC,  "ADD"),
    info(false, true,  K, K, IABC,  "SUB"),
    info(false, true,  K, K, IABC,  "MUL"),
    info(false, true,  K, K, IABC,  "MOD"),
    info(false, true,  K, K, IABC,  "POW"),
    info(false, true,  K, K, IABC,  "DIV"),
    info(false, true,  K, K, IABC,  "IDIV"),
    info(false, true,  K, K, IABC,  "BAND"),
    info(false, true,  K, K, IABC,  "BOR"),
    info(false, true,  K, K, IABC,  "BXOR"),
    info(false, true,  K, K, IABC,  "SHL"),
    info(false, true,  K, K, IABC,  "SHR"),
    info(false, true,  R, N, IABC,  "UNM"),
    info(false, true,  R, N, IABC,  "BNOT"),
    info(false, true,  R, N, IABC,  "NOT"),
    info(false, true,  R, N, IABC,  "LEN"),
    info(false, true,  R, R, IABC,  "CONCAT"),
    info(false, false, R, N, IAsBx, "JMP"),
    info(true,  false, K, K, IABC,  "EQ"),
    info(true,  false, K, K, IABC,  "LT"),
    info(true,  false, K, K, IABC,  "LE"),
    info(true,  false, N, U, IABC,  "TEST"),
    info(true,  true,  R, U, IABC,  "TESTSET"),
    info(false, true,  U, U, IABC,  "CALL"),
    info(false, true,  U, U, IABC,  "TAILCALL"),
    info(false, false, U, N, IABC,  "RETURN"),
    info(false, true,  R, N, IAsBx, "FORLOOP"),
    info(false, true,  R, N, IAsBx, "FORPREP"),
    info(false, false, N, U, IABC,  "TFORCALL"),
    info(false, true,  R, N, IAsBx, "TFORLOOP"),
    info(false, false, U, U, IABC,  "SETLIST"),
    info(false, true,  U, N, IABx,  "CLOSURE"),
    info(false, true,  U, N, IABC,  "VARARG"),
    info(false, false, U, U, IAx,   "EXTRAARG"),
];

#[rustfmt::skip]
static ALL_OPCODES: [OpCode; NUM_OPCODES] = [
    OpCode::Move, OpCode::LoadK, OpCode::LoadKx, OpCode::LoadBool, OpCode::LoadNil,
    OpCode::GetUpval, OpCode::GetTabUp, OpCode::GetTable, OpCode::SetTabUp, OpCode::SetUpval,
    OpCode::SetTable, OpCode::NewTable, OpCode::SelfOp, OpCode::Add, OpCode::Sub,
    OpCode::Mul, OpCode::Mod, OpCode::Pow, OpCode::Div, OpCode::IDiv,
    OpCode::BAnd, OpCode::BOr, OpCode::BXor, OpCode::Shl, OpCode::Shr,
    OpCode::Unm, OpCode::BNot, OpCode::Not, OpCode::Len, OpCode::Concat,
    OpCode::Jmp, OpCode::Eq, OpCode::Lt, OpCode::Le, OpCode::Test,
    OpCode::TestSet, OpCode::Call, OpCode::TailCall, OpCode::Return, OpCode::ForLoop,
    OpCode::ForPrep, OpCode::TForCall, OpCode::TForLoop, OpCode::SetList, OpCode::Closure,
    OpCode::VarArg, OpCode::ExtraArg,
];

impl OpCode {
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        ALL_OPCODES.get(value as usize).copied()
    }

    #[inline]
    pub fn info(self) -> &'static OpInfo {
        &OPCODE_TABLE[self as usize]
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    #[inline]
    pub fn mode(self) -> OpMode {
        self.info().mode
    }

    pub fn all() -> &'static [OpCode] {
        &ALL_OPCODES
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
