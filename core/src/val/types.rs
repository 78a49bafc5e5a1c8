use std::fmt;

use serde::Serialize;

/// Basic type classification, ordered the way the reference C API numbers
/// them (`LUA_TNONE` = -1 up to `LUA_TTHREAD` = 8).
///
/// `Table`, `Function`, `Userdata`, `LightUserdata` and `Thread` are reserved:
/// no [`Val`](super::Val) carries them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(i8)]
pub enum LuaType {
    None = -1,
    Nil = 0,
    Boolean = 1,
    LightUserdata = 2,
    Number = 3,
    String = 4,
    Table = 5,
    Function = 6,
    Userdata = 7,
    Thread = 8,
}

impl LuaType {
    pub const fn name(self) -> &'static str {
        match self {
            LuaType::None => "no value",
            LuaType::Nil => "nil",
            LuaType::Boolean => "boolean",
            LuaType::Number => "number",
            LuaType::String => "string",
            LuaType::Table => "table",
            LuaType::Function => "function",
            LuaType::Thread => "thread",
            LuaType::LightUserdata | LuaType::Userdata => "userdata",
        }
    }

    #[inline]
    pub const fn code(self) -> i8 {
        self as i8
    }
}

impl fmt::Display for LuaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
