//! Runtime value model.
//!
//! `Val` is the closed set of scalar payloads a stack slot can hold. Kinds the
//! loader never produces (tables, functions, userdata, threads) only exist as
//! [`LuaType`] classifications for now.

use std::fmt;

use serde::{Serialize, Serializer};

mod convert;
mod string;
mod types;

pub use convert::{format_float, format_integer, float_to_integer};
pub use string::LuaString;
pub use types::LuaType;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Val {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(LuaString),
}

impl Val {
    #[inline]
    pub fn type_of(&self) -> LuaType {
        match self {
            Val::Nil => LuaType::Nil,
            Val::Bool(_) => LuaType::Boolean,
            Val::Int(_) | Val::Float(_) => LuaType::Number,
            Val::Str(_) => LuaType::String,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Val::Nil)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Val::Int(_) | Val::Float(_))
    }

    /// Only `nil` and `false` are falsy.
    #[inline]
    pub fn to_boolean(&self) -> bool {
        !matches!(self, Val::Nil | Val::Bool(false))
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Nil => f.write_str("nil"),
            Val::Bool(b) => write!(f, "{}", b),
            Val::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Val::Float(x) => f.write_str(&format_float(*x)),
            Val::Str(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Val {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Val::Nil => serializer.serialize_unit(),
            Val::Bool(b) => serializer.serialize_bool(*b),
            Val::Int(i) => serializer.serialize_i64(*i),
            Val::Float(f) => serializer.serialize_f64(*f),
            Val::Str(s) => s.serialize(serializer),
        }
    }
}
