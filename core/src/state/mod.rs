//! Embedding-side view of a Lua execution context.
//!
//! [`LuaState`] owns one [`LuaStack`] and exposes the reference C API's stack
//! operations over it: introspection, pushes, in-place rearrangement and
//! value extraction. Indices follow the C API: `1..=top` from the bottom,
//! `-1..=-top` from the top.

use tracing::trace;

use crate::val::{LuaString, LuaType, Val};

mod config;
mod stack;

pub use config::{DEFAULT_STACK_SIZE, StateConfig};
pub use stack::{LuaStack, StackError};

pub type Result<T> = std::result::Result<T, StackError>;

#[derive(Debug, Clone)]
pub struct LuaState {
    stack: LuaStack,
}

impl Default for LuaState {
    fn default() -> Self {
        Self::new()
    }
}

impl LuaState {
    pub fn new() -> Self {
        Self::with_config(StateConfig::default())
    }

    pub fn with_config(config: StateConfig) -> Self {
        Self {
            stack: LuaStack::new(config.initial_stack_size),
        }
    }

    #[inline]
    pub fn stack(&self) -> &LuaStack {
        &self.stack
    }

    /* basic stack manipulation */

    #[inline]
    pub fn get_top(&self) -> i32 {
        self.stack.top() as i32
    }

    #[inline]
    pub fn abs_index(&self, idx: i32) -> i32 {
        self.stack.abs_index(idx)
    }

    /// Grows the stack so `n` more values fit. Always succeeds.
    pub fn check_stack(&mut self, n: usize) -> bool {
        self.stack.check(n);
        true
    }

    pub fn pop(&mut self, n: i32) -> Result<()> {
        self.set_top(-n - 1)
    }

    pub fn copy(&mut self, from_idx: i32, to_idx: i32) -> Result<()> {
        let val = self.stack.get(from_idx);
        self.stack.set(to_idx, val)
    }

    pub fn push_value(&mut self, idx: i32) -> Result<()> {
        let val = self.stack.get(idx);
        self.stack.push(val)
    }

    /// Moves the top value into `idx`, popping it.
    pub fn replace(&mut self, idx: i32) -> Result<()> {
        if self.stack.top() == 0 {
            return Err(StackError::Underflow);
        }
        let val = self.stack.get(-1);
        self.stack.set(idx, val)?;
        self.stack.pop().map(drop)
    }

    pub fn insert(&mut self, idx: i32) -> Result<()> {
        self.rotate(idx, 1)
    }

    pub fn remove(&mut self, idx: i32) -> Result<()> {
        self.rotate(idx, -1)?;
        self.pop(1)
    }

    /// Rotates `[idx, top]` by `n` positions toward the top (`n > 0`) or
    /// the bottom (`n < 0`).
    pub fn rotate(&mut self, idx: i32, n: i32) -> Result<()> {
        if !self.stack.is_valid(idx) {
            return Err(StackError::InvalidIndex(idx));
        }
        let t = self.stack.top() as i64 - 1;
        let p = self.stack.abs_index(idx) as i64 - 1;
        let n = n as i64;
        if n.abs() > t - p + 1 {
            return Err(StackError::InvalidIndex(idx));
        }
        let m = if n >= 0 { t - n } else { p - n - 1 };
        if m >= p {
            self.stack.reverse(p as usize, m as usize);
        }
        if m < t {
            self.stack.reverse((m + 1) as usize, t as usize);
        }
        self.stack.reverse(p as usize, t as usize);
        Ok(())
    }

    pub fn set_top(&mut self, idx: i32) -> Result<()> {
        let new_top = self.stack.abs_index(idx);
        if new_top < 0 {
            return Err(StackError::Underflow);
        }
        let top = self.stack.top() as i32;
        if new_top > top {
            let grow = (new_top - top) as usize;
            self.stack.check(grow);
            for _ in 0..grow {
                self.stack.push(Val::Nil)?;
            }
        } else {
            for _ in new_top..top {
                self.stack.pop()?;
            }
        }
        Ok(())
    }

    /* access functions (stack -> Rust) */

    #[inline]
    pub fn type_name(&self, tp: LuaType) -> &'static str {
        tp.name()
    }

    /// `LuaType::None` for an index outside the live stack.
    pub fn type_of(&self, idx: i32) -> LuaType {
        self.stack.get_ref(idx).map_or(LuaType::None, Val::type_of)
    }

    #[inline]
    pub fn is_none(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::None
    }

    #[inline]
    pub fn is_nil(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Nil
    }

    #[inline]
    pub fn is_none_or_nil(&self, idx: i32) -> bool {
        self.type_of(idx) <= LuaType::Nil
    }

    #[inline]
    pub fn is_boolean(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Boolean
    }

    #[inline]
    pub fn is_table(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Table
    }

    #[inline]
    pub fn is_function(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Function
    }

    #[inline]
    pub fn is_thread(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Thread
    }

    /// True for strings and for numbers, which convert to strings.
    pub fn is_string(&self, idx: i32) -> bool {
        matches!(self.type_of(idx), LuaType::String | LuaType::Number)
    }

    pub fn is_number(&self, idx: i32) -> bool {
        self.to_number_x(idx).is_some()
    }

    pub fn is_integer(&self, idx: i32) -> bool {
        matches!(self.stack.get_ref(idx), Some(Val::Int(_)))
    }

    pub fn to_boolean(&self, idx: i32) -> bool {
        self.stack.get_ref(idx).is_some_and(Val::to_boolean)
    }

    pub fn to_integer(&self, idx: i32) -> i64 {
        self.to_integer_x(idx).unwrap_or(0)
    }

    pub fn to_integer_x(&self, idx: i32) -> Option<i64> {
        self.stack.get_ref(idx).and_then(Val::to_integer)
    }

    pub fn to_number(&self, idx: i32) -> f64 {
        self.to_number_x(idx).unwrap_or(0.0)
    }

    pub fn to_number_x(&self, idx: i32) -> Option<f64> {
        self.stack.get_ref(idx).and_then(Val::to_number)
    }

    /// String form of the value at `idx`. A number is converted and the
    /// slot is overwritten with the resulting string.
    pub fn to_string_x(&mut self, idx: i32) -> Option<LuaString> {
        let converted = match self.stack.get_ref(idx)? {
            Val::Str(s) => return Some(s.clone()),
            v @ (Val::Int(_) | Val::Float(_)) => v.number_to_string()?,
            _ => return None,
        };
        self.stack.set(idx, Val::Str(converted.clone())).ok()?;
        trace!(target: "lunar::state", idx, "number converted in place");
        Some(converted)
    }

    pub fn to_str(&mut self, idx: i32) -> LuaString {
        self.to_string_x(idx).unwrap_or_default()
    }

    /* push functions (Rust -> stack) */

    pub fn push_nil(&mut self) -> Result<()> {
        self.stack.push(Val::Nil)
    }

    pub fn push_boolean(&mut self, b: bool) -> Result<()> {
        self.stack.push(Val::Bool(b))
    }

    pub fn push_integer(&mut self, n: i64) -> Result<()> {
        self.stack.push(Val::Int(n))
    }

    pub fn push_number(&mut self, n: f64) -> Result<()> {
        self.stack.push(Val::Float(n))
    }

    pub fn push_string(&mut self, s: impl Into<LuaString>) -> Result<()> {
        self.stack.push(Val::Str(s.into()))
    }
}
