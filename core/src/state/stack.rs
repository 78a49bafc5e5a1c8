use std::fmt;

use tracing::trace;

use crate::val::Val;

/// Runtime stack fault. Returned before any slot is touched, so the stack is
/// still consistent when the caller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    Overflow,
    Underflow,
    InvalidIndex(i32),
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::Overflow => write!(f, "stack overflow"),
            StackError::Underflow => write!(f, "stack underflow"),
            StackError::InvalidIndex(idx) => write!(f, "invalid index {}", idx),
        }
    }
}

impl std::error::Error for StackError {}

/// Register stack of one execution context.
///
/// Indices are 1-based from the bottom; negative indices count down from the
/// top (`-1` is the topmost live value). Slots at or above `top` are always
/// `Nil`.
#[derive(Debug, Clone)]
pub struct LuaStack {
    slots: Vec<Val>,
    top: usize,
}

impl LuaStack {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Val::Nil; size],
            top: 0,
        }
    }

    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live slots, bottom first.
    #[inline]
    pub fn as_slice(&self) -> &[Val] {
        &self.slots[..self.top]
    }

    /// Guarantees at least `n` free slots above `top`. Never shrinks.
    pub fn check(&mut self, n: usize) {
        let free = self.slots.len() - self.top;
        if free < n {
            self.slots.resize(self.top + n, Val::Nil);
            trace!(target: "lunar::state", capacity = self.slots.len(), top = self.top, "stack grown");
        }
    }

    /// Does not grow the stack; call [`check`](Self::check) first.
    pub fn push(&mut self, val: Val) -> Result<(), StackError> {
        if self.top == self.slots.len() {
            return Err(StackError::Overflow);
        }
        self.slots[self.top] = val;
        self.top += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Val, StackError> {
        if self.top < 1 {
            return Err(StackError::Underflow);
        }
        self.top -= 1;
        Ok(std::mem::take(&mut self.slots[self.top]))
    }

    #[inline]
    pub fn abs_index(&self, idx: i32) -> i32 {
        if idx < 0 { idx + 1 + self.top as i32 } else { idx }
    }

    #[inline]
    pub fn is_valid(&self, idx: i32) -> bool {
        let abs = self.abs_index(idx);
        abs > 0 && abs as usize <= self.top
    }

    /// 0-based slot for a valid index.
    #[inline]
    fn slot(&self, idx: i32) -> Option<usize> {
        self.is_valid(idx).then(|| self.abs_index(idx) as usize - 1)
    }

    #[inline]
    pub fn get_ref(&self, idx: i32) -> Option<&Val> {
        self.slot(idx).map(|i| &self.slots[i])
    }

    /// Out-of-range reads yield `Nil`.
    #[inline]
    pub fn get(&self, idx: i32) -> Val {
        self.get_ref(idx).cloned().unwrap_or(Val::Nil)
    }

    pub fn set(&mut self, idx: i32, val: Val) -> Result<(), StackError> {
        match self.slot(idx) {
            Some(i) => {
                self.slots[i] = val;
                Ok(())
            }
            None => Err(StackError::InvalidIndex(idx)),
        }
    }

    /// Reverses the 0-based closed range `[from, to]` in place.
    pub fn reverse(&mut self, mut from: usize, mut to: usize) {
        while from < to {
            self.slots.swap(from, to);
            from += 1;
            to -= 1;
        }
    }
}
