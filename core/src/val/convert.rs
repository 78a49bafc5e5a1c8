use super::{LuaString, Val};

impl From<bool> for Val {
    #[inline]
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<i64> for Val {
    #[inline]
    fn from(i: i64) -> Self {
        Val::Int(i)
    }
}

impl From<f64> for Val {
    #[inline]
    fn from(f: f64) -> Self {
        Val::Float(f)
    }
}

impl From<&str> for Val {
    #[inline]
    fn from(s: &str) -> Self {
        Val::Str(LuaString::from(s))
    }
}

impl From<String> for Val {
    #[inline]
    fn from(s: String) -> Self {
        Val::Str(LuaString::from(s))
    }
}

impl From<LuaString> for Val {
    #[inline]
    fn from(s: LuaString) -> Self {
        Val::Str(s)
    }
}

impl<T: Into<Val>> From<Option<T>> for Val {
    fn from(v: Option<T>) -> Self {
        v.map_or(Val::Nil, Into::into)
    }
}

impl Val {
    /// Numeric view: floats as-is, integers widened. No string parsing.
    #[inline]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Val::Float(f) => Some(*f),
            Val::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view: integers as-is, floats only when they hold an exact
    /// integral value representable as `i64`.
    #[inline]
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Val::Int(i) => Some(*i),
            Val::Float(f) => float_to_integer(*f),
            _ => None,
        }
    }

    /// Default textual form of a number; `None` for every other kind.
    pub fn number_to_string(&self) -> Option<LuaString> {
        match self {
            Val::Int(i) => Some(LuaString::from(format_integer(*i))),
            Val::Float(f) => Some(LuaString::from(format_float(*f))),
            _ => None,
        }
    }
}

pub fn float_to_integer(f: f64) -> Option<i64> {
    // -2^63 is exact in f64, 2^63 is the first value out of range.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (LOWER..UPPER).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

pub fn format_integer(i: i64) -> String {
    let mut buf = itoa::Buffer::new();
    buf.format(i).to_owned()
}

/// Floats always keep a fractional part or an exponent (`2.0`, `1e21`) so the
/// result never reads back as an integer.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_owned();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_owned() } else { "-inf".to_owned() };
    }
    let mut buf = ryu::Buffer::new();
    buf.format_finite(f).to_owned()
}
