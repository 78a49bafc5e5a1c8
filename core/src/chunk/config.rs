use serde::Deserialize;
use tracing::warn;

/// Reference `LUAI_MAXCCALLS`; the stock loader never nests deeper either.
pub const DEFAULT_MAX_DEPTH: usize = 200;

const ENV_MAX_DEPTH: &str = "LUNAR_MAX_PROTO_DEPTH";

/// Limits applied while decoding a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Maximum nesting depth of function prototypes; the main function is
    /// depth 1.
    pub max_depth: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl LoadConfig {
    /// Defaults, overridden by `LUNAR_MAX_PROTO_DEPTH` when it holds a
    /// positive integer.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => cfg.max_depth = depth,
                _ => warn!(target: "lunar::chunk", var = ENV_MAX_DEPTH, value = %raw, "ignoring invalid override"),
            }
        }
        cfg
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
