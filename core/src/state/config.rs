use serde::Deserialize;
use tracing::warn;

/// Reference `LUA_MINSTACK`.
pub const DEFAULT_STACK_SIZE: usize = 20;

const ENV_STACK_SIZE: &str = "LUNAR_STACK_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Slots allocated when a state is created.
    pub initial_stack_size: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            initial_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl StateConfig {
    /// Defaults, overridden by `LUNAR_STACK_SIZE` when it parses.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var(ENV_STACK_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(size) => cfg.initial_stack_size = size,
                Err(_) => warn!(target: "lunar::state", var = ENV_STACK_SIZE, value = %raw, "ignoring invalid override"),
            }
        }
        cfg
    }
}
