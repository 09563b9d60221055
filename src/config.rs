pub const DEFAULT_DECODE_CACHE_SIZE: usize = 32;

/// Knobs for a single machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of instructions one `resume` call may execute.
    /// `Some(0)` is the same as `None`.
    pub step_limit: Option<u64>,
    /// Capacity of the decoded-instruction cache, `0` disables it.
    pub decode_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step_limit: None,
            decode_cache_size: DEFAULT_DECODE_CACHE_SIZE,
        }
    }
}

impl Config {
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_decode_cache_size(mut self, size: usize) -> Self {
        self.decode_cache_size = size;
        self
    }
}
