//! Formatting configuration.
//!
//! Sizing knobs may be set via environment variables:
//! - `TSF_STACK_CAPACITY`: bytes of stack storage tried before the first
//!   heap allocation (default 256, at most 1024).
//! - `TSF_GROWTH_CEILING`: largest scratch chunk a single directive may
//!   request before its output is truncated (default and maximum 1 MiB).
//!
//! Values accept decimal, `0x` hex, and `k`/`m` suffixes. Anything
//! unparseable falls back to the default.

/// Default stack storage for one formatting call.
pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Upper bound on configurable stack storage.
pub const MAX_STACK_CAPACITY: usize = 1024;

/// Largest chunk a single directive may grow to (1 MiB).
pub const GROWTH_CEILING: usize = 1 << 20;

/// Sizing parameters for a formatting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    stack_capacity: usize,
    growth_ceiling: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            growth_ceiling: GROWTH_CEILING,
        }
    }

    /// Read overrides from `TSF_STACK_CAPACITY` and `TSF_GROWTH_CEILING`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(n) = env_size("TSF_STACK_CAPACITY") {
            config = config.with_stack_capacity(n);
        }
        if let Some(n) = env_size("TSF_GROWTH_CEILING") {
            config = config.with_growth_ceiling(n);
        }
        config
    }

    /// Stack storage size, clamped to [`MAX_STACK_CAPACITY`].
    #[must_use]
    pub const fn with_stack_capacity(mut self, bytes: usize) -> Self {
        self.stack_capacity = if bytes > MAX_STACK_CAPACITY {
            MAX_STACK_CAPACITY
        } else {
            bytes
        };
        self
    }

    /// Per-directive growth ceiling. It can be lowered but never raised
    /// above [`GROWTH_CEILING`], and is at least one byte.
    #[must_use]
    pub const fn with_growth_ceiling(mut self, bytes: usize) -> Self {
        self.growth_ceiling = if bytes > GROWTH_CEILING {
            GROWTH_CEILING
        } else if bytes == 0 {
            1
        } else {
            bytes
        };
        self
    }

    #[must_use]
    pub const fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }

    #[must_use]
    pub const fn growth_ceiling(&self) -> usize {
        self.growth_ceiling
    }
}

fn env_size(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    let parsed = parse_size_loose(&raw);
    if parsed.is_none() {
        log::debug!("ignoring unparseable {name}={raw:?}");
    }
    parsed
}

/// Parse a byte count leniently: `4096`, `0x1000`, `4k`, `1M`.
#[must_use]
pub fn parse_size_loose(s: &str) -> Option<usize> {
    let s = s.trim().to_ascii_lowercase();
    let (digits, scale) = match s.strip_suffix('k') {
        Some(rest) => (rest, 1usize << 10),
        None => match s.strip_suffix('m') {
            Some(rest) => (rest, 1usize << 20),
            None => (s.as_str(), 1),
        },
    };
    let value = match digits.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<usize>().ok()?,
    };
    value.checked_mul(scale)
}
