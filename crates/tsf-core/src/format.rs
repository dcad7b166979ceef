//! Public formatting entry points.
//!
//! Each call starts writing into stack storage and only touches the heap
//! when the output outgrows it. [`Formatter`] carries the escape callbacks
//! and sizing configuration; the free functions use the defaults.

use std::io::Write;

use crate::arg::Arg;
use crate::buffer::{Formatted, OutputBuffer};
use crate::config::{FormatConfig, MAX_STACK_CAPACITY};
use crate::engine::format_core;
use crate::error::FormatError;
use crate::escape::EscapeContext;

/// A reusable formatting setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter<'e> {
    escapes: EscapeContext<'e>,
    config: FormatConfig,
}

impl<'e> Formatter<'e> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            escapes: EscapeContext::new(None, None),
            config: FormatConfig::new(),
        }
    }

    #[must_use]
    pub const fn with_escapes(mut self, escapes: EscapeContext<'e>) -> Self {
        self.escapes = escapes;
        self
    }

    #[must_use]
    pub const fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn escapes(&self) -> &EscapeContext<'e> {
        &self.escapes
    }

    #[must_use]
    pub const fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Format into a new byte vector (no terminator).
    pub fn format_bytes(
        &self,
        fmt: impl AsRef<[u8]>,
        args: &[Arg<'_>],
    ) -> Result<Vec<u8>, FormatError> {
        let mut stack = [0u8; MAX_STACK_CAPACITY];
        let out = OutputBuffer::new(&mut stack[..self.config.stack_capacity()]);
        Ok(self.run(fmt.as_ref(), args, out)?.into_vec())
    }

    /// Format into a new string. Invalid UTF-8 in the output, which can only
    /// come from byte-string arguments, is replaced with U+FFFD.
    pub fn format(&self, fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<String, FormatError> {
        let mut stack = [0u8; MAX_STACK_CAPACITY];
        let out = OutputBuffer::new(&mut stack[..self.config.stack_capacity()]);
        Ok(self.run(fmt.as_ref(), args, out)?.into_string_lossy())
    }

    /// Format into `buf`. The result borrows `buf` if the output and its
    /// terminator fit, and is a heap block otherwise.
    pub fn format_into<'b>(
        &self,
        buf: &'b mut [u8],
        fmt: impl AsRef<[u8]>,
        args: &[Arg<'_>],
    ) -> Result<Formatted<'b>, FormatError> {
        self.run(fmt.as_ref(), args, OutputBuffer::new(buf))
    }

    /// Format and write the output to `writer`, returning the byte count.
    pub fn print<W: Write>(
        &self,
        mut writer: W,
        fmt: impl AsRef<[u8]>,
        args: &[Arg<'_>],
    ) -> Result<usize, FormatError> {
        let mut stack = [0u8; MAX_STACK_CAPACITY];
        let out = OutputBuffer::new(&mut stack[..self.config.stack_capacity()]);
        let done = self.run(fmt.as_ref(), args, out)?;
        if done.is_empty() {
            return Ok(0);
        }
        writer.write_all(done.as_bytes())?;
        Ok(done.len())
    }

    fn run<'b>(
        &self,
        fmt: &[u8],
        args: &[Arg<'_>],
        out: OutputBuffer<'b>,
    ) -> Result<Formatted<'b>, FormatError> {
        format_core(&self.escapes, &self.config, fmt, args, out)
    }
}

/// Format with default settings into a new string.
pub fn format(fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<String, FormatError> {
    Formatter::new().format(fmt, args)
}

/// Format with default settings into a new byte vector.
pub fn format_bytes(fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<Vec<u8>, FormatError> {
    Formatter::new().format_bytes(fmt, args)
}

/// Format with default settings into `buf`, spilling to the heap if needed.
pub fn format_into<'b>(
    buf: &'b mut [u8],
    fmt: impl AsRef<[u8]>,
    args: &[Arg<'_>],
) -> Result<Formatted<'b>, FormatError> {
    Formatter::new().format_into(buf, fmt, args)
}

/// Format with default settings and write to `writer`.
pub fn print<W: Write>(
    writer: W,
    fmt: impl AsRef<[u8]>,
    args: &[Arg<'_>],
) -> Result<usize, FormatError> {
    Formatter::new().print(writer, fmt, args)
}
