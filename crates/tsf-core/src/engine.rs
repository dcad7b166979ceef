//! Format string scanner and dispatcher.
//!
//! Scans the format string left to right, copying literal runs straight
//! into the output and resolving each `%` directive against the next
//! argument. Directives the engine will not honor are copied through as
//! literal text; nothing a format string contains can make a call fail.
//!
//! Dispatch order for an accepted directive:
//! 1. `q`/`Q` go to the registered escape callback
//! 2. plain `%s` of narrow text is copied directly
//! 3. plain `d i u x X` of an integer use the fast integer formatter
//! 4. everything else goes through the generic backend

use crate::arg::{Arg, ArgPack, until_nul};
use crate::backend::{self, Rendered};
use crate::buffer::{Formatted, OutputBuffer};
use crate::config::FormatConfig;
use crate::directive::{MAX_SPEC_LEN, effective_conversion, is_body_byte, is_conversion_letter};
use crate::error::FormatError;
use crate::escape::EscapeContext;
use crate::integer::{FastInt, format_plain};

/// Smallest scratch chunk handed to a delegated write, so that a buffer
/// starting with no capacity still makes progress.
pub const MIN_CHUNK: usize = 16;

/// Format `fmt` with `args` into `out` and terminate it.
///
/// The logical end of `fmt` is its first NUL byte, or the end of the slice.
pub fn format_core<'b>(
    cx: &EscapeContext<'_>,
    config: &FormatConfig,
    fmt: &[u8],
    args: &[Arg<'_>],
    mut out: OutputBuffer<'b>,
) -> Result<Formatted<'b>, FormatError> {
    let fmt = until_nul(fmt);
    let mut pack = ArgPack::new(args);

    if pack.is_empty() {
        out.extend_from_slice(fmt)?;
        return out.finish();
    }

    let first_chunk = (out.capacity() / 4).max(MIN_CHUNK);
    let ceiling = config.growth_ceiling();

    let mut i = 0;
    while i < fmt.len() {
        if fmt[i] != b'%' {
            let end = fmt[i..]
                .iter()
                .position(|&b| b == b'%')
                .map_or(fmt.len(), |off| i + off);
            copy_literal(&mut out, &fmt[i..end])?;
            i = end;
            continue;
        }

        let start = i;
        let mut j = i + 1;
        while j < fmt.len() && is_body_byte(fmt[j]) {
            j += 1;
        }

        let letter = match fmt.get(j) {
            Some(&b'%') => {
                out.push(b'%')?;
                i = j + 1;
                continue;
            }
            Some(&b) if is_conversion_letter(b) => b,
            // Unknown terminator or end of string: the text so far is
            // literal, and scanning resumes at the offending byte.
            _ => {
                passthrough(&mut out, &fmt[start..j], "unterminated directive")?;
                i = j;
                continue;
            }
        };

        let raw = &fmt[start..=j];
        i = j + 1;

        if raw.len() >= MAX_SPEC_LEN {
            passthrough(&mut out, raw, "directive too long")?;
            continue;
        }
        if letter == b'n' {
            passthrough(&mut out, raw, "%n is never honored")?;
            continue;
        }
        if matches!(letter, b'q' | b'Q') && cx.hook(letter).is_none() {
            passthrough(&mut out, raw, "no escape callback registered")?;
            continue;
        }
        let Some(arg) = pack.next_arg() else {
            passthrough(&mut out, raw, "no argument left")?;
            continue;
        };

        let body = &raw[1..raw.len() - 1];
        let directive = Directive {
            body,
            letter,
            arg,
            first_chunk,
            ceiling,
        };
        directive.write(cx, &mut out)?;
    }

    out.finish()
}

/// One accepted directive and the argument it consumes.
struct Directive<'d, 'a> {
    body: &'d [u8],
    letter: u8,
    arg: &'d Arg<'a>,
    first_chunk: usize,
    ceiling: usize,
}

impl Directive<'_, '_> {
    fn write(&self, cx: &EscapeContext<'_>, out: &mut OutputBuffer<'_>) -> Result<(), FormatError> {
        let arg = self.arg;

        if matches!(self.letter, b'q' | b'Q') {
            return write_with_retry(out, self.first_chunk, self.ceiling, |dest| {
                cx.apply(self.letter, dest, arg)
                    .unwrap_or(Rendered::Complete(0))
            });
        }

        let conversion = effective_conversion(arg.tag(), self.letter);
        let spec = backend::parse_directive(self.body, conversion);

        if spec.is_plain() {
            if let (Arg::CStr(s), b's') = (arg, conversion) {
                return copy_literal(out, until_nul(s));
            }
            if let Some(value) = fast_int(arg) {
                if let Some(n) = format_plain(out.spare_mut(), conversion, value) {
                    out.advance(n);
                    return Ok(());
                }
            }
        }

        write_with_retry(out, self.first_chunk, self.ceiling, |dest| {
            backend::render(dest, &spec, arg)
        })
    }
}

fn fast_int(arg: &Arg<'_>) -> Option<FastInt> {
    match *arg {
        Arg::I32(v) => Some(FastInt::I32(v)),
        Arg::U32(v) => Some(FastInt::U32(v)),
        Arg::I64(v) => Some(FastInt::I64(v)),
        Arg::U64(v) => Some(FastInt::U64(v)),
        _ => None,
    }
}

/// Copy a literal run through the buffer's spare capacity, forcing growth
/// one byte at a time when it runs out.
fn copy_literal(out: &mut OutputBuffer<'_>, mut bytes: &[u8]) -> Result<(), FormatError> {
    while !bytes.is_empty() {
        if out.remaining_space() == 0 {
            out.reserve(1)?;
        }
        let spare = out.spare_mut();
        let n = spare.len().min(bytes.len());
        spare[..n].copy_from_slice(&bytes[..n]);
        out.advance(n);
        bytes = &bytes[n..];
    }
    Ok(())
}

fn passthrough(out: &mut OutputBuffer<'_>, raw: &[u8], reason: &str) -> Result<(), FormatError> {
    log::debug!(
        "passing {:?} through as literal text: {reason}",
        String::from_utf8_lossy(raw)
    );
    copy_literal(out, raw)
}

/// Let `write` fill the spare capacity, or failing that a claimed chunk,
/// and keep exactly what it produced.
///
/// A truncated write is discarded and retried with a doubled chunk. At the
/// ceiling the truncated bytes are kept as the best available result.
fn write_with_retry(
    out: &mut OutputBuffer<'_>,
    first_chunk: usize,
    ceiling: usize,
    mut write: impl FnMut(&mut [u8]) -> Rendered,
) -> Result<(), FormatError> {
    let limit = out.remaining_space().min(ceiling);
    if limit > 0 {
        if let Rendered::Complete(n) = write(&mut out.spare_mut()[..limit]) {
            out.advance(n);
            return Ok(());
        }
    }

    let mut chunk = first_chunk.min(ceiling);
    loop {
        let dest = out.add_uninitialized(chunk)?;
        match write(dest) {
            Rendered::Complete(n) => {
                out.retract(chunk - n);
                return Ok(());
            }
            Rendered::Truncated(n) if chunk >= ceiling => {
                log::debug!("directive output truncated at growth ceiling of {ceiling} bytes");
                out.retract(chunk - n.min(chunk));
                return Ok(());
            }
            Rendered::Truncated(_) => {
                out.retract(chunk);
                chunk = chunk.saturating_mul(2).min(ceiling);
            }
        }
    }
}
