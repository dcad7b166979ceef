//! Pluggable escaping for the `%q` and `%Q` directives.
//!
//! The engine has no opinion on what these directives mean; a caller
//! registers a callback per letter. A callback receives the destination
//! region and one argument, and returns `Some(bytes_written)` or `None` if
//! the region is too small. The engine retries a `None` with a larger
//! region. Callbacks never write a terminator.
//!
//! Stock callbacks quote values for SQL text.

use std::fmt;

use crate::arg::{Arg, decode_wide, until_nul};
use crate::backend::{self, FormatSpec, Rendered};
use crate::directive::natural_conversion;

/// Signature of an escape callback.
pub type EscapeFn<'e> = dyn Fn(&mut [u8], &Arg<'_>) -> Option<usize> + Send + Sync + 'e;

/// Optional callbacks for `%q` and `%Q`.
#[derive(Clone, Copy, Default)]
pub struct EscapeContext<'e> {
    escape_q: Option<&'e EscapeFn<'e>>,
    escape_upper_q: Option<&'e EscapeFn<'e>>,
}

impl fmt::Debug for EscapeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EscapeContext")
            .field("escape_q", &self.escape_q.is_some())
            .field("escape_upper_q", &self.escape_upper_q.is_some())
            .finish()
    }
}

impl<'e> EscapeContext<'e> {
    #[must_use]
    pub const fn new(
        escape_q: Option<&'e EscapeFn<'e>>,
        escape_upper_q: Option<&'e EscapeFn<'e>>,
    ) -> Self {
        Self {
            escape_q,
            escape_upper_q,
        }
    }

    /// `%q` quotes SQL literals, `%Q` quotes SQL identifiers.
    #[must_use]
    pub fn sql() -> Self {
        Self::new(Some(&sql_literal), Some(&sql_identifier))
    }

    #[must_use]
    pub const fn with_q(mut self, hook: &'e EscapeFn<'e>) -> Self {
        self.escape_q = Some(hook);
        self
    }

    #[must_use]
    pub const fn with_upper_q(mut self, hook: &'e EscapeFn<'e>) -> Self {
        self.escape_upper_q = Some(hook);
        self
    }

    /// The callback registered for `letter`, if any.
    #[must_use]
    pub fn hook(&self, letter: u8) -> Option<&'e EscapeFn<'e>> {
        match letter {
            b'q' => self.escape_q,
            b'Q' => self.escape_upper_q,
            _ => None,
        }
    }

    /// Run the callback for `letter` against `dest`, reporting the result
    /// the way the backend does. `None` if no callback is registered.
    pub(crate) fn apply(&self, letter: u8, dest: &mut [u8], arg: &Arg<'_>) -> Option<Rendered> {
        let hook = self.hook(letter)?;
        Some(match hook(dest, arg) {
            Some(n) if n < dest.len() => Rendered::Complete(n),
            Some(n) => Rendered::Truncated(n.min(dest.len())),
            None => Rendered::Truncated(0),
        })
    }
}

/// Quote as an SQL string literal: `'it''s'`. Non-text values are written
/// bare and a null argument becomes `NULL`.
pub fn sql_literal(dest: &mut [u8], arg: &Arg<'_>) -> Option<usize> {
    quote_sql(dest, arg, b'\'')
}

/// Quote as an SQL identifier: `"my ""table"""`. Non-text values are
/// written bare and a null argument becomes `NULL`.
pub fn sql_identifier(dest: &mut [u8], arg: &Arg<'_>) -> Option<usize> {
    quote_sql(dest, arg, b'"')
}

fn quote_sql(dest: &mut [u8], arg: &Arg<'_>, quote: u8) -> Option<usize> {
    let wide;
    let text = match *arg {
        Arg::Null => return copy_bare(dest, b"NULL"),
        Arg::CStr(s) => until_nul(s),
        Arg::WStr(w) => {
            wide = decode_wide(w);
            wide.as_bytes()
        }
        _ => {
            let mut scratch = [0u8; 64];
            let spec = FormatSpec::plain(natural_conversion(arg.tag()));
            return match backend::render(&mut scratch, &spec, arg) {
                Rendered::Complete(n) => copy_bare(dest, &scratch[..n]),
                Rendered::Truncated(_) => None,
            };
        }
    };

    let quotes = text.iter().filter(|&&b| b == quote).count();
    let needed = text.len() + quotes + 2;
    if needed > dest.len() {
        return None;
    }
    let mut n = 0;
    dest[n] = quote;
    n += 1;
    for &b in text {
        if b == quote {
            dest[n] = quote;
            n += 1;
        }
        dest[n] = b;
        n += 1;
    }
    dest[n] = quote;
    Some(n + 1)
}

fn copy_bare(dest: &mut [u8], bytes: &[u8]) -> Option<usize> {
    let slot = dest.get_mut(..bytes.len())?;
    slot.copy_from_slice(bytes);
    Some(bytes.len())
}
