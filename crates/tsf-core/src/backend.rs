//! Generic conversion backend.
//!
//! Renders one typed argument according to a parsed conversion spec, with
//! snprintf semantics: output goes into a fixed destination, never past its
//! end, and the full length the output needed is always reported so the
//! caller can detect truncation and retry with more room.
//!
//! Reference: POSIX.1-2024 fprintf, ISO C11 7.21.6.1
//!
//! Design invariant: rendering is bounded by the destination. Padding is
//! accounted arithmetically, so a huge width costs no more than the bytes
//! that actually fit.

use std::fmt::Write as _;

use crate::arg::{Arg, decode_wide, until_nul};
use crate::config::GROWTH_CEILING;

// ---------------------------------------------------------------------------
// Format spec types
// ---------------------------------------------------------------------------

/// Flags parsed from a directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
}

/// Width specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Width {
    #[default]
    None,
    Fixed(usize),
}

/// Precision specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precision {
    #[default]
    None,
    Fixed(usize),
}

/// A parsed conversion spec, already retyped to its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub flags: FormatFlags,
    pub width: Width,
    pub precision: Precision,
    pub conversion: u8,
}

impl FormatSpec {
    /// A spec with no flags, width or precision.
    #[must_use]
    pub fn plain(conversion: u8) -> Self {
        Self {
            flags: FormatFlags::default(),
            width: Width::None,
            precision: Precision::None,
            conversion,
        }
    }

    /// True when only the conversion letter matters, which is what the
    /// integer and string fast paths require.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.flags == FormatFlags::default()
            && self.width == Width::None
            && self.precision == Precision::None
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse the body of a directive (the bytes between `%` and the conversion
/// letter) into a spec for `conversion`.
///
/// Parsing is lenient: `*` is skipped wherever it appears, length modifiers
/// are ignored since argument width comes from the argument itself, and
/// anything after the precision is ignored.
#[must_use]
pub fn parse_directive(body: &[u8], conversion: u8) -> FormatSpec {
    let mut bytes = body.iter().copied().filter(|&b| b != b'*').peekable();

    // --- flags ---
    let mut flags = FormatFlags::default();
    while let Some(&b) = bytes.peek() {
        match b {
            b'-' => flags.left_justify = true,
            b'+' => flags.force_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alt_form = true,
            b'0' => flags.zero_pad = true,
            _ => break,
        }
        bytes.next();
    }
    // POSIX: '+' overrides ' '; '-' overrides '0'.
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    // --- width ---
    let mut width = Width::None;
    while let Some(d) = bytes.next_if(u8::is_ascii_digit) {
        width = Width::Fixed(push_digit(width_value(width), d));
    }

    // --- precision ---
    let mut precision = Precision::None;
    if bytes.next_if_eq(&b'.').is_some() {
        let mut p = 0usize;
        while let Some(d) = bytes.next_if(u8::is_ascii_digit) {
            p = push_digit(p, d);
        }
        precision = Precision::Fixed(p);
    }

    FormatSpec {
        flags,
        width,
        precision,
        conversion,
    }
}

fn width_value(width: Width) -> usize {
    match width {
        Width::Fixed(w) => w,
        Width::None => 0,
    }
}

fn push_digit(acc: usize, digit: u8) -> usize {
    acc.saturating_mul(10).saturating_add((digit - b'0') as usize)
}

// ---------------------------------------------------------------------------
// Bounded sink
// ---------------------------------------------------------------------------

/// Outcome of writing one conversion into a fixed destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered {
    /// Everything fit, with at least one byte to spare.
    Complete(usize),
    /// The output was cut off; this many leading bytes are valid.
    Truncated(usize),
}

/// Destination that never writes past its end but keeps counting.
#[derive(Debug)]
pub struct Sink<'d> {
    dest: &'d mut [u8],
    needed: usize,
}

impl<'d> Sink<'d> {
    pub fn new(dest: &'d mut [u8]) -> Self {
        Self { dest, needed: 0 }
    }

    /// Bytes the complete output requires.
    #[must_use]
    pub fn needed(&self) -> usize {
        self.needed
    }

    /// Bytes actually stored in the destination.
    #[must_use]
    pub fn written(&self) -> usize {
        self.needed.min(self.dest.len())
    }

    pub fn push(&mut self, byte: u8) {
        if let Some(slot) = self.dest.get_mut(self.needed) {
            *slot = byte;
        }
        self.needed = self.needed.saturating_add(1);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        let start = self.written();
        let take = bytes.len().min(self.dest.len() - start);
        self.dest[start..start + take].copy_from_slice(&bytes[..take]);
        self.needed = self.needed.saturating_add(bytes.len());
    }

    pub fn pad(&mut self, byte: u8, count: usize) {
        let start = self.written();
        let end = self.needed.saturating_add(count).min(self.dest.len());
        self.dest[start..end].fill(byte);
        self.needed = self.needed.saturating_add(count);
    }

    /// Snprintf-style verdict: complete only if a terminator would still fit.
    #[must_use]
    pub fn finish(&self) -> Rendered {
        if self.needed < self.dest.len() {
            Rendered::Complete(self.needed)
        } else {
            Rendered::Truncated(self.written())
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Render `arg` into `dest` according to `spec`.
///
/// `spec.conversion` must already agree with the argument's tag (see
/// [`crate::directive::effective_conversion`]); integer letters of the other
/// signedness reinterpret the bits at the argument's width.
pub fn render(dest: &mut [u8], spec: &FormatSpec, arg: &Arg<'_>) -> Rendered {
    let mut out = Sink::new(dest);
    let signed = matches!(spec.conversion, b'd' | b'i');
    match *arg {
        Arg::Null => {}
        Arg::Pointer(addr) => format_pointer(addr, spec, &mut out),
        Arg::CStr(s) => format_str(until_nul(s), spec, &mut out),
        Arg::WStr(w) => format_str(decode_wide(w).as_bytes(), spec, &mut out),
        Arg::I32(v) if spec.conversion == b'c' => format_char(v, spec, &mut out),
        Arg::I32(v) if signed => format_signed(i64::from(v), spec, &mut out),
        Arg::I32(v) => format_unsigned(u64::from(v as u32), spec, &mut out),
        Arg::U32(v) if signed => format_signed(i64::from(v as i32), spec, &mut out),
        Arg::U32(v) => format_unsigned(u64::from(v), spec, &mut out),
        Arg::I64(v) if signed => format_signed(v, spec, &mut out),
        Arg::I64(v) => format_unsigned(v as u64, spec, &mut out),
        Arg::U64(v) if signed => format_signed(v as i64, spec, &mut out),
        Arg::U64(v) => format_unsigned(v, spec, &mut out),
        Arg::F64(v) => format_float(v, spec, &mut out),
    }
    out.finish()
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Render a signed integer according to `spec`.
pub fn format_signed(value: i64, spec: &FormatSpec, out: &mut Sink<'_>) {
    let mut digits = [0u8; 64];
    let count = render_digits(value.unsigned_abs(), 10, false, &mut digits);

    let sign = if value < 0 {
        Some(b'-')
    } else if spec.flags.force_sign {
        Some(b'+')
    } else if spec.flags.space_sign {
        Some(b' ')
    } else {
        None
    };

    emit_integer(out, spec, sign, b"", &digits[64 - count..], value == 0);
}

/// Render an unsigned integer according to `spec` (`u`, `o`, `x`, `X`).
pub fn format_unsigned(value: u64, spec: &FormatSpec, out: &mut Sink<'_>) {
    let (base, uppercase) = int_base(spec.conversion);
    let mut digits = [0u8; 64];
    let count = render_digits(value, base, uppercase, &mut digits);

    let prefix: &[u8] = match (spec.flags.alt_form && value != 0, spec.conversion) {
        (true, b'x') => b"0x",
        (true, b'X') => b"0X",
        _ => b"",
    };

    emit_integer(out, spec, None, prefix, &digits[64 - count..], value == 0);
}

fn emit_integer(
    out: &mut Sink<'_>,
    spec: &FormatSpec,
    sign: Option<u8>,
    prefix: &[u8],
    digits: &[u8],
    is_zero: bool,
) {
    let precision = match spec.precision {
        Precision::Fixed(p) => Some(p),
        Precision::None => None,
    };

    // Explicit precision 0 with value 0: no digits emitted.
    let digits = if is_zero && precision == Some(0) {
        &[][..]
    } else {
        digits
    };
    let mut zeros = precision.map_or(0, |p| p.saturating_sub(digits.len()));

    // '#' with 'o': the first digit must be a zero.
    if spec.flags.alt_form && spec.conversion == b'o' && zeros == 0 && digits.first() != Some(&b'0')
    {
        zeros = 1;
    }

    let content_len = sign.is_some() as usize + prefix.len() + zeros + digits.len();
    let pad_total = resolve_width(spec).saturating_sub(content_len);
    // A precision disables the '0' flag for integers.
    let zero_pad = spec.flags.zero_pad && precision.is_none();

    if !spec.flags.left_justify && !zero_pad {
        out.pad(b' ', pad_total);
    }
    if let Some(s) = sign {
        out.push(s);
    }
    out.extend(prefix);
    if !spec.flags.left_justify && zero_pad {
        out.pad(b'0', pad_total);
    }
    out.pad(b'0', zeros);
    out.extend(digits);
    if spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
}

/// Render a floating-point value according to `spec`.
///
/// Supports `%f`, `%e`/`%E`, `%g`/`%G` and `%a`/`%A`. Digit generation uses
/// Rust's exact float formatting, so results are correctly rounded and
/// identical on every host; the decimal separator is always `.`.
pub fn format_float(value: f64, spec: &FormatSpec, out: &mut Sink<'_>) {
    let upper = spec.conversion.is_ascii_uppercase();
    let negative = value.is_sign_negative();
    let abs = value.abs();
    let alt = spec.flags.alt_form;
    let precision = match spec.precision {
        Precision::Fixed(p) => Some(p.min(GROWTH_CEILING)),
        Precision::None => None,
    };

    let finite = value.is_finite();
    let body = if value.is_nan() {
        (if upper { "NAN" } else { "nan" }).to_string()
    } else if value.is_infinite() {
        (if upper { "INF" } else { "inf" }).to_string()
    } else {
        match spec.conversion | 0x20 {
            b'e' => format_e(abs, precision.unwrap_or(6), upper, alt),
            b'g' => format_g(abs, precision.unwrap_or(6), upper, alt),
            b'a' => format_a(abs, precision, upper, alt),
            _ => format_f(abs, precision.unwrap_or(6), alt),
        }
    };

    let sign = if negative {
        Some(b'-')
    } else if spec.flags.force_sign {
        Some(b'+')
    } else if spec.flags.space_sign {
        Some(b' ')
    } else {
        None
    };

    // Hex floats carry their "0x" ahead of any zero padding.
    let (prefix, digits) = if finite && spec.conversion | 0x20 == b'a' {
        body.as_bytes().split_at(2)
    } else {
        (&[][..], body.as_bytes())
    };

    let content_len = sign.is_some() as usize + body.len();
    let pad_total = resolve_width(spec).saturating_sub(content_len);
    // nan/inf are never zero padded.
    let zero_pad = spec.flags.zero_pad && finite;

    if !spec.flags.left_justify && !zero_pad {
        out.pad(b' ', pad_total);
    }
    if let Some(s) = sign {
        out.push(s);
    }
    out.extend(prefix);
    if !spec.flags.left_justify && zero_pad {
        out.pad(b'0', pad_total);
    }
    out.extend(digits);
    if spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
}

/// Render a string according to `spec`.
///
/// `s` is the raw byte content without terminator. Precision truncates.
pub fn format_str(s: &[u8], spec: &FormatSpec, out: &mut Sink<'_>) {
    let max_len = match spec.precision {
        Precision::Fixed(p) => p,
        Precision::None => s.len(),
    };
    let effective = &s[..s.len().min(max_len)];
    let pad_total = resolve_width(spec).saturating_sub(effective.len());

    if !spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
    out.extend(effective);
    if spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
}

/// Render a character code as UTF-8. Values that are not Unicode scalar
/// values render as U+FFFD.
pub fn format_char(code: i32, spec: &FormatSpec, out: &mut Sink<'_>) {
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut utf8 = [0u8; 4];
    let encoded = c.encode_utf8(&mut utf8).as_bytes();
    let pad_total = resolve_width(spec).saturating_sub(encoded.len());

    if !spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
    out.extend(encoded);
    if spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
}

/// Render an address as `0x...` hex, or `(nil)` for zero.
pub fn format_pointer(addr: usize, spec: &FormatSpec, out: &mut Sink<'_>) {
    let mut digits = [0u8; 64];
    let count = render_digits(addr as u64, 16, false, &mut digits);
    let (prefix, body): (&[u8], &[u8]) = if addr == 0 {
        (b"", b"(nil)")
    } else {
        (b"0x", &digits[64 - count..])
    };
    let pad_total = resolve_width(spec).saturating_sub(prefix.len() + body.len());

    if !spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
    out.extend(prefix);
    out.extend(body);
    if spec.flags.left_justify {
        out.pad(b' ', pad_total);
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn resolve_width(spec: &FormatSpec) -> usize {
    width_value(spec.width)
}

fn int_base(conversion: u8) -> (u64, bool) {
    match conversion {
        b'o' => (8, false),
        b'x' => (16, false),
        b'X' => (16, true),
        _ => (10, false),
    }
}

/// Render `value` in the given `base` into the END of `buf`.
/// Returns the number of digits written. Digits are placed right-aligned.
fn render_digits(mut value: u64, base: u64, uppercase: bool, buf: &mut [u8; 64]) -> usize {
    if value == 0 {
        buf[63] = b'0';
        return 1;
    }
    let alpha = if uppercase { b'A' } else { b'a' };
    let mut pos = 64;
    while value > 0 && pos > 0 {
        pos -= 1;
        let digit = (value % base) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            alpha + (digit - 10)
        };
        value /= base;
    }
    64 - pos
}

/// Largest precision `core::fmt` accepts. An `f64` has no nonzero decimal
/// digits this far past the point, so anything beyond is zero fill.
const FMT_PRECISION_MAX: usize = u16::MAX as usize;

/// `%f`: fixed-point decimal.
fn format_f(value: f64, precision: usize, alt_form: bool) -> String {
    let exact = precision.min(FMT_PRECISION_MAX);
    let mut s = format!("{value:.exact$}");
    pad_zeros(&mut s, precision - exact);
    if precision == 0 && alt_form {
        s.push('.');
    }
    s
}

/// Split Rust's `{:e}` output into mantissa and decimal exponent.
fn split_exp(value: f64, precision: usize) -> (String, i32) {
    let exact = precision.min(FMT_PRECISION_MAX);
    let s = format!("{value:.exact$e}");
    let (mut mantissa, exp) = match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    };
    pad_zeros(&mut mantissa, precision - exact);
    (mantissa, exp)
}

fn pad_zeros(s: &mut String, count: usize) {
    s.reserve(count);
    s.extend(std::iter::repeat_n('0', count));
}

/// Append a C-style exponent: sign and at least two digits.
fn push_exponent(s: &mut String, marker: char, exp: i32) {
    s.push(marker);
    s.push(if exp < 0 { '-' } else { '+' });
    let _ = write!(s, "{:02}", exp.unsigned_abs());
}

/// `%e` / `%E`: scientific notation.
fn format_e(value: f64, precision: usize, uppercase: bool, alt_form: bool) -> String {
    let (mut s, exp) = split_exp(value, precision);
    if precision == 0 && alt_form {
        s.push('.');
    }
    push_exponent(&mut s, if uppercase { 'E' } else { 'e' }, exp);
    s
}

/// `%g` / `%G`: `%e` when the exponent is below -4 or at least the
/// precision, `%f` otherwise; trailing zeros dropped unless `#`.
fn format_g(value: f64, precision: usize, uppercase: bool, alt_form: bool) -> String {
    let p = precision.max(1);
    let exp = if value == 0.0 {
        0
    } else {
        split_exp(value, p - 1).1
    };

    if exp >= -4 && (exp as i64) < p as i64 {
        let frac_digits = (p as i64 - 1 - exp as i64) as usize;
        let mut s = format_f(value, frac_digits, alt_form);
        if !alt_form {
            strip_trailing_zeros(&mut s);
        }
        s
    } else {
        let (mut mantissa, exp) = split_exp(value, p - 1);
        if alt_form {
            if p == 1 {
                mantissa.push('.');
            }
        } else {
            strip_trailing_zeros(&mut mantissa);
        }
        push_exponent(&mut mantissa, if uppercase { 'E' } else { 'e' }, exp);
        mantissa
    }
}

/// `%a` / `%A`: hexadecimal floating point, `0x1.8p+1` style.
///
/// Without a precision the fraction is exact with trailing zeros dropped;
/// with one it is rounded half-to-even. A carry may produce a leading `2`,
/// as glibc does.
fn format_a(value: f64, precision: Option<usize>, uppercase: bool, alt_form: bool) -> String {
    const FRACTION_DIGITS: usize = 13;
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);

    let (lead, exp) = match (biased, fraction) {
        (0, 0) => (0u64, 0),
        (0, _) => (0u64, -1022),
        _ => (1u64, biased - 1023),
    };

    let (lead, fraction, digits) = match precision {
        Some(p) if p < FRACTION_DIGITS => {
            let dropped = ((FRACTION_DIGITS - p) * 4) as u32;
            let full = (lead << 52) | fraction;
            let rest = full & ((1u64 << dropped) - 1);
            let half = 1u64 << (dropped - 1);
            let mut kept = full >> dropped;
            if rest > half || (rest == half && kept & 1 == 1) {
                kept += 1;
            }
            let kept_bits = (p * 4) as u32;
            (kept >> kept_bits, kept & ((1u64 << kept_bits) - 1), p)
        }
        _ => (lead, fraction, FRACTION_DIGITS),
    };

    let mut frac = if digits == 0 {
        String::new()
    } else {
        format!("{fraction:0digits$x}")
    };
    match precision {
        None => {
            while frac.ends_with('0') {
                frac.pop();
            }
        }
        Some(p) => {
            while frac.len() < p {
                frac.push('0');
            }
        }
    }

    let mut s = format!("0x{lead}");
    if !frac.is_empty() || alt_form {
        s.push('.');
    }
    s.push_str(&frac);
    s.push('p');
    s.push(if exp < 0 { '-' } else { '+' });
    let _ = write!(s, "{}", exp.unsigned_abs());
    if uppercase {
        s.make_ascii_uppercase();
    }
    s
}

/// Remove trailing zeros after the decimal point.
fn strip_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
