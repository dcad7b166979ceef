//! Fast integer-to-text conversion.
//!
//! Plain `%d`, `%u`, `%x` and `%X` dominate real format strings, so these
//! skip the generic backend entirely. Digits are produced least significant
//! first into a small scratch array and then copied out in reverse.

/// Digit alphabets mirrored around `'0'`, so that the remainder of a
/// negative value indexes the same digit as its magnitude would. This is
/// what lets `MIN` values format without taking an absolute value.
const LOWER_LUT: &[u8; 71] =
    b"zyxwvutsrqponmlkjihgfedcba9876543210123456789abcdefghijklmnopqrstuvwxyz";
const UPPER_LUT: &[u8; 71] =
    b"ZYXWVUTSRQPONMLKJIHGFEDCBA9876543210123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Longest output for any supported base: `u64::MAX` in decimal, or
/// `i64::MIN` (19 digits plus sign).
pub const SCRATCH_LEN: usize = 20;

/// Integer types the fast path accepts.
pub trait RadixInt: Copy {
    fn is_negative(self) -> bool;
    fn is_zero(self) -> bool;
    /// Quotient and (possibly negative) remainder of division by `base`.
    fn div_rem(self, base: u32) -> (Self, i32);
}

macro_rules! impl_radix_int {
    ($($t:ty),*) => {$(
        impl RadixInt for $t {
            #[inline]
            #[allow(unused_comparisons)]
            fn is_negative(self) -> bool {
                self < 0
            }

            #[inline]
            fn is_zero(self) -> bool {
                self == 0
            }

            #[inline]
            fn div_rem(self, base: u32) -> (Self, i32) {
                let base = base as $t;
                let quotient = self / base;
                (quotient, (self - quotient * base) as i32)
            }
        }
    )*};
}

impl_radix_int!(i32, u32, i64, u64);

/// Write `value` in `BASE` to the start of `dest`, returning the byte count.
///
/// `dest` must hold the full output (at most [`SCRATCH_LEN`] bytes); callers
/// check capacity first via [`required_capacity`].
pub fn format_integer<T: RadixInt, const BASE: u32, const UPPER: bool>(
    dest: &mut [u8],
    value: T,
) -> usize {
    // Lower bases would overflow the scratch array.
    const { assert!(BASE >= 10 && BASE <= 36, "base invalid") };
    let lut = if UPPER { UPPER_LUT } else { LOWER_LUT };

    let mut scratch = [0u8; SCRATCH_LEN];
    let mut n = 0;
    let mut rest = value;
    loop {
        let (quotient, remainder) = rest.div_rem(BASE);
        scratch[n] = lut[(35 + remainder) as usize];
        n += 1;
        rest = quotient;
        if rest.is_zero() {
            break;
        }
    }
    if value.is_negative() {
        scratch[n] = b'-';
        n += 1;
    }

    debug_assert!(dest.len() >= n);
    for (out, digit) in dest.iter_mut().zip(scratch[..n].iter().rev()) {
        *out = *digit;
    }
    n
}

/// Destination size the fast path insists on before it will run.
#[must_use]
pub const fn required_capacity(wide: bool, base: u32) -> usize {
    match (wide, base) {
        (false, 16) => 8,
        (false, _) => 11,
        (true, 16) => 16,
        (true, _) => 20,
    }
}

/// An integer argument as seen by the fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastInt {
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

/// Render a plain (no flags, width or precision) integer conversion.
///
/// Letters of the other signedness reinterpret the bits at the value's own
/// width, as C does. Returns `None` when the conversion is not one of
/// `d i u x X` or `dest` is below [`required_capacity`]; the caller then
/// falls back to the generic backend.
pub fn format_plain(dest: &mut [u8], conversion: u8, value: FastInt) -> Option<usize> {
    match value {
        FastInt::I32(v) => plain32(dest, conversion, v, v as u32),
        FastInt::U32(v) => plain32(dest, conversion, v as i32, v),
        FastInt::I64(v) => plain64(dest, conversion, v, v as u64),
        FastInt::U64(v) => plain64(dest, conversion, v as i64, v),
    }
}

fn plain32(dest: &mut [u8], conversion: u8, signed: i32, unsigned: u32) -> Option<usize> {
    let decimal = dest.len() >= required_capacity(false, 10);
    let hex = dest.len() >= required_capacity(false, 16);
    match conversion {
        b'd' | b'i' if decimal => Some(format_integer::<i32, 10, false>(dest, signed)),
        b'u' if decimal => Some(format_integer::<u32, 10, false>(dest, unsigned)),
        b'x' if hex => Some(format_integer::<u32, 16, false>(dest, unsigned)),
        b'X' if hex => Some(format_integer::<u32, 16, true>(dest, unsigned)),
        _ => None,
    }
}

fn plain64(dest: &mut [u8], conversion: u8, signed: i64, unsigned: u64) -> Option<usize> {
    let decimal = dest.len() >= required_capacity(true, 10);
    let hex = dest.len() >= required_capacity(true, 16);
    match conversion {
        b'd' | b'i' if decimal => Some(format_integer::<i64, 10, false>(dest, signed)),
        b'u' if decimal => Some(format_integer::<u64, 10, false>(dest, unsigned)),
        b'x' if hex => Some(format_integer::<u64, 16, false>(dest, unsigned)),
        b'X' if hex => Some(format_integer::<u64, 16, true>(dest, unsigned)),
        _ => None,
    }
}
