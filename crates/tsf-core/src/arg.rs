//! Tagged call-site arguments.
//!
//! An [`Arg`] captures one argument as one of a fixed set of native shapes.
//! String payloads are borrowed, never owned: the referent only has to
//! outlive the formatting call that reads it.

use std::ffi::{CStr, CString};
use std::ptr::NonNull;

/// Discriminant of an [`Arg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgTag {
    Null,
    Pointer,
    CStr,
    WStr,
    I32,
    U32,
    I64,
    U64,
    F64,
}

impl ArgTag {
    /// Every tag, in declaration order.
    pub const ALL: [ArgTag; 9] = [
        ArgTag::Null,
        ArgTag::Pointer,
        ArgTag::CStr,
        ArgTag::WStr,
        ArgTag::I32,
        ArgTag::U32,
        ArgTag::I64,
        ArgTag::U64,
        ArgTag::F64,
    ];

    /// Short lowercase name, as used by the harness argument syntax.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ArgTag::Null => "null",
            ArgTag::Pointer => "ptr",
            ArgTag::CStr => "str",
            ArgTag::WStr => "wstr",
            ArgTag::I32 => "i32",
            ArgTag::U32 => "u32",
            ArgTag::I64 => "i64",
            ArgTag::U64 => "u64",
            ArgTag::F64 => "f64",
        }
    }
}

/// A single formatting argument.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Arg<'a> {
    /// No value. Renders as nothing.
    #[default]
    Null,
    /// An address. It is printed, never dereferenced.
    Pointer(usize),
    /// Narrow text, terminated by the first NUL or the end of the slice.
    CStr(&'a [u8]),
    /// UTF-16 text, terminated by the first NUL unit or the end of the slice.
    WStr(&'a [u16]),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
}

impl<'a> Arg<'a> {
    #[must_use]
    pub const fn tag(&self) -> ArgTag {
        match self {
            Arg::Null => ArgTag::Null,
            Arg::Pointer(_) => ArgTag::Pointer,
            Arg::CStr(_) => ArgTag::CStr,
            Arg::WStr(_) => ArgTag::WStr,
            Arg::I32(_) => ArgTag::I32,
            Arg::U32(_) => ArgTag::U32,
            Arg::I64(_) => ArgTag::I64,
            Arg::U64(_) => ArgTag::U64,
            Arg::F64(_) => ArgTag::F64,
        }
    }

    /// Narrow string payload up to its terminator.
    #[must_use]
    pub fn c_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            Arg::CStr(s) => Some(until_nul(s)),
            _ => None,
        }
    }
}

/// Bytes of `bytes` before the first NUL.
#[must_use]
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Decode UTF-16 up to the first NUL unit; unpaired surrogates become U+FFFD.
#[must_use]
pub fn decode_wide(units: &[u16]) -> String {
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    char::decode_utf16(units[..end].iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Conversion of a native value into an [`Arg`].
///
/// Implement this for your own types to make them usable with the `tsf!`
/// macros, as long as they fit one of the argument shapes.
pub trait ToArg {
    fn to_arg(&self) -> Arg<'_>;
}

macro_rules! impl_numeric_arg {
    ($variant:ident as $target:ty: $($t:ty),* $(,)?) => {$(
        impl ToArg for $t {
            #[inline]
            fn to_arg(&self) -> Arg<'_> {
                Arg::$variant(<$target>::from(*self))
            }
        }

        impl From<$t> for Arg<'_> {
            #[inline]
            fn from(v: $t) -> Self {
                Arg::$variant(<$target>::from(v))
            }
        }
    )*};
}

impl_numeric_arg!(I32 as i32: i8, i16, i32);
impl_numeric_arg!(U32 as u32: u8, u16, u32);
impl_numeric_arg!(I64 as i64: i64);
impl_numeric_arg!(U64 as u64: u64);
impl_numeric_arg!(F64 as f64: f32, f64);

// isize/usize follow the target's pointer width, like C `long` on LP64.
#[cfg(target_pointer_width = "64")]
impl ToArg for isize {
    fn to_arg(&self) -> Arg<'_> {
        Arg::I64(*self as i64)
    }
}

#[cfg(target_pointer_width = "64")]
impl ToArg for usize {
    fn to_arg(&self) -> Arg<'_> {
        Arg::U64(*self as u64)
    }
}

#[cfg(not(target_pointer_width = "64"))]
impl ToArg for isize {
    fn to_arg(&self) -> Arg<'_> {
        Arg::I32(*self as i32)
    }
}

#[cfg(not(target_pointer_width = "64"))]
impl ToArg for usize {
    fn to_arg(&self) -> Arg<'_> {
        Arg::U32(*self as u32)
    }
}

impl ToArg for () {
    fn to_arg(&self) -> Arg<'_> {
        Arg::Null
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self)
    }
}

impl<const N: usize> ToArg for [u8; N] {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self)
    }
}

impl ToArg for CStr {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self.to_bytes())
    }
}

impl ToArg for CString {
    fn to_arg(&self) -> Arg<'_> {
        Arg::CStr(self.as_bytes())
    }
}

impl ToArg for [u16] {
    fn to_arg(&self) -> Arg<'_> {
        Arg::WStr(self)
    }
}

impl<const N: usize> ToArg for [u16; N] {
    fn to_arg(&self) -> Arg<'_> {
        Arg::WStr(self)
    }
}

impl ToArg for Vec<u16> {
    fn to_arg(&self) -> Arg<'_> {
        Arg::WStr(self)
    }
}

impl<T: ?Sized> ToArg for *const T {
    fn to_arg(&self) -> Arg<'_> {
        Arg::Pointer(self.addr())
    }
}

impl<T: ?Sized> ToArg for *mut T {
    fn to_arg(&self) -> Arg<'_> {
        Arg::Pointer(self.addr())
    }
}

impl<T: ?Sized> ToArg for NonNull<T> {
    fn to_arg(&self) -> Arg<'_> {
        Arg::Pointer(self.as_ptr().addr())
    }
}

impl ToArg for Arg<'_> {
    fn to_arg(&self) -> Arg<'_> {
        *self
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Arg<'_> {
        (**self).to_arg()
    }
}

impl<T: ToArg + ?Sized> ToArg for &mut T {
    fn to_arg(&self) -> Arg<'_> {
        (**self).to_arg()
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::CStr(s.as_bytes())
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(s: &'a String) -> Self {
        Arg::CStr(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(s: &'a [u8]) -> Self {
        Arg::CStr(s)
    }
}

impl<'a> From<&'a [u16]> for Arg<'a> {
    fn from(s: &'a [u16]) -> Self {
        Arg::WStr(s)
    }
}

// ---------------------------------------------------------------------------
// Argument pack
// ---------------------------------------------------------------------------

/// The arguments of one formatting call, consumed strictly left to right.
#[derive(Debug, Clone)]
pub struct ArgPack<'p, 'a> {
    args: &'p [Arg<'a>],
    next: usize,
}

impl<'p, 'a> ArgPack<'p, 'a> {
    #[must_use]
    pub const fn new(args: &'p [Arg<'a>]) -> Self {
        Self { args, next: 0 }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'p Arg<'a>> {
        self.args.get(index)
    }

    /// Arguments not yet consumed by a directive.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.args.len() - self.next
    }

    /// Number of arguments consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.next
    }

    /// Take the next argument. Each argument is handed out at most once.
    pub fn next_arg(&mut self) -> Option<&'p Arg<'a>> {
        let arg = self.args.get(self.next)?;
        self.next += 1;
        Some(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_classify_by_width_and_sign() {
        assert_eq!(5i8.to_arg(), Arg::I32(5));
        assert_eq!((-5i16).to_arg(), Arg::I32(-5));
        assert_eq!(7i32.to_arg(), Arg::I32(7));
        assert_eq!(200u8.to_arg(), Arg::U32(200));
        assert_eq!(60000u16.to_arg(), Arg::U32(60000));
        assert_eq!(u32::MAX.to_arg(), Arg::U32(u32::MAX));
        assert_eq!(i64::MIN.to_arg(), Arg::I64(i64::MIN));
        assert_eq!(u64::MAX.to_arg(), Arg::U64(u64::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn pointer_sized_integers_are_64_bit() {
        assert_eq!(3isize.to_arg().tag(), ArgTag::I64);
        assert_eq!(3usize.to_arg().tag(), ArgTag::U64);
    }

    #[test]
    fn floats_widen_to_double() {
        assert_eq!(1.5f32.to_arg(), Arg::F64(1.5));
        assert_eq!(2.25f64.to_arg(), Arg::F64(2.25));
    }

    #[test]
    fn text_shapes() {
        let owned = String::from("abc");
        assert_eq!("abc".to_arg(), Arg::CStr(b"abc"));
        assert_eq!(owned.to_arg(), Arg::CStr(b"abc"));
        assert_eq!((&&owned).to_arg(), Arg::CStr(b"abc"));
        let c = CString::new("xy").unwrap();
        assert_eq!(c.to_arg(), Arg::CStr(b"xy"));
        let wide: Vec<u16> = "hé".encode_utf16().collect();
        assert_eq!(wide.to_arg().tag(), ArgTag::WStr);
    }

    #[test]
    fn pointers_keep_address_only() {
        let value = 17u32;
        let p: *const u32 = &value;
        assert_eq!(p.to_arg(), Arg::Pointer(p.addr()));
        let null: *mut u8 = std::ptr::null_mut();
        assert_eq!(null.to_arg(), Arg::Pointer(0));
    }

    #[test]
    fn unit_is_null() {
        assert_eq!(().to_arg(), Arg::Null);
        assert_eq!(Arg::default(), Arg::Null);
    }

    #[test]
    fn c_bytes_stops_at_nul() {
        let arg = Arg::CStr(b"abc\0def");
        assert_eq!(arg.c_bytes(), Some(&b"abc"[..]));
        assert_eq!(Arg::I32(1).c_bytes(), None);
    }

    #[test]
    fn wide_decoding_stops_at_nul_and_replaces_surrogates() {
        let units = [0x68, 0xD800, 0x69, 0, 0x6A];
        assert_eq!(decode_wide(&units), "h\u{FFFD}i");
    }

    #[test]
    fn tag_names_are_distinct() {
        let mut names: Vec<_> = ArgTag::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ArgTag::ALL.len());
    }

    #[test]
    fn pack_hands_out_each_argument_once() {
        let args = [Arg::I32(1), Arg::CStr(b"x")];
        let mut pack = ArgPack::new(&args);
        assert_eq!(pack.len(), 2);
        assert_eq!(pack.remaining(), 2);
        assert_eq!(pack.next_arg(), Some(&Arg::I32(1)));
        assert_eq!(pack.consumed(), 1);
        assert_eq!(pack.next_arg(), Some(&Arg::CStr(b"x")));
        assert_eq!(pack.next_arg(), None);
        assert_eq!(pack.remaining(), 0);
        assert_eq!(pack.get(0), Some(&Arg::I32(1)));
    }

    #[test]
    fn empty_pack() {
        let pack = ArgPack::new(&[]);
        assert!(pack.is_empty());
        assert_eq!(pack.remaining(), 0);
    }
}
