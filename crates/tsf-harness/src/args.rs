//! Owned argument specs.
//!
//! Fixtures and the CLI describe arguments as `kind:value` strings, e.g.
//! `i32:-5`, `u64:0xff`, `str:hello`, `ptr:0x1000` or `null`. Text values
//! accept the escapes `\\`, `\n`, `\t` and `\0`.

use std::str::FromStr;

use tsf_core::{Arg, ArgTag};

/// A parsed argument that owns its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSpec {
    Null,
    Ptr(usize),
    Str(Vec<u8>),
    WStr(Vec<u16>),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
}

/// Errors from parsing a `kind:value` argument spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgSpecError {
    #[error("argument {0:?} has no `kind:` prefix")]
    MissingKind(String),
    #[error("unknown argument kind {0:?}, expected one of i32 u32 i64 u64 f64 str wstr ptr null")]
    UnknownKind(String),
    #[error("invalid {kind} value {value:?}")]
    InvalidValue { kind: &'static str, value: String },
    #[error("unsupported escape sequence in {0:?}")]
    BadEscape(String),
}

impl ArgSpec {
    /// The engine tag this spec produces.
    #[must_use]
    pub fn tag(&self) -> ArgTag {
        self.as_arg().tag()
    }

    /// Borrow as an engine argument.
    #[must_use]
    pub fn as_arg(&self) -> Arg<'_> {
        match self {
            ArgSpec::Null => Arg::Null,
            ArgSpec::Ptr(addr) => Arg::Pointer(*addr),
            ArgSpec::Str(bytes) => Arg::CStr(bytes),
            ArgSpec::WStr(units) => Arg::WStr(units),
            ArgSpec::I32(v) => Arg::I32(*v),
            ArgSpec::U32(v) => Arg::U32(*v),
            ArgSpec::I64(v) => Arg::I64(*v),
            ArgSpec::U64(v) => Arg::U64(*v),
            ArgSpec::F64(v) => Arg::F64(*v),
        }
    }

    /// Parse a list of specs, stopping at the first error.
    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Vec<ArgSpec>, ArgSpecError> {
        specs.iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl FromStr for ArgSpec {
    type Err = ArgSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "null" {
            return Ok(ArgSpec::Null);
        }
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| ArgSpecError::MissingKind(s.to_string()))?;
        let tag = ArgTag::ALL
            .into_iter()
            .find(|tag| tag.name() == kind)
            .ok_or_else(|| ArgSpecError::UnknownKind(kind.to_string()))?;
        let invalid = || ArgSpecError::InvalidValue {
            kind: tag.name(),
            value: value.to_string(),
        };

        Ok(match tag {
            ArgTag::Null => ArgSpec::Null,
            ArgTag::Pointer => ArgSpec::Ptr(parse_integer(value).ok_or_else(invalid)?),
            ArgTag::CStr => ArgSpec::Str(unescape(value)?.into_bytes()),
            ArgTag::WStr => ArgSpec::WStr(unescape(value)?.encode_utf16().collect()),
            ArgTag::I32 => ArgSpec::I32(parse_integer(value).ok_or_else(invalid)?),
            ArgTag::U32 => ArgSpec::U32(parse_integer(value).ok_or_else(invalid)?),
            ArgTag::I64 => ArgSpec::I64(parse_integer(value).ok_or_else(invalid)?),
            ArgTag::U64 => ArgSpec::U64(parse_integer(value).ok_or_else(invalid)?),
            ArgTag::F64 => ArgSpec::F64(value.trim().parse().map_err(|_| invalid())?),
        })
    }
}

/// Decimal with optional sign, or `0x` hex, range-checked for `T`.
fn parse_integer<T: TryFrom<i128>>(s: &str) -> Option<T> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    let value = if negative { -magnitude } else { magnitude };
    T::try_from(value).ok()
}

fn unescape(s: &str) -> Result<String, ArgSpecError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            _ => return Err(ArgSpecError::BadEscape(s.to_string())),
        }
    }
    Ok(out)
}
