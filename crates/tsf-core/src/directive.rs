//! Directive grammar and argument retyping.
//!
//! A directive is `%`, a body of flag/width/precision/length bytes, and one
//! conversion letter. Before rendering, the requested letter is reconciled
//! with the argument's tag: letters the tag cannot honor are replaced by the
//! tag's natural conversion, so an argument is never read as the wrong type.

use crate::arg::ArgTag;

/// Raw directives this long or longer are copied through as literal text.
pub const MAX_SPEC_LEN: usize = 16;

/// Bytes that may appear between `%` and the conversion letter.
#[must_use]
pub const fn is_body_byte(b: u8) -> bool {
    matches!(
        b,
        b'-' | b'+'
            | b' '
            | b'#'
            | b'0'..=b'9'
            | b'.'
            | b'*'
            | b'h'
            | b'l'
            | b'L'
            | b'j'
            | b'z'
            | b't'
            | b'w'
            | b'I'
    )
}

/// Letters that terminate a directive.
#[must_use]
pub const fn is_conversion_letter(b: u8) -> bool {
    matches!(
        b,
        b'a' | b'A'
            | b'c'
            | b'C'
            | b'd'
            | b'i'
            | b'e'
            | b'E'
            | b'f'
            | b'g'
            | b'G'
            | b'H'
            | b'o'
            | b's'
            | b'S'
            | b'u'
            | b'x'
            | b'X'
            | b'p'
            | b'n'
            | b'v'
            | b'q'
            | b'Q'
    )
}

/// Per tag: the requested letters it honors, and its natural letter.
/// Order matches [`ArgTag::ALL`].
const RETYPE_TABLE: [(ArgTag, &[u8], u8); 9] = [
    (ArgTag::Null, b"", b's'),
    (ArgTag::Pointer, b"", b'p'),
    (ArgTag::CStr, b"", b's'),
    (ArgTag::WStr, b"", b's'),
    (ArgTag::I32, b"cdiouxX", b'd'),
    (ArgTag::U32, b"diouxX", b'u'),
    (ArgTag::I64, b"diouxX", b'd'),
    (ArgTag::U64, b"diouxX", b'u'),
    (ArgTag::F64, b"aAeEfgG", b'g'),
];

fn entry(tag: ArgTag) -> &'static (ArgTag, &'static [u8], u8) {
    &RETYPE_TABLE[tag as usize]
}

/// The conversion a tag renders with when the directive is `%v` or
/// disagrees with it.
#[must_use]
pub fn natural_conversion(tag: ArgTag) -> u8 {
    entry(tag).2
}

/// The conversion actually used for `requested` applied to `tag`.
#[must_use]
pub fn effective_conversion(tag: ArgTag, requested: u8) -> u8 {
    let (_, honored, natural) = *entry(tag);
    if honored.contains(&requested) {
        requested
    } else {
        natural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_tag() {
        for (tag, row) in ArgTag::ALL.iter().zip(RETYPE_TABLE.iter()) {
            assert_eq!(*tag, row.0);
        }
    }

    #[test]
    fn integers_keep_integer_letters() {
        assert_eq!(effective_conversion(ArgTag::I32, b'x'), b'x');
        assert_eq!(effective_conversion(ArgTag::U64, b'o'), b'o');
        assert_eq!(effective_conversion(ArgTag::I32, b'c'), b'c');
        assert_eq!(effective_conversion(ArgTag::U32, b'c'), b'u');
        assert_eq!(effective_conversion(ArgTag::I64, b'f'), b'd');
        assert_eq!(effective_conversion(ArgTag::U32, b's'), b'u');
    }

    #[test]
    fn mismatches_fall_back_to_natural_letter() {
        assert_eq!(effective_conversion(ArgTag::CStr, b'd'), b's');
        assert_eq!(effective_conversion(ArgTag::WStr, b'S'), b's');
        assert_eq!(effective_conversion(ArgTag::Pointer, b'x'), b'p');
        assert_eq!(effective_conversion(ArgTag::F64, b'd'), b'g');
        assert_eq!(effective_conversion(ArgTag::F64, b'e'), b'e');
        assert_eq!(effective_conversion(ArgTag::Null, b'd'), b's');
    }

    #[test]
    fn generic_value_directive() {
        for tag in ArgTag::ALL {
            assert_eq!(effective_conversion(tag, b'v'), natural_conversion(tag));
        }
    }

    #[test]
    fn grammar() {
        for b in b"-+ #0123456789.*hlLjztwI" {
            assert!(is_body_byte(*b), "{}", *b as char);
            assert!(!is_conversion_letter(*b));
        }
        for b in b"aAcCdieEfgGHosSuxXpnvqQ" {
            assert!(is_conversion_letter(*b), "{}", *b as char);
        }
        assert!(!is_conversion_letter(b'y'));
        assert!(!is_conversion_letter(b'F'));
        assert!(!is_body_byte(b'y'));
        assert!(!is_conversion_letter(b'%'));
    }
}
