//! Call-site macros.
//!
//! Each argument expression is classified through [`ToArg`](crate::ToArg)
//! where it is written, so the argument list is checked at compile time and
//! borrowed for the duration of the call.

/// Build an argument array from expressions.
///
/// ```
/// let args = tsf_core::args!(1u8, "two", 3.0);
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        [$($crate::ToArg::to_arg(&$arg)),*]
    };
}

/// Format into a `String`: `tsf!("%s=%d", key, value)`.
#[macro_export]
macro_rules! tsf {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::format($fmt, &$crate::args!($($arg),*))
    };
}

/// Format into a caller buffer: `tsf_into!(&mut buf, "%d", n)`.
#[macro_export]
macro_rules! tsf_into {
    ($buf:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::format_into($buf, $fmt, &$crate::args!($($arg),*))
    };
}

/// Format to an `io::Write`: `tsf_write!(writer, "%s\n", line)`.
///
/// The writer is borrowed, not consumed.
#[macro_export]
macro_rules! tsf_write {
    ($w:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::print(&mut $w, $fmt, &$crate::args!($($arg),*))
    };
}

/// Format to standard output.
#[macro_export]
macro_rules! tsf_print {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::print(::std::io::stdout().lock(), $fmt, &$crate::args!($($arg),*))
    };
}

#[cfg(test)]
mod tests {
    use crate::Arg;

    #[test]
    fn args_classifies_each_expression() {
        let name = String::from("x");
        let args = args!(name, 5i64, (), b"raw");
        assert_eq!(
            args,
            [Arg::CStr(b"x"), Arg::I64(5), Arg::Null, Arg::CStr(b"raw")]
        );
        let empty: [Arg<'_>; 0] = args!();
        assert!(empty.is_empty());
    }

    #[test]
    fn tsf_formats() {
        assert_eq!(tsf!("%v %v", "abc", 123).unwrap(), "abc 123");
        assert_eq!(tsf!("no args").unwrap(), "no args");
        assert_eq!(tsf!("%d,", 1,).unwrap(), "1,");
    }

    #[test]
    fn tsf_into_uses_caller_buffer() {
        let mut buf = [0u8; 32];
        let out = tsf_into!(&mut buf, "%x", 255).unwrap();
        assert!(out.is_borrowed());
        assert_eq!(out.as_bytes(), b"ff");
    }

    #[test]
    fn tsf_write_borrows_writer() {
        let mut sink: Vec<u8> = Vec::new();
        tsf_write!(sink, "%s", "a").unwrap();
        tsf_write!(sink, "%d", 2).unwrap();
        assert_eq!(sink, b"a2");
    }
}
