//! # tsf-core
//!
//! A small, type-safe printf replacement.
//!
//! Every argument is classified into a tagged [`Arg`] at the call site, so a
//! format string can never read a value as the wrong type: a directive that
//! disagrees with its argument is retyped to the argument's natural
//! conversion instead. Plain integers and strings bypass the generic backend,
//! and output goes into a caller-supplied buffer that is only promoted to the
//! heap when it overflows.
//!
//! ```
//! use tsf_core::tsf;
//!
//! assert_eq!(tsf!("%v %v", "abc", 123).unwrap(), "abc 123");
//! assert_eq!(tsf!("%s %d", "abc", 123).unwrap(), "abc 123");
//! assert_eq!(tsf!("%.3f", 25.5).unwrap(), "25.500");
//! assert_eq!(tsf!("%d", "not a number").unwrap(), "not a number");
//! ```
//!
//! Known unsupported features: positional arguments and runtime widths
//! (`%*d`). The `*` is dropped and the directive is rendered without it.
//!
//! No `unsafe` code is permitted in this crate.

#![deny(unsafe_code)]

pub mod arg;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod escape;
pub mod format;
pub mod integer;
mod macros;

pub use arg::{Arg, ArgPack, ArgTag, ToArg};
pub use buffer::{Formatted, OutputBuffer};
pub use config::FormatConfig;
pub use error::FormatError;
pub use escape::EscapeContext;
pub use format::{Formatter, format, format_bytes, format_into, print};
