//! Error types for the formatting engine.
//!
//! Malformed format strings never produce an error: unsupported directives
//! degrade to literal text. Only resource exhaustion and stream failures
//! surface here.

use std::collections::TryReserveError;

/// Hard failures of a formatting call.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Growing the output buffer failed.
    #[error("out of memory growing output buffer to {requested} bytes")]
    OutOfMemory {
        requested: usize,
        #[source]
        source: Option<TryReserveError>,
    },
    /// Writing the rendered output to a stream failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub(crate) fn out_of_memory(requested: usize, source: Option<TryReserveError>) -> Self {
        Self::OutOfMemory { requested, source }
    }
}
