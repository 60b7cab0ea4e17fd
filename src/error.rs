//! All error types for the mocat crate.
//!
//! These are returned from the fallible operations (opening a catalog,
//! loading its tables, the `try_*` lookups). Missing translations are never
//! errors; see the crate docs for the degradation rules.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated read: requested {requested} bytes at offset {offset}")]
    TruncatedRead { offset: u64, requested: usize },

    #[error("translation is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
