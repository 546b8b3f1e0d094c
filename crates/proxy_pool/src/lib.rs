//! # Proxy Pool
//!
//! Per-category proxy credential inventories with uniform random
//! draw-without-replacement and automatic refill from an immutable
//! backing list. Credentials are parsed from newline-delimited
//! `host:port:user:pass` lists, one file per category.

/// Credential types, line parsing, and the pool itself
mod pool;
pub use pool::*;

/// Conversions between credentials and the proxy URL form
mod format;
pub use format::*;
