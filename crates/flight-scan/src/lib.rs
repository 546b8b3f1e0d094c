//! # Flight Scan
//!
//! Core types and logic for monitoring reward-flight availability:
//! calendar-window scanning over sparse per-date availability maps,
//! cabin-class filtering, and duplicate-notification debouncing.

/// Types for flight availability, routes, and scan errors
mod types;
pub use types::*;

/// Calendar-window scanning and cabin-class filtering
mod scanner;
pub use scanner::*;

/// Duplicate-notification suppression
mod debounce;
pub use debounce::*;
