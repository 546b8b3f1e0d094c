//! # Reward API
//!
//! HTTP client for the third-party reward-flight calendar-availability
//! feed, with per-request proxy routing.

/// Feed client and request construction
mod client;
pub use client::*;
