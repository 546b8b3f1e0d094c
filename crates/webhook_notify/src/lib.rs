//! # Webhook Notify
//!
//! This crate delivers flight-availability alerts to Discord webhooks.
//! The primary payload is a rich embed with per-date seat counts and
//! schedule details; when it fails, a reduced-fidelity backup payload is
//! posted to the same endpoint as a second attempt.

/// Types for webhook notifications
mod types;
pub use types::*;

/// Webhook delivery and embed construction
mod service;
pub use service::*;
