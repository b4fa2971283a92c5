//! Shared building blocks for the cadence workspace.
//!
//! Holds the pieces every other crate leans on without pulling in the
//! recurrence engine itself: settings loading, the core error type and the
//! compliance mode enumeration.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
