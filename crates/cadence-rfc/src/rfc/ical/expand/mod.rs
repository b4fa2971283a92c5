//! Recurrence expansion (RFC 5545 §3.3.10, RFC 7529).
//!
//! - `table`: the BY-part dispatch table
//! - `pipeline`: per-step candidate generation
//! - `until`: end bound normalization
//! - `iterator`: the public cursor

mod iterator;
mod pipeline;
mod table;
mod until;

pub use iterator::{IterOptions, RecurrenceIterator};
