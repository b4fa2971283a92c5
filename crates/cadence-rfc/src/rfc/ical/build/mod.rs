//! Recurrence rule serialization (RFC 5545 §3.3.10).
//!
//! Output is canonical: parts appear in a fixed order and values equal to
//! their default are left out, so equal rules always serialize identically.

mod serializer;

pub use serializer::serialize;
