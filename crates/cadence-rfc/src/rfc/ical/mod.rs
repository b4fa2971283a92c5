//! iCalendar recurrence support (RFC 5545 §3.3.10, RFC 7529).
//!
//! - `core`: value types and the rule model
//! - `parse` / `build`: text to model and back
//! - `calendar`: calendar scale arithmetic
//! - `expand`: the generation pipeline and its cursor

pub mod build;
pub mod calendar;
pub mod core;
pub mod expand;
pub mod parse;

#[cfg(test)]
mod tests;
