//! Cross-module tests for parsing, serialization and expansion.
