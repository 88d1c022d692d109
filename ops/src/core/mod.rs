//! Deterministic, pure logic shared by both tools.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod document;
pub mod marker;
pub mod sweep_plan;
pub mod table;
