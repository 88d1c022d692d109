//! I/O helpers for the operator tools.

pub mod dir_source;
pub mod document_store;
pub mod interrupt;
pub mod marker;
pub mod prompt;
pub mod restart;
pub mod settings;
