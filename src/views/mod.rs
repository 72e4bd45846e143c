//! State behind each tool, kept apart from terminal I/O.

pub mod chat;
pub mod document;
pub mod quiz;
