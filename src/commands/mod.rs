pub mod chat;
pub mod config;
mod document;
pub mod quiz;
pub mod rewrite;
pub mod summarize;
