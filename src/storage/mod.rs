//! Storage modules: config, history

pub mod config;
pub mod history;
