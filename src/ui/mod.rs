//! Terminal presentation

pub mod console;
