//! Utilities: paths, folder opening

pub mod open;
pub mod paths;
