//! Utility modules

pub mod filename;
