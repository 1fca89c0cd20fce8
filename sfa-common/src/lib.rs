//! # SFA Common Library
//!
//! Shared code for the sound file association tools:
//! - Error type
//! - Bootstrap configuration loading
//! - Conditional rule definitions
//! - Time and id helpers

pub mod config;
pub mod error;
pub mod rules;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
