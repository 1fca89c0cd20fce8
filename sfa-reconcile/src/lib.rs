//! sfa-reconcile library
//!
//! Reconciles a record catalog against the audio folder it describes:
//! suffix inference, expected-vs-actual diff, confidence-scored repair
//! suggestions, and batch execution with an identity-tracked history.

pub mod catalog;
pub mod config;
pub mod error;
pub mod mapping;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::config::ProjectContext;
pub use crate::error::{ReconcileError, Result};
pub use crate::mapping::{MappingError, SuffixMapping};
