//! # JalSevak Common Library
//!
//! Shared code for the JalSevak services:
//! - Error type
//! - TOML bootstrap configuration and API key resolution
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
