//! Test Helper Utilities
//!
//! Shared utilities for testing jalsevak-ai

#![allow(dead_code)]

pub mod fakes;
pub mod log_capture;

pub use fakes::{FakeModel, FakeTranslator};
pub use log_capture::{capture_logs, LogCapture};
