//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - Label PDF fixtures
//! - Inspection of laid out output pages
//! - A scripted HTTP transport

#![allow(dead_code)]

pub mod fixtures;
pub mod inspect;
pub mod mocks;

pub use fixtures::*;
pub use inspect::*;
pub use mocks::*;
