//! Shared test utilities for the PDFMill client.
//!
//! This crate provides:
//! - Proptest generators for credentials and rendering options
//! - Wiremock mounting helpers for the token and rendering endpoints
//! - Test fixtures with sample data

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
