//! Test utilities and helpers for the sakubiki crates.
//!
//! This crate provides:
//! - Deterministic generation of sample documents
//! - Temporary index directories
//!
//! # Usage
//!
//! This crate is intended for use within the sakubiki test suites and
//! development tools only.

pub mod data_gen;
pub mod dirs;
