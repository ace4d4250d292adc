//! Core definitions (errors, results and helper macros), relied upon by all sakubiki-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
