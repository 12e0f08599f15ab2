//! mcc C front end - Common Types and Utilities
//!
//! This crate contains the shared error type used across all components
//! of the mcc front end.

pub mod error;

pub use error::CompilerError;
