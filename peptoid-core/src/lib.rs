//! Shared primitives, traits, and utilities for the peptoid workspace.
//!
//! `peptoid-core` is the foundation the chemistry and synthesis crates build on:
//!
//! - **Error types**: [`PeptoidError`] and [`Result`] for structured error handling
//! - **Traits**: [`Sequence`], [`Summarizable`], [`ContentAddressable`]
//! - **Hashing**: SHA-256 content addressing for assembled products

pub mod error;
pub mod hash;
pub mod traits;

pub use error::{PeptoidError, Result};
pub use traits::*;
