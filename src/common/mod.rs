//! Common types and abstractions
//!
//! - Address: network address representation and resolution
//! - Error: unified error types

mod address;

pub use address::Address;

// Re-export error types from crate root
pub use crate::error::{Error, Result};
