//! Application Layer
//!
//! This module contains:
//! - Link: one transport paired with one obfuscator
//! - Runtime: configuration-driven link construction and the echo/ping loop

mod link;
mod runtime;

pub use link::Link;
pub use runtime::{build_link, init_logging, Runtime};
