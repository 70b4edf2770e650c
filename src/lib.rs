//! tunwire - Pluggable datagram transport and payload obfuscation
//!
//! # Architecture
//!
//! ```text
//! plaintext → Obfuscator (encode) → Transport (write) → wire
//! wire → Transport (read) → Obfuscator (decode) → plaintext
//! ```
//!
//! ## Core Principles
//!
//! - Transport and obfuscator never call each other
//! - Both are trait objects picked from a registry by configured type
//! - Options are decoded into typed records once, at `open`
//! - The only shared contract is numeric: obfuscator capacity fits the MTU
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── common/          # Address parsing and resolution
//! ├── transport/       # Transport layer: UDP
//! ├── obfs/            # Obfuscation layer: XOR, plain
//! └── app/             # Link, Runtime
//! ```

// Core types
pub mod common;
pub mod error;

// Layered architecture
pub mod transport;
pub mod obfs;
pub mod app;

// Supporting modules
pub mod config;

// Re-exports for convenience
pub use common::Address;
pub use error::{Error, Result};
pub use config::Config;

// Architecture re-exports
pub use app::{Link, Runtime};
pub use obfs::{create_obfuscator, ObfsKind, Obfuscator};
pub use transport::{create_transport, Mode, Transport, TransportKind};
