//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! fd / net subsystems emit tracing events
//!     (fd, address, port, family, peer fields)
//!     → logging.rs (subscriber with env filter)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing a subscriber is left to the binary
//! - RUST_LOG overrides the configured level

pub mod logging;

pub use logging::init_logging;
