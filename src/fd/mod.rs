//! Descriptor subsystem.
//!
//! # Data Flow
//! ```text
//! socket() / accept()
//!     → guard.rs (provisional ownership, closed on failure)
//!     → flags.rs (O_NONBLOCK, FD_CLOEXEC)
//!     → commit into an owning result value
//! ```
//!
//! # Design Decisions
//! - Flag setters read-modify-write so existing flags survive
//! - Every raw descriptor lives inside a guard until construction completes

pub mod flags;
pub mod guard;

pub use flags::{is_close_on_exec, is_nonblocking, set_close_on_exec, set_nonblocking};
pub use guard::ProvisionalFd;
