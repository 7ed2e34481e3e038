//! Error types for socket provisioning.
//!
//! Two kinds only: the caller handed us an address that does not parse, or an
//! OS call failed. Peer resolution never produces either.

use std::io;

use thiserror::Error;

use crate::net::bind::AddressFamily;

/// Error type for provisioning, binding and accepting.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The text is not a valid address of the family implied by its syntax.
    #[error("invalid {family} address: {address}")]
    InvalidAddress {
        family: AddressFamily,
        address: String,
    },

    /// An underlying OS call failed.
    #[error("{operation} failed")]
    System {
        operation: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an OS error with the name of the operation that produced it.
    pub fn system(operation: impl Into<String>, source: io::Error) -> Self {
        Error::System {
            operation: operation.into(),
            source,
        }
    }

    /// Capture `errno` for the operation that just failed.
    pub(crate) fn last_os_error(operation: impl Into<String>) -> Self {
        Self::system(operation, io::Error::last_os_error())
    }

    /// OS error code carried by a system failure.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::System { source, .. } => source.raw_os_error(),
            Error::InvalidAddress { .. } => None,
        }
    }

    /// Name of the failed operation, if this is a system failure.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Error::System { operation, .. } => Some(operation),
            Error::InvalidAddress { .. } => None,
        }
    }

    pub fn is_invalid_address(&self) -> bool {
        matches!(self, Error::InvalidAddress { .. })
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Error::System { .. })
    }
}
