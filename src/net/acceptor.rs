//! Connection acceptor.
//!
//! # Responsibilities
//! - Accept one pending connection
//! - Apply O_NONBLOCK and FD_CLOEXEC before the descriptor escapes
//! - Name the peer
//!
//! # Design Decisions
//! - No retry: EAGAIN on a non-blocking listener surfaces as an error and
//!   readiness is the caller's business
//! - The OS-reported address length is clamped to the storage size

use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};

use crate::error::{Error, Result};
use crate::fd::flags::{set_close_on_exec, set_nonblocking};
use crate::fd::guard::ProvisionalFd;
use crate::net::peer::{resolve_storage, PeerInfo};

/// An accepted connection and the peer it came from.
///
/// Dropping the value closes the descriptor.
#[derive(Debug)]
pub struct AcceptedConnection {
    fd: OwnedFd,
    peer: PeerInfo,
}

impl AcceptedConnection {
    pub fn peer(&self) -> &PeerInfo {
        &self.peer
    }

    /// Split into the owned descriptor and the peer.
    pub fn into_parts(self) -> (OwnedFd, PeerInfo) {
        (self.fd, self.peer)
    }
}

impl AsRawFd for AcceptedConnection {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for AcceptedConnection {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl IntoRawFd for AcceptedConnection {
    fn into_raw_fd(self) -> RawFd {
        self.fd.into_raw_fd()
    }
}

/// Accept a pending connection on `listening_fd`.
pub fn accept_connection(listening_fd: RawFd) -> Result<AcceptedConnection> {
    // SAFETY: all-zero is a valid sockaddr_storage.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let capacity = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let mut len = capacity;

    // SAFETY: storage/len describe a writable sockaddr_storage.
    let raw = unsafe {
        libc::accept(
            listening_fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len,
        )
    };
    if raw == -1 {
        return Err(Error::last_os_error("accept()"));
    }

    // SAFETY: `raw` was just returned by accept() and is owned by nobody else.
    let conn = unsafe { ProvisionalFd::from_raw(raw) };
    set_nonblocking(conn.as_raw_fd())?;
    set_close_on_exec(conn.as_raw_fd())?;

    let peer = resolve_storage(&storage, len.min(capacity));

    tracing::debug!(
        listening_fd,
        fd = raw,
        peer_address = %peer.address(),
        peer_port = peer.port(),
        "Connection accepted"
    );

    Ok(AcceptedConnection {
        fd: conn.commit(),
        peer,
    })
}
