//! Listening socket factory.
//!
//! # Responsibilities
//! - Create a TCP socket of the family implied by the address text
//! - Make it non-blocking before any option or bind
//! - Apply declarative options, bind and listen
//! - Close the descriptor if any step fails
//!
//! # Design Decisions
//! - The descriptor stays in a [`ProvisionalFd`] until `listen()` succeeds
//! - Transport/family tags are labels for observability only

use std::fmt;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::fd::flags::set_nonblocking;
use crate::fd::guard::ProvisionalFd;
use crate::net::bind::{bind_socket, AddressFamily};
use crate::net::options::{apply_socket_options, SocketOptions};
use crate::net::peer::{local_address, PeerInfo};

/// Transport label of a provisioned socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound, listening, non-blocking socket.
///
/// Dropping the value closes the descriptor; use [`into_raw_fd`] to take it
/// over instead.
///
/// [`into_raw_fd`]: IntoRawFd::into_raw_fd
#[derive(Debug)]
pub struct ListeningSocket {
    fd: OwnedFd,
    transport: Transport,
    family: AddressFamily,
}

impl ListeningSocket {
    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Resolve the address the socket is bound to.
    ///
    /// Useful after binding port 0 to learn the port the kernel picked.
    pub fn local_address(&self) -> Result<PeerInfo> {
        local_address(self.fd.as_raw_fd())
    }
}

impl AsRawFd for ListeningSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for ListeningSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl IntoRawFd for ListeningSocket {
    fn into_raw_fd(self) -> RawFd {
        self.fd.into_raw_fd()
    }
}

impl From<ListeningSocket> for OwnedFd {
    fn from(socket: ListeningSocket) -> Self {
        socket.fd
    }
}

/// Create, configure, bind and listen on a TCP socket for `address:port`.
pub fn create_listening_socket(
    address: &str,
    port: u16,
    opts: &SocketOptions,
) -> Result<ListeningSocket> {
    let family = AddressFamily::infer(address);

    // SAFETY: plain socket(2) call; the result is checked before use.
    let raw = unsafe { libc::socket(family.domain(), libc::SOCK_STREAM, libc::IPPROTO_TCP) };
    if raw < 0 {
        return Err(Error::last_os_error("socket()"));
    }

    // SAFETY: `raw` was just returned by socket() and is owned by nobody else.
    let sock = unsafe { ProvisionalFd::from_raw(raw) };
    let fd = sock.as_raw_fd();

    set_nonblocking(fd)?;
    apply_socket_options(fd, opts)?;
    bind_socket(fd, address, port)?;

    // SAFETY: listen(2) on a descriptor we own.
    if unsafe { libc::listen(fd, opts.listen_backlog) } == -1 {
        return Err(Error::last_os_error("listen()"));
    }

    tracing::debug!(
        fd,
        address,
        port,
        family = %family,
        backlog = opts.listen_backlog,
        "Listening socket created"
    );

    Ok(ListeningSocket {
        fd: sock.commit(),
        transport: Transport::Tcp,
        family,
    })
}
