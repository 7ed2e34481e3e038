//! Address family inference, text-to-binary conversion and bind.
//!
//! # Responsibilities
//! - Pick IPv4 or IPv6 from the address text alone
//! - Convert text with `inet_pton`, separating bad input from OS failure
//! - Bind a descriptor with the port in network byte order
//!
//! # Design Decisions
//! - A colon anywhere in the text routes to IPv6. This is a syntactic
//!   heuristic, not validation: `"1.2.3.4:80"` is treated as an IPv6 literal
//!   and rejected as such.

use std::ffi::CString;
use std::fmt;
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::os::fd::RawFd;

use serde::Serialize;

use super::inet;
use crate::error::{Error, Result};

/// Network type of a socket, as inferred from its textual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Infer the family from address syntax: a colon means IPv6.
    pub fn infer(address: &str) -> Self {
        if address.contains(':') {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }

    /// The `AF_*` constant used for `socket()` and `inet_pton()`.
    pub fn domain(self) -> libc::c_int {
        match self {
            AddressFamily::Ipv4 => libc::AF_INET,
            AddressFamily::Ipv6 => libc::AF_INET6,
        }
    }

    /// Observability label ("ipv4" / "ipv6").
    pub fn as_str(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "ipv4",
            AddressFamily::Ipv6 => "ipv6",
        }
    }

    fn domain_name(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "AF_INET",
            AddressFamily::Ipv6 => "AF_INET6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn inet_pton(family: AddressFamily, address: &str, dst: *mut libc::c_void) -> Result<()> {
    let invalid = || Error::InvalidAddress {
        family,
        address: address.to_owned(),
    };

    // An interior NUL can never be part of a valid literal.
    let text = CString::new(address).map_err(|_| invalid())?;

    // SAFETY: `text` is NUL-terminated and the callers pass `dst` pointing at
    // an `in_addr`/`in6_addr` that matches `family`.
    match unsafe { inet::inet_pton(family.domain(), text.as_ptr(), dst) } {
        1 => Ok(()),
        0 => Err(invalid()),
        _ => Err(Error::last_os_error(format!(
            "inet_pton({}, {})",
            family.domain_name(),
            address
        ))),
    }
}

/// Convert an IPv4 literal to its binary form.
///
/// Fails with [`Error::InvalidAddress`] when the text is not a valid IPv4
/// address and with [`Error::System`] when the platform does not support the
/// family.
pub fn parse_ipv4(address: &str) -> Result<Ipv4Addr> {
    let mut dst = libc::in_addr { s_addr: 0 };
    inet_pton(
        AddressFamily::Ipv4,
        address,
        &mut dst as *mut libc::in_addr as *mut libc::c_void,
    )?;
    Ok(Ipv4Addr::from(u32::from_be(dst.s_addr)))
}

/// Convert an IPv6 literal to its binary form.
///
/// Same error split as [`parse_ipv4`].
pub fn parse_ipv6(address: &str) -> Result<Ipv6Addr> {
    let mut dst = libc::in6_addr { s6_addr: [0; 16] };
    inet_pton(
        AddressFamily::Ipv6,
        address,
        &mut dst as *mut libc::in6_addr as *mut libc::c_void,
    )?;
    Ok(Ipv6Addr::from(dst.s6_addr))
}

fn bind_raw<T>(fd: RawFd, sockaddr: &T, address: &str, port: u16) -> Result<()> {
    // SAFETY: `sockaddr` is a fully initialised sockaddr_in/sockaddr_in6 and
    // the length passed is exactly its size.
    let res = unsafe {
        libc::bind(
            fd,
            sockaddr as *const T as *const libc::sockaddr,
            mem::size_of::<T>() as libc::socklen_t,
        )
    };
    if res < 0 {
        return Err(Error::last_os_error(format!("bind({address}:{port})")));
    }
    Ok(())
}

fn bind_ipv4(fd: RawFd, address: &str, port: u16) -> Result<()> {
    let ip = parse_ipv4(address)?;

    // SAFETY: sockaddr_in is plain old data; all-zero is a valid value.
    let mut sin: libc::sockaddr_in = unsafe { mem::zeroed() };
    sin.sin_family = libc::AF_INET as libc::sa_family_t;
    sin.sin_port = port.to_be();
    sin.sin_addr = libc::in_addr {
        s_addr: u32::from(ip).to_be(),
    };

    bind_raw(fd, &sin, address, port)
}

fn bind_ipv6(fd: RawFd, address: &str, port: u16) -> Result<()> {
    let ip = parse_ipv6(address)?;

    // SAFETY: sockaddr_in6 is plain old data; all-zero is a valid value.
    let mut sin6: libc::sockaddr_in6 = unsafe { mem::zeroed() };
    sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
    sin6.sin6_port = port.to_be();
    sin6.sin6_addr = libc::in6_addr {
        s6_addr: ip.octets(),
    };

    bind_raw(fd, &sin6, address, port)
}

/// Bind `fd` to `address:port`, choosing the family from the address text.
pub fn bind_socket(fd: RawFd, address: &str, port: u16) -> Result<()> {
    match AddressFamily::infer(address) {
        AddressFamily::Ipv4 => bind_ipv4(fd, address, port)?,
        AddressFamily::Ipv6 => bind_ipv6(fd, address, port)?,
    }

    tracing::debug!(fd, address, port, "Socket bound");
    Ok(())
}
