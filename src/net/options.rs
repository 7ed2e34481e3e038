//! Declarative socket options.
//!
//! # Responsibilities
//! - Describe the options a listening socket is created with
//! - Apply them as a sequence of `setsockopt`/`fcntl` calls
//!
//! A zero or false field means "leave the OS default", never "disable".

use std::mem;
use std::os::fd::RawFd;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fd::flags::set_close_on_exec;

/// Options applied to a socket before it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SocketOptions {
    /// Mark the descriptor close-on-exec.
    pub close_on_exec: bool,

    /// `SO_REUSEADDR`: allow rebinding an address still in TIME_WAIT.
    pub reuse_addr: bool,

    /// `IP_FREEBIND`: allow binding to a non-local address.
    pub free_bind: bool,

    /// `TCP_DEFER_ACCEPT` timeout in seconds (0 = disabled).
    pub defer_accept_timeout: u32,

    /// Pending-connection queue length passed to `listen()`.
    pub listen_backlog: i32,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            close_on_exec: false,
            reuse_addr: false,
            free_bind: false,
            defer_accept_timeout: 0,
            listen_backlog: libc::SOMAXCONN,
        }
    }
}

/// Set an integer socket option, naming it in the error on failure.
pub fn set_socket_option(
    fd: RawFd,
    level: libc::c_int,
    name: libc::c_int,
    value: libc::c_int,
    label: &str,
) -> Result<()> {
    // SAFETY: `value` outlives the call and the length matches its type.
    let res = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            &value as *const libc::c_int as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if res != 0 {
        return Err(Error::last_os_error(format!("setsockopt({label})")));
    }
    Ok(())
}

/// Read back an integer socket option.
pub fn get_socket_option(
    fd: RawFd,
    level: libc::c_int,
    name: libc::c_int,
    label: &str,
) -> Result<libc::c_int> {
    let mut value: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>() as libc::socklen_t;
    // SAFETY: `value` and `len` describe a writable c_int buffer.
    let res = unsafe {
        libc::getsockopt(
            fd,
            level,
            name,
            &mut value as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    };
    if res != 0 {
        return Err(Error::last_os_error(format!("getsockopt({label})")));
    }
    Ok(value)
}

/// Apply every enabled option in `opts` to `fd`.
pub fn apply_socket_options(fd: RawFd, opts: &SocketOptions) -> Result<()> {
    if opts.close_on_exec {
        set_close_on_exec(fd)?;
    }

    if opts.reuse_addr {
        set_socket_option(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, 1, "SO_REUSEADDR")?;
    }

    if opts.free_bind {
        set_socket_option(fd, libc::IPPROTO_IP, libc::IP_FREEBIND, 1, "IP_FREEBIND")?;
    }

    if opts.defer_accept_timeout != 0 {
        let timeout = libc::c_int::try_from(opts.defer_accept_timeout).unwrap_or(libc::c_int::MAX);
        set_socket_option(
            fd,
            libc::IPPROTO_TCP,
            libc::TCP_DEFER_ACCEPT,
            timeout,
            "TCP_DEFER_ACCEPT",
        )?;
    }

    tracing::trace!(fd, ?opts, "Socket options applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::flags::is_close_on_exec;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    fn tcp_socket() -> OwnedFd {
        // SAFETY: plain socket(2); ownership moves into OwnedFd immediately.
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM, libc::IPPROTO_TCP) };
        assert!(fd >= 0);
        unsafe { OwnedFd::from_raw_fd(fd) }
    }

    #[test]
    fn defaults_leave_everything_alone() {
        let opts = SocketOptions::default();
        assert!(!opts.close_on_exec);
        assert!(!opts.reuse_addr);
        assert!(!opts.free_bind);
        assert_eq!(opts.defer_accept_timeout, 0);
        assert_eq!(opts.listen_backlog, libc::SOMAXCONN);

        let sock = tcp_socket();
        let fd = sock.as_raw_fd();
        apply_socket_options(fd, &opts).unwrap();
        assert_eq!(
            get_socket_option(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, "SO_REUSEADDR").unwrap(),
            0
        );
        assert!(!is_close_on_exec(fd).unwrap());
    }

    #[test]
    fn enabled_options_are_applied() {
        let opts = SocketOptions {
            close_on_exec: true,
            reuse_addr: true,
            free_bind: true,
            defer_accept_timeout: 5,
            listen_backlog: 16,
        };
        let sock = tcp_socket();
        let fd = sock.as_raw_fd();
        apply_socket_options(fd, &opts).unwrap();

        assert!(is_close_on_exec(fd).unwrap());
        assert_eq!(
            get_socket_option(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, "SO_REUSEADDR").unwrap(),
            1
        );
        assert_eq!(
            get_socket_option(fd, libc::IPPROTO_IP, libc::IP_FREEBIND, "IP_FREEBIND").unwrap(),
            1
        );
        // The kernel rounds the timeout to retransmission intervals.
        assert_ne!(
            get_socket_option(fd, libc::IPPROTO_TCP, libc::TCP_DEFER_ACCEPT, "TCP_DEFER_ACCEPT")
                .unwrap(),
            0
        );
    }

    #[test]
    fn failure_names_the_option() {
        let err = set_socket_option(-1, libc::SOL_SOCKET, libc::SO_REUSEADDR, 1, "SO_REUSEADDR")
            .unwrap_err();
        assert_eq!(err.operation(), Some("setsockopt(SO_REUSEADDR)"));
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }

    #[test]
    fn apply_on_bad_descriptor_fails() {
        let opts = SocketOptions {
            reuse_addr: true,
            ..SocketOptions::default()
        };
        let err = apply_socket_options(-1, &opts).unwrap_err();
        assert_eq!(err.operation(), Some("setsockopt(SO_REUSEADDR)"));

        let opts = SocketOptions {
            close_on_exec: true,
            ..SocketOptions::default()
        };
        let err = apply_socket_options(-1, &opts).unwrap_err();
        assert_eq!(err.operation(), Some("fcntl(F_GETFD)"));
    }

    #[test]
    fn deserialize_partial_options() {
        let opts: SocketOptions = toml::from_str("reuse_addr = true\nlisten_backlog = 64").unwrap();
        assert!(opts.reuse_addr);
        assert!(!opts.free_bind);
        assert_eq!(opts.listen_backlog, 64);
    }
}
