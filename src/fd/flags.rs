//! Status and descriptor flag helpers.
//!
//! Both setters are idempotent: they OR the bit into whatever is already set.

use std::os::fd::RawFd;

use crate::error::{Error, Result};

fn get_flags(fd: RawFd, cmd: libc::c_int, label: &str) -> Result<libc::c_int> {
    // SAFETY: F_GETFL/F_GETFD take no argument and only inspect the descriptor table.
    let flags = unsafe { libc::fcntl(fd, cmd) };
    if flags == -1 {
        return Err(Error::last_os_error(label));
    }
    Ok(flags)
}

fn set_flags(fd: RawFd, cmd: libc::c_int, flags: libc::c_int, label: &str) -> Result<()> {
    // SAFETY: F_SETFL/F_SETFD take an int argument; an invalid fd is reported via errno.
    if unsafe { libc::fcntl(fd, cmd, flags) } != 0 {
        return Err(Error::last_os_error(label));
    }
    Ok(())
}

/// Put `fd` into non-blocking mode.
pub fn set_nonblocking(fd: RawFd) -> Result<()> {
    let flags = get_flags(fd, libc::F_GETFL, "fcntl(F_GETFL)")?;
    set_flags(fd, libc::F_SETFL, flags | libc::O_NONBLOCK, "fcntl(F_SETFL)")?;
    tracing::trace!(fd, "O_NONBLOCK set");
    Ok(())
}

/// Mark `fd` close-on-exec.
pub fn set_close_on_exec(fd: RawFd) -> Result<()> {
    let flags = get_flags(fd, libc::F_GETFD, "fcntl(F_GETFD)")?;
    set_flags(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC, "fcntl(F_SETFD)")?;
    tracing::trace!(fd, "FD_CLOEXEC set");
    Ok(())
}

pub fn is_nonblocking(fd: RawFd) -> Result<bool> {
    let flags = get_flags(fd, libc::F_GETFL, "fcntl(F_GETFL)")?;
    Ok(flags & libc::O_NONBLOCK != 0)
}

pub fn is_close_on_exec(fd: RawFd) -> Result<bool> {
    let flags = get_flags(fd, libc::F_GETFD, "fcntl(F_GETFD)")?;
    Ok(flags & libc::FD_CLOEXEC != 0)
}
