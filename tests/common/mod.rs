//! Shared helpers for socket integration tests.

#![allow(dead_code)]

use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

/// Create a socket owned by the test.
pub fn create_socket(domain: libc::c_int, ty: libc::c_int) -> OwnedFd {
    // SAFETY: plain syscall with integer arguments.
    let fd = unsafe { libc::socket(domain, ty, 0) };
    assert!(fd >= 0, "socket(): {}", std::io::Error::last_os_error());
    // SAFETY: `fd` was just returned by socket() and is owned by nobody else.
    unsafe { OwnedFd::from_raw_fd(fd) }
}

/// getsockname() into a fresh storage.
pub fn sock_name(fd: RawFd) -> (libc::sockaddr_storage, libc::socklen_t) {
    // SAFETY: sockaddr_storage is plain data; all-zero is a valid value.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    // SAFETY: `storage` is writable for `len` bytes.
    let res = unsafe {
        libc::getsockname(
            fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len,
        )
    };
    assert_eq!(res, 0, "getsockname(): {}", std::io::Error::last_os_error());
    (storage, len)
}

/// Raw bytes of a sockaddr_storage for feeding `resolve`.
pub fn storage_bytes(storage: &libc::sockaddr_storage) -> Vec<u8> {
    let ptr = storage as *const libc::sockaddr_storage as *const u8;
    // SAFETY: `ptr` covers the whole borrowed struct, which outlives the slice.
    unsafe { std::slice::from_raw_parts(ptr, mem::size_of::<libc::sockaddr_storage>()) }.to_vec()
}

/// Bind a UNIX socket to `path` bytes placed at `sun_path`, with an explicit length.
pub fn bind_unix(fd: &OwnedFd, path: &[u8], len: usize) -> std::io::Result<()> {
    // SAFETY: sockaddr_un is plain data; all-zero is a valid value.
    let mut sun: libc::sockaddr_un = unsafe { mem::zeroed() };
    sun.sun_family = libc::AF_UNIX as libc::sa_family_t;
    for (dst, src) in sun.sun_path.iter_mut().zip(path) {
        *dst = *src as libc::c_char;
    }
    // SAFETY: `sun` is initialised; callers keep `len` within its size.
    let res = unsafe {
        libc::bind(
            fd.as_raw_fd(),
            &sun as *const libc::sockaddr_un as *const libc::sockaddr,
            len as libc::socklen_t,
        )
    };
    if res == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

/// Offset of `sun_path` in `sockaddr_un`.
pub fn sun_path_offset() -> usize {
    mem::offset_of!(libc::sockaddr_un, sun_path)
}

/// F_GETFD flags.
pub fn fd_flags(fd: RawFd) -> libc::c_int {
    // SAFETY: fcntl query; a bad descriptor only yields -1.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    assert_ne!(flags, -1);
    flags
}

/// F_GETFL flags.
pub fn status_flags(fd: RawFd) -> libc::c_int {
    // SAFETY: fcntl query; a bad descriptor only yields -1.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    assert_ne!(flags, -1);
    flags
}

/// Start a non-blocking connect to the address `listener` is bound to.
pub fn connect_to(listener: RawFd) -> OwnedFd {
    let (storage, len) = sock_name(listener);
    let domain = libc::c_int::from(storage.ss_family);
    let sock = create_socket(domain, libc::SOCK_STREAM | libc::SOCK_NONBLOCK);
    // SAFETY: `storage` and `len` come straight from getsockname().
    let res = unsafe {
        libc::connect(
            sock.as_raw_fd(),
            &storage as *const libc::sockaddr_storage as *const libc::sockaddr,
            len,
        )
    };
    let err = std::io::Error::last_os_error();
    assert!(
        res == 0 || err.raw_os_error() == Some(libc::EINPROGRESS),
        "connect(): {err}"
    );
    sock
}

/// Block until `fd` is readable.
pub fn wait_readable(fd: RawFd) {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: `pfd` is a single valid pollfd.
    let res = unsafe { libc::poll(&mut pfd, 1, 5_000) };
    assert_eq!(res, 1, "listener never became readable");
    assert_ne!(pfd.revents & libc::POLLIN, 0);
}
