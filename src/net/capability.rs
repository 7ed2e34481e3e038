//! Host capability checks.

use std::sync::OnceLock;

static IPV6_SUPPORTED: OnceLock<bool> = OnceLock::new();

/// Whether this host can create IPv6 stream sockets.
///
/// Checked once per process on first call.
pub fn ipv6_supported() -> bool {
    *IPV6_SUPPORTED.get_or_init(|| {
        // SAFETY: plain socket(2); the descriptor is closed right away.
        let fd = unsafe { libc::socket(libc::AF_INET6, libc::SOCK_STREAM, 0) };
        if fd == -1 {
            tracing::debug!(error = %std::io::Error::last_os_error(), "IPv6 unavailable");
            return false;
        }
        // SAFETY: `fd` is ours and not used afterwards.
        unsafe { libc::close(fd) };
        true
    })
}
