//! Owned-until-committed descriptor wrapper.

use std::mem::ManuallyDrop;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;

/// A freshly created descriptor whose construction has not finished yet.
///
/// Dropping a `ProvisionalFd` closes the descriptor. Calling [`commit`]
/// hands ownership to the caller and disarms the close. Construction code
/// wraps the raw descriptor right after `socket()`/`accept()` so that any `?`
/// between there and the successful return closes it.
///
/// [`commit`]: ProvisionalFd::commit
#[derive(Debug)]
pub struct ProvisionalFd {
    fd: OwnedFd,
}

impl ProvisionalFd {
    /// Take ownership of `fd`.
    ///
    /// # Safety
    ///
    /// `fd` must be an open descriptor that nothing else owns or will close.
    pub unsafe fn from_raw(fd: RawFd) -> Self {
        Self {
            fd: OwnedFd::from_raw_fd(fd),
        }
    }

    /// Construction succeeded; keep the descriptor open.
    pub fn commit(self) -> OwnedFd {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `fd` is moved out exactly once
        // and `Drop` does not run for it.
        unsafe { ptr::read(&this.fd) }
    }
}

impl AsRawFd for ProvisionalFd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl Drop for ProvisionalFd {
    fn drop(&mut self) {
        // The `OwnedFd` field closes the descriptor after this returns.
        tracing::debug!(
            fd = self.fd.as_raw_fd(),
            "Closing descriptor after failed construction"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::os::fd::IntoRawFd;
    use std::os::unix::net::UnixStream;

    // The far end of a socketpair sees EOF once the guarded end is closed,
    // which stays reliable while other tests reuse descriptor numbers.
    fn guarded_pair() -> (ProvisionalFd, UnixStream) {
        let (near, far) = UnixStream::pair().unwrap();
        let guard = unsafe { ProvisionalFd::from_raw(near.into_raw_fd()) };
        (guard, far)
    }

    fn peer_closed(far: &mut UnixStream) -> bool {
        let mut buf = [0u8; 1];
        matches!(far.read(&mut buf), Ok(0))
    }

    #[test]
    fn drop_closes_descriptor() {
        let (guard, mut far) = guarded_pair();
        assert!(guard.as_raw_fd() >= 0);
        drop(guard);
        assert!(peer_closed(&mut far));
    }

    #[test]
    fn commit_keeps_descriptor_open() {
        let (guard, far) = guarded_pair();
        let fd = guard.as_raw_fd();
        let owned = guard.commit();
        assert_eq!(owned.as_raw_fd(), fd);

        far.set_nonblocking(true).unwrap();
        let mut buf = [0u8; 1];
        let err = (&far).read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    }

    #[test]
    fn failing_step_closes_descriptor() {
        fn build(guard: ProvisionalFd) -> crate::Result<OwnedFd> {
            crate::net::options::set_socket_option(
                guard.as_raw_fd(),
                libc::SOL_SOCKET,
                -1,
                1,
                "BOGUS",
            )?;
            Ok(guard.commit())
        }

        let (guard, mut far) = guarded_pair();
        let err = build(guard).unwrap_err();
        assert_eq!(err.operation(), Some("setsockopt(BOGUS)"));
        assert!(peer_closed(&mut far));
    }
}
