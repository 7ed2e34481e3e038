//! Text/binary address conversion from the C library.
//!
//! `libc` does not export `inet_pton`/`inet_ntop`, so they are declared here
//! against their POSIX prototypes (`<arpa/inet.h>`).

use libc::{c_char, c_int, c_void, socklen_t};

extern "C" {
    /// Returns 1 on success, 0 when `src` is not valid for `af`, and -1 with
    /// `errno` set (EAFNOSUPPORT) for an unknown family.
    ///
    /// # Safety
    ///
    /// `src` must be NUL-terminated and `dst` must point at an `in_addr`
    /// (AF_INET) or `in6_addr` (AF_INET6).
    pub(crate) fn inet_pton(af: c_int, src: *const c_char, dst: *mut c_void) -> c_int;

    /// Returns `dst` on success, null with `errno` set on failure.
    ///
    /// # Safety
    ///
    /// `src` must point at an address structure matching `af` and `dst` must
    /// be writable for `size` bytes.
    pub(crate) fn inet_ntop(
        af: c_int,
        src: *const c_void,
        dst: *mut c_char,
        size: socklen_t,
    ) -> *const c_char;
}
