//! Peer and local address resolution.
//!
//! # Responsibilities
//! - Decode a family-tagged, length-bounded `sockaddr` byte image
//! - Produce a printable address and a host-order port
//!
//! # Design Decisions
//! - Resolution never fails: truncated or unknown input yields the empty
//!   `PeerInfo`, since naming a peer is auxiliary to the connection itself
//! - The declared length is clamped to the buffer before any field is read
//! - A length that does not exceed the family tag is always empty, even when
//!   the buffer holds a plausible address
//! - Abstract UNIX names are copied by byte count; they need not be
//!   NUL-terminated and may contain NUL bytes

use std::borrow::Cow;
use std::ffi::CStr;
use std::mem;
use std::os::fd::RawFd;
use std::ptr;
use std::slice;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::inet;
use crate::error::{Error, Result};

const FAMILY_LEN: usize = mem::size_of::<libc::sa_family_t>();
const SUN_PATH_OFFSET: usize = mem::offset_of!(libc::sockaddr_un, sun_path);
// INET6_ADDRSTRLEN, large enough for either textual form.
const ADDR_TEXT_LEN: usize = 46;

/// A resolved `{address, port}` pair.
///
/// The address is kept as the exact bytes produced by resolution. For IP
/// sockets and pathname UNIX sockets these are plain text; abstract UNIX
/// names may hold arbitrary bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PeerInfo {
    address: Vec<u8>,
    port: u16,
}

impl PeerInfo {
    pub fn new(address: impl Into<Vec<u8>>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Address as text. Non-UTF-8 bytes are replaced.
    pub fn address(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.address)
    }

    /// Address exactly as resolved.
    pub fn address_bytes(&self) -> &[u8] {
        &self.address
    }

    /// Port in host byte order; 0 for UNIX sockets.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// True when resolution produced nothing.
    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.port == 0
    }
}

impl Serialize for PeerInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PeerInfo", 2)?;
        state.serialize_field("address", &self.address())?;
        state.serialize_field("port", &self.port)?;
        state.end()
    }
}

/// Read a `T` from the start of `bytes`, which must be at least `size_of::<T>()` long.
///
/// # Safety
///
/// `T` must be a plain C struct for which any bit pattern is valid.
unsafe fn read_struct<T>(bytes: &[u8]) -> T {
    debug_assert!(bytes.len() >= mem::size_of::<T>());
    ptr::read_unaligned(bytes.as_ptr() as *const T)
}

fn ntop(family: libc::c_int, src: *const libc::c_void) -> Option<String> {
    let mut buf = [0 as libc::c_char; ADDR_TEXT_LEN];
    let size = buf.len() as libc::socklen_t;
    // SAFETY: `src` points at an in_addr/in6_addr matching `family`, and the
    // buffer is large enough for either textual form.
    let res = unsafe { inet::inet_ntop(family, src, buf.as_mut_ptr(), size) };
    if res.is_null() {
        return None;
    }
    // SAFETY: inet_ntop NUL-terminates on success.
    let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Some(text.to_string_lossy().into_owned())
}

fn resolve_ipv4(bytes: &[u8]) -> Option<PeerInfo> {
    if bytes.len() < mem::size_of::<libc::sockaddr_in>() {
        return None;
    }
    // SAFETY: length checked above; sockaddr_in is plain data.
    let sin: libc::sockaddr_in = unsafe { read_struct(bytes) };
    let address = ntop(
        libc::AF_INET,
        &sin.sin_addr as *const libc::in_addr as *const libc::c_void,
    )?;
    Some(PeerInfo::new(address, u16::from_be(sin.sin_port)))
}

fn resolve_ipv6(bytes: &[u8]) -> Option<PeerInfo> {
    if bytes.len() < mem::size_of::<libc::sockaddr_in6>() {
        return None;
    }
    // SAFETY: length checked above; sockaddr_in6 is plain data.
    let sin6: libc::sockaddr_in6 = unsafe { read_struct(bytes) };
    let address = ntop(
        libc::AF_INET6,
        &sin6.sin6_addr as *const libc::in6_addr as *const libc::c_void,
    )?;
    Some(PeerInfo::new(address, u16::from_be(sin6.sin6_port)))
}

fn resolve_unix(bytes: &[u8]) -> Option<PeerInfo> {
    let path = bytes.get(SUN_PATH_OFFSET..)?;
    match path.split_first() {
        // Unnamed socket: nothing after the family tag.
        None => None,
        // Abstract namespace: everything after the leading NUL, by count.
        Some((&0, name)) => Some(PeerInfo::new(name, 0)),
        Some(_) => {
            let end = path.iter().position(|&b| b == 0).unwrap_or(path.len());
            Some(PeerInfo::new(&path[..end], 0))
        }
    }
}

/// Resolve a raw socket address image into a [`PeerInfo`].
///
/// Only the first `min(declared_len, raw.len())` bytes are examined.
pub fn resolve(raw: &[u8], declared_len: usize) -> PeerInfo {
    let bytes = &raw[..declared_len.min(raw.len())];
    if bytes.len() <= FAMILY_LEN {
        return PeerInfo::default();
    }

    let family = libc::sa_family_t::from_ne_bytes([bytes[0], bytes[1]]);
    let resolved = match libc::c_int::from(family) {
        libc::AF_INET => resolve_ipv4(bytes),
        libc::AF_INET6 => resolve_ipv6(bytes),
        libc::AF_UNIX => resolve_unix(bytes),
        _ => None,
    };

    resolved.unwrap_or_default()
}

/// Resolve an OS-filled `sockaddr_storage`.
pub fn resolve_storage(storage: &libc::sockaddr_storage, len: libc::socklen_t) -> PeerInfo {
    // SAFETY: sockaddr_storage is plain data without padding; viewing it as
    // bytes for the duration of the borrow is sound.
    let raw = unsafe {
        slice::from_raw_parts(
            storage as *const libc::sockaddr_storage as *const u8,
            mem::size_of::<libc::sockaddr_storage>(),
        )
    };
    resolve(raw, len as usize)
}

/// Resolve the local address `fd` is bound to.
pub fn local_address(fd: RawFd) -> Result<PeerInfo> {
    // SAFETY: all-zero is a valid sockaddr_storage.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    // SAFETY: storage/len describe a writable sockaddr_storage.
    let res = unsafe {
        libc::getsockname(
            fd,
            &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
            &mut len,
        )
    };
    if res != 0 {
        return Err(Error::last_os_error("getsockname()"));
    }
    Ok(resolve_storage(&storage, len))
}
