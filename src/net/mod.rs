//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! create_listening_socket(address, port, options)
//!     → bind.rs (family from text, inet_pton)
//!     → options.rs (SO_REUSEADDR, IP_FREEBIND, TCP_DEFER_ACCEPT, FD_CLOEXEC)
//!     → listener.rs (socket → nonblock → options → bind → listen)
//!
//! accept_connection(listening fd)
//!     → acceptor.rs (accept → nonblock + cloexec)
//!     → peer.rs (sockaddr_storage → PeerInfo)
//! ```
//!
//! # Design Decisions
//! - Synchronous single calls; no retries, no readiness handling
//! - Every OS failure is wrapped with the operation name
//! - Peer naming is best effort and never fails

pub mod acceptor;
pub mod bind;
pub mod capability;
mod inet;
pub mod listener;
pub mod options;
pub mod peer;

pub use acceptor::{accept_connection, AcceptedConnection};
pub use bind::{bind_socket, parse_ipv4, parse_ipv6, AddressFamily};
pub use capability::ipv6_supported;
pub use listener::{create_listening_socket, ListeningSocket, Transport};
pub use options::{apply_socket_options, get_socket_option, set_socket_option, SocketOptions};
pub use peer::{local_address, resolve, resolve_storage, PeerInfo};
