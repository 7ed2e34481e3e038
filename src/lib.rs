//! Listening socket provisioning, connection acceptance and peer naming.
//!
//! ```no_run
//! use sockutils::{accept_connection, create_listening_socket, SocketOptions};
//! use std::os::fd::AsRawFd;
//!
//! let opts = SocketOptions { reuse_addr: true, close_on_exec: true, ..Default::default() };
//! let listener = create_listening_socket("127.0.0.1", 8080, &opts)?;
//! // ...wait for readiness, then:
//! let conn = accept_connection(listener.as_raw_fd())?;
//! println!("{}:{}", conn.peer().address(), conn.peer().port());
//! # Ok::<(), sockutils::Error>(())
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("sockutils relies on Linux socket options and the abstract UNIX namespace");

pub mod config;
pub mod error;
pub mod fd;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use net::{
    accept_connection, bind_socket, create_listening_socket, ipv6_supported, resolve,
    AcceptedConnection, AddressFamily, ListeningSocket, PeerInfo, SocketOptions, Transport,
};
