//! A sans-I/O TLS 1.2 protocol engine: record layer, handshake state
//! machine, and crypto orchestration, with no socket ownership of its own
//! (spec.md §1 "Overview").
//!
//! Bytes come in through [`Connection::feed`] and go out through
//! [`Connection::next_record`]; the caller owns the transport.

pub mod alert;
pub mod cipher_suite;
pub mod client;
pub mod client_driver;
pub mod codec;
pub mod connection;
pub mod constants;
pub mod context;
pub mod crypto;
pub mod driver;
pub mod error;
pub mod handshake;
pub mod prf;
pub mod protection;
pub mod record;
pub mod security_parameters;
pub mod server;
pub mod server_driver;
pub mod session_cache;
pub mod transcript;

pub use client::Client;
pub use connection::Connection;
pub use context::State;
pub use error::{Error, Result};
pub use server::Server;
