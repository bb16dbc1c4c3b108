//! Server-side entry point: owns the certificate, private key, session
//! store, and crypto backend shared by every connection it accepts
//! (spec.md §3 "Ownership & lifecycle").

use std::sync::Arc;

use crate::connection::Connection;
use crate::context::{Core, Endpoint};
use crate::crypto::{CryptoBackend, DefaultCryptoBackend, RsaPrivateKey};
use crate::server_driver::ServerDriver;
use crate::session_cache::ServerSessionStore;

pub struct Server {
    backend: Arc<dyn CryptoBackend>,
    cert_der: Arc<Vec<u8>>,
    private_key: Arc<dyn RsaPrivateKey>,
    sessions: Arc<ServerSessionStore>,
}

impl Server {
    pub fn new(backend: Arc<dyn CryptoBackend>, cert_der: Vec<u8>, private_key: Arc<dyn RsaPrivateKey>) -> Self {
        Server {
            backend,
            cert_der: Arc::new(cert_der),
            private_key,
            sessions: Arc::new(ServerSessionStore::new()),
        }
    }

    pub fn with_default_backend(cert_der: Vec<u8>, private_key: Arc<dyn RsaPrivateKey>) -> Self {
        Server::new(Arc::new(DefaultCryptoBackend), cert_der, private_key)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Creates a new connection to service one accepted client. The server
    /// does not call `start()` on it; it reacts to the inbound ClientHello
    /// (spec.md §5).
    pub fn new_connection(&self) -> Connection {
        let core = Core::new(Endpoint::Server, self.backend.clone());
        let driver = ServerDriver::new(self.cert_der.clone(), self.private_key.clone(), self.sessions.clone());
        Connection::new(core, Box::new(driver))
    }
}
