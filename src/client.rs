//! Client-side entry point: owns the session cache and crypto backend
//! shared by every connection it creates (spec.md §3 "Ownership &
//! lifecycle").

use std::sync::Arc;

use crate::client_driver::ClientDriver;
use crate::connection::Connection;
use crate::context::{Core, Endpoint};
use crate::crypto::{CryptoBackend, DefaultCryptoBackend};
use crate::session_cache::SessionCache;

pub struct Client {
    backend: Arc<dyn CryptoBackend>,
    session_cache: Arc<SessionCache>,
}

impl Default for Client {
    fn default() -> Self {
        Client::new(Arc::new(DefaultCryptoBackend))
    }
}

impl Client {
    pub fn new(backend: Arc<dyn CryptoBackend>) -> Self {
        Client {
            backend,
            session_cache: Arc::new(SessionCache::new()),
        }
    }

    pub fn session_cache(&self) -> &Arc<SessionCache> {
        &self.session_cache
    }

    /// Creates a new connection to `server_name`. Pass `None` to skip SNI
    /// and session-cache lookup (spec.md §4.4 "keyed by server name").
    pub fn new_connection(&self, server_name: Option<&str>) -> Connection {
        let core = Core::new(Endpoint::Client, self.backend.clone());
        let driver = ClientDriver::new(self.session_cache.clone(), server_name.map(str::to_owned));
        Connection::new(core, Box::new(driver))
    }

    /// Like [`Client::new_connection`], but offers only `cipher_suites`
    /// instead of every suite this engine recognizes.
    pub fn new_connection_with_cipher_suites(&self, server_name: Option<&str>, cipher_suites: Vec<u16>) -> Connection {
        let core = Core::new(Endpoint::Client, self.backend.clone());
        let driver = ClientDriver::with_cipher_suites(
            self.session_cache.clone(),
            server_name.map(str::to_owned),
            cipher_suites,
        );
        Connection::new(core, Box::new(driver))
    }
}
