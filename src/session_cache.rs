//! Client-side session cache, keyed by server name then session id
//! (spec.md §3 "SessionCacheEntry", §4.4 "Session resumption (client)").
//!
//! Grounded on the `fuchsia-hyper` `session_cache.rs` reference file's
//! shape (a map owned by the client, looked up by name, storing enough to
//! re-derive keys on resumption) and spec.md §9's design note: "a single
//! owning container indexed by server name, accessed under an exclusive
//! lock".

use std::collections::HashMap;
use std::sync::Mutex;

use crate::cipher_suite::CipherSuite;
use crate::security_parameters::SecurityParameters;

/// An immutable snapshot of what resumption needs: there is no partial
/// update (spec.md §9).
#[derive(Debug, Clone)]
pub struct SessionCacheEntry {
    pub session_id: Vec<u8>,
    pub tls_version: u16,
    pub cipher_suite: CipherSuite,
    pub compression_method: u8,
    pub security_parameters: SecurityParameters,
}

/// Shared by reference across a client's connections (spec.md §3
/// "Ownership & lifecycle").
#[derive(Default)]
pub struct SessionCache {
    by_server_name: Mutex<HashMap<String, SessionCacheEntry>>,
}

impl SessionCache {
    pub fn new() -> Self {
        SessionCache {
            by_server_name: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, server_name: &str) -> Option<SessionCacheEntry> {
        self.by_server_name.lock().unwrap().get(server_name).cloned()
    }

    pub fn insert(&self, server_name: String, entry: SessionCacheEntry) {
        log::debug!(
            "session cache: storing session for {server_name} (session_id len={})",
            entry.session_id.len()
        );
        self.by_server_name.lock().unwrap().insert(server_name, entry);
    }

    /// Evicts the cached entry for `server_name` (spec.md §4.4: "If the
    /// server returns a different session_id, the cache entry is
    /// evicted").
    pub fn evict(&self, server_name: &str) {
        if self.by_server_name.lock().unwrap().remove(server_name).is_some() {
            log::debug!("session cache: evicted entry for {server_name}");
        }
    }

    pub fn len(&self) -> usize {
        self.by_server_name.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.by_server_name.lock().unwrap().clear();
    }
}

/// Server-side counterpart to [`SessionCache`], keyed by the session id the
/// server itself assigned. Not named in spec.md §3 (which documents only
/// the client-side cache), but required for session resumption to actually
/// work end-to-end on the accepting side; see DESIGN.md.
#[derive(Default)]
pub struct ServerSessionStore {
    by_session_id: Mutex<HashMap<Vec<u8>, SessionCacheEntry>>,
}

impl ServerSessionStore {
    pub fn new() -> Self {
        ServerSessionStore {
            by_session_id: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, session_id: &[u8]) -> Option<SessionCacheEntry> {
        self.by_session_id.lock().unwrap().get(session_id).cloned()
    }

    pub fn insert(&self, entry: SessionCacheEntry) {
        log::debug!("server session store: storing session_id len={}", entry.session_id.len());
        self.by_session_id.lock().unwrap().insert(entry.session_id.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.by_session_id.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_suite::TLS_RSA_WITH_NULL_SHA;
    use crate::security_parameters::ConnectionEnd;

    fn dummy_entry(session_id: Vec<u8>) -> SessionCacheEntry {
        SessionCacheEntry {
            session_id,
            tls_version: 0x0303,
            cipher_suite: TLS_RSA_WITH_NULL_SHA,
            compression_method: 0,
            security_parameters: SecurityParameters::initial(ConnectionEnd::Client),
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let cache = SessionCache::new();
        cache.insert("example.com".into(), dummy_entry(vec![1, 2, 3]));
        let entry = cache.get("example.com").unwrap();
        assert_eq!(entry.session_id, vec![1, 2, 3]);
    }

    #[test]
    fn eviction_removes_entry() {
        let cache = SessionCache::new();
        cache.insert("example.com".into(), dummy_entry(vec![1]));
        cache.evict("example.com");
        assert!(cache.get("example.com").is_none());
        assert_eq!(cache.len(), 0);
    }
}
