//! Handshake transcript: the ordered concatenation of every handshake
//! message (with its 4-byte header) sent or received in the current
//! handshake (spec.md §3 invariants, §8).
//!
//! Kept as a growing byte buffer rather than an incremental hash state:
//! Finished is the only place the hash is needed, and it is needed twice
//! with different endpoints (sender excludes its own Finished, the peer's
//! subsequent verification includes it), so a plain buffer that is hashed
//! on demand is simpler than threading a snapshot-copyable hasher through
//! the driver, at the cost of re-hashing a typically-small transcript.

use crate::crypto::CryptoBackend;

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<u8>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { messages: Vec::new() }
    }

    /// Appends one handshake message, header included.
    pub fn push(&mut self, message: &[u8]) {
        self.messages.extend_from_slice(message);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.messages
    }

    pub fn hash(&self, backend: &dyn CryptoBackend) -> [u8; 32] {
        backend.sha256(&self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DefaultCryptoBackend;

    #[test]
    fn push_appends_in_order() {
        let mut t = Transcript::new();
        t.push(&[1, 2, 3]);
        t.push(&[4, 5]);
        assert_eq!(t.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn hash_is_order_sensitive() {
        let backend = DefaultCryptoBackend;
        let mut a = Transcript::new();
        a.push(&[1, 2]);
        a.push(&[3, 4]);
        let mut b = Transcript::new();
        b.push(&[3, 4]);
        b.push(&[1, 2]);
        assert_ne!(a.hash(&backend), b.hash(&backend));
    }
}
