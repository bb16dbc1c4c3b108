//! `SecurityParameters` and `KeyBlock` (spec.md §3).

use crate::cipher_suite::{BulkCipher, CipherSuite, CipherType, MacAlgorithm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    Client,
    Server,
}

/// Negotiated parameters for one epoch, shared by the pending and the two
/// current (decode/encode) parameter sets.
#[derive(Debug, Clone)]
pub struct SecurityParameters {
    pub connection_end: ConnectionEnd,
    pub bulk_cipher: BulkCipher,
    pub cipher_type: CipherType,
    pub enc_key_length: usize,
    pub block_length: usize,
    pub fixed_iv_length: usize,
    pub record_iv_length: usize,
    pub mac: MacAlgorithm,
    pub mac_length: usize,
    pub mac_key_length: usize,
    /// Always null in this engine (spec.md §1 non-goals).
    pub compression_method: u8,
    pub master_secret: [u8; 48],
    pub client_random: [u8; 32],
    pub server_random: [u8; 32],
}

impl SecurityParameters {
    /// The initial, unprotected parameters a connection starts with: null
    /// cipher, null MAC, no master secret yet.
    pub fn initial(connection_end: ConnectionEnd) -> Self {
        SecurityParameters {
            connection_end,
            bulk_cipher: BulkCipher::Null,
            cipher_type: CipherType::Stream,
            enc_key_length: 0,
            block_length: 0,
            fixed_iv_length: 0,
            record_iv_length: 0,
            mac: MacAlgorithm::Null,
            mac_length: 0,
            mac_key_length: 0,
            compression_method: 0,
            master_secret: [0u8; 48],
            client_random: [0u8; 32],
            server_random: [0u8; 32],
        }
    }

    pub fn from_cipher_suite(
        connection_end: ConnectionEnd,
        suite: &CipherSuite,
        master_secret: [u8; 48],
        client_random: [u8; 32],
        server_random: [u8; 32],
    ) -> Self {
        SecurityParameters {
            connection_end,
            bulk_cipher: suite.bulk_cipher,
            cipher_type: suite.cipher_type,
            enc_key_length: suite.enc_key_length,
            block_length: suite.block_length,
            fixed_iv_length: suite.fixed_iv_length,
            record_iv_length: suite.record_iv_length,
            mac: suite.mac,
            mac_length: suite.mac_length,
            mac_key_length: suite.mac_key_length,
            compression_method: 0,
            master_secret,
            client_random,
            server_random,
        }
    }

    pub fn is_null_cipher(&self) -> bool {
        matches!(self.bulk_cipher, BulkCipher::Null)
    }
}

/// The six derived key-material byte strings (spec.md §3 "KeyBlock").
#[derive(Clone)]
pub struct KeyBlock {
    pub client_write_mac_key: Vec<u8>,
    pub server_write_mac_key: Vec<u8>,
    pub client_write_enc_key: Vec<u8>,
    pub server_write_enc_key: Vec<u8>,
    pub client_write_iv: Vec<u8>,
    pub server_write_iv: Vec<u8>,
}

impl std::fmt::Debug for KeyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("KeyBlock").finish_non_exhaustive()
    }
}

impl KeyBlock {
    /// Splits a raw PRF "key expansion" output into the six fields, in the
    /// exact order spec.md §4.4 specifies.
    pub fn split(mut raw: Vec<u8>, mac_key_length: usize, enc_key_length: usize, iv_length: usize) -> Self {
        let mut take = |n: usize| -> Vec<u8> { raw.drain(0..n).collect() };
        let client_write_mac_key = take(mac_key_length);
        let server_write_mac_key = take(mac_key_length);
        let client_write_enc_key = take(enc_key_length);
        let server_write_enc_key = take(enc_key_length);
        let client_write_iv = take(iv_length);
        let server_write_iv = take(iv_length);
        debug_assert!(raw.is_empty());
        KeyBlock {
            client_write_mac_key,
            server_write_mac_key,
            client_write_enc_key,
            server_write_enc_key,
            client_write_iv,
            server_write_iv,
        }
    }

    pub fn mac_key_for(&self, end: ConnectionEnd) -> &[u8] {
        match end {
            ConnectionEnd::Client => &self.client_write_mac_key,
            ConnectionEnd::Server => &self.server_write_mac_key,
        }
    }

    pub fn enc_key_for(&self, end: ConnectionEnd) -> &[u8] {
        match end {
            ConnectionEnd::Client => &self.client_write_enc_key,
            ConnectionEnd::Server => &self.server_write_enc_key,
        }
    }

    pub fn iv_for(&self, end: ConnectionEnd) -> &[u8] {
        match end {
            ConnectionEnd::Client => &self.client_write_iv,
            ConnectionEnd::Server => &self.server_write_iv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lengths_sum_to_input() {
        let raw = vec![0u8; 2 * 20 + 2 * 16 + 2 * 0];
        let len = raw.len();
        let kb = KeyBlock::split(raw, 20, 16, 0);
        assert_eq!(
            kb.client_write_mac_key.len()
                + kb.server_write_mac_key.len()
                + kb.client_write_enc_key.len()
                + kb.server_write_enc_key.len()
                + kb.client_write_iv.len()
                + kb.server_write_iv.len(),
            len
        );
    }
}
