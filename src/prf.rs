//! Master-secret, key-block, and Finished-verify-data derivation built on
//! top of [`CryptoBackend::prf`] (spec.md §4.4). Grounded on the dacha
//! `key_schedule_tls12.rs` reference file's split between `master_secret`,
//! `key_block`, and `verify_data_{client,server}` helpers.

use crate::cipher_suite::CipherSuite;
use crate::crypto::CryptoBackend;
use crate::security_parameters::KeyBlock;

pub const VERIFY_DATA_LENGTH: usize = 12;

/// `master_secret = PRF(pre_master_secret, "master secret",
///     client_random || server_random, 48)`.
pub fn master_secret(
    backend: &dyn CryptoBackend,
    pre_master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> [u8; 48] {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);
    let out = backend.prf(pre_master_secret, b"master secret", &seed, 48);
    out.try_into().expect("PRF(.., 48) returns 48 bytes")
}

/// `key_block = PRF(master_secret, "key expansion",
///     server_random || client_random, n)`, split into the six fields in
/// the order spec.md §4.4 specifies.
pub fn key_block(
    backend: &dyn CryptoBackend,
    master_secret: &[u8; 48],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    suite: &CipherSuite,
) -> KeyBlock {
    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    let total = 2 * suite.mac_key_length + 2 * suite.enc_key_length + 2 * suite.fixed_iv_length;
    let raw = backend.prf(master_secret, b"key expansion", &seed, total);
    KeyBlock::split(raw, suite.mac_key_length, suite.enc_key_length, suite.fixed_iv_length)
}

/// Finished verify_data for whichever side is sending: label is
/// `"client finished"` or `"server finished"`, seed is the SHA-256 hash of
/// the transcript up to (and for the peer's verification, including) the
/// Finished message in question (spec.md §4.4).
pub fn verify_data(
    backend: &dyn CryptoBackend,
    master_secret: &[u8; 48],
    label: &'static [u8],
    transcript_hash: &[u8; 32],
) -> [u8; VERIFY_DATA_LENGTH] {
    let out = backend.prf(master_secret, label, transcript_hash, VERIFY_DATA_LENGTH);
    out.try_into().expect("PRF(.., 12) returns 12 bytes")
}

pub const LABEL_CLIENT_FINISHED: &[u8] = b"client finished";
pub const LABEL_SERVER_FINISHED: &[u8] = b"server finished";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DefaultCryptoBackend;

    #[test]
    fn master_secret_is_48_bytes_and_deterministic() {
        let backend = DefaultCryptoBackend;
        let pms = [1u8; 48];
        let cr = [2u8; 32];
        let sr = [3u8; 32];
        let a = master_secret(&backend, &pms, &cr, &sr);
        let b = master_secret(&backend, &pms, &cr, &sr);
        assert_eq!(a, b);
        assert_eq!(a.len(), 48);
    }

    #[test]
    fn verify_data_is_12_bytes() {
        let backend = DefaultCryptoBackend;
        let ms = [9u8; 48];
        let hash = [0u8; 32];
        let vd = verify_data(&backend, &ms, LABEL_CLIENT_FINISHED, &hash);
        assert_eq!(vd.len(), VERIFY_DATA_LENGTH);
    }
}
