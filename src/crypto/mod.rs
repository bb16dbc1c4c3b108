//! Cryptographic backend abstraction (spec.md §6).
//!
//! PEM parsing, ASN.1 decoding, RSA primitives, HMAC, and block-cipher
//! implementations are explicitly out of scope for the engine itself
//! (spec.md §1); this module defines the contract the record layer and
//! handshake flow are written against, and `backend.rs` supplies one
//! concrete implementation built from the RustCrypto / `rsa` / `x509-parser`
//! crates so the rest of the engine is exercisable without an external FFI
//! dependency.

mod backend;

pub use backend::{DefaultCryptoBackend, DefaultRsaPrivateKey, DefaultRsaPublicKey};

use crate::cipher_suite::MacAlgorithm;
use crate::error::Result;

/// Opaque RSA public key extracted from a certificate's
/// `subjectPublicKeyInfo`.
pub trait RsaPublicKey: std::fmt::Debug + std::any::Any {}

/// Opaque RSA private key, as configured on a server.
pub trait RsaPrivateKey: std::fmt::Debug + std::any::Any {}

pub trait CryptoBackend {
    /// Cryptographically strong random bytes (client/server random,
    /// premaster-secret padding, explicit CBC IVs).
    fn random(&self, n: usize) -> Vec<u8>;

    /// TLS 1.2 PRF: `P_SHA256(secret, label || seed)` truncated to `n`
    /// bytes (spec.md §4.4).
    fn prf(&self, secret: &[u8], label: &[u8], seed: &[u8], n: usize) -> Vec<u8>;

    /// SHA-256 of `data`, used to hash the handshake transcript before
    /// feeding it to the PRF as the Finished seed.
    fn sha256(&self, data: &[u8]) -> [u8; 32];

    /// Extracts the RSA public key from a DER-encoded X.509 certificate.
    fn cert_pubkey(&self, der_cert: &[u8]) -> Result<Box<dyn RsaPublicKey>>;

    /// RSAES-PKCS1-v1_5 encryption of the premaster secret under the peer's
    /// public key.
    fn rsa_encrypt(&self, pubkey: &dyn RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// RSAES-PKCS1-v1_5 decryption of an incoming ClientKeyExchange.
    fn rsa_decrypt(&self, privkey: &dyn RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// `HMAC(key, data)` keyed on `alg`; used for record MACs over
    /// `seq || type || version || length || plaintext`.
    fn hmac(&self, alg: MacAlgorithm, key: &[u8], data: &[u8]) -> Vec<u8>;

    /// AES-CBC encryption, used by the block-cipher protection path.
    fn aes_cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// AES-CBC decryption.
    fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// 3DES-CBC encryption (keying-option 1, 24-byte key).
    fn des_ede3_cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// 3DES-CBC decryption.
    fn des_ede3_cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// RC4 keystream XOR (stream cipher; encrypt and decrypt are the same
    /// operation).
    fn rc4(&self, key: &[u8], data: &[u8]) -> Vec<u8>;
}
