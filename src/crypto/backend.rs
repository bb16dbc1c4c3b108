//! Default [`CryptoBackend`] implementation, built from the RustCrypto
//! ecosystem plus the `rsa` and `x509-parser` crates.
//!
//! This is one possible backend; spec.md §6 treats the backend as an
//! external collaborator. Wiring a production backend to a vendored
//! OpenSSL/BoringSSL would mean swapping this module out, not changing the
//! [`super::CryptoBackend`] trait.

use aes::{Aes128, Aes256};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use hmac::{Hmac, Mac};
use md5::Md5;
use rand::RngCore;
use rc4::{KeyInit, Rc4, StreamCipher};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{PaddingScheme, PublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::cipher_suite::MacAlgorithm;
use crate::error::{Error, Result};

use super::{CryptoBackend, RsaPrivateKey, RsaPublicKey};

#[derive(Debug)]
pub struct DefaultRsaPublicKey(pub(crate) rsa::RsaPublicKey);
impl RsaPublicKey for DefaultRsaPublicKey {}

#[derive(Debug)]
pub struct DefaultRsaPrivateKey(pub rsa::RsaPrivateKey);
impl RsaPrivateKey for DefaultRsaPrivateKey {}

/// The concrete backend the `Client`/`Server` objects use unless the
/// caller supplies their own.
#[derive(Default)]
pub struct DefaultCryptoBackend;

impl CryptoBackend for DefaultCryptoBackend {
    fn random(&self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }

    fn prf(&self, secret: &[u8], label: &[u8], seed: &[u8], n: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(label.len() + seed.len());
        data.extend_from_slice(label);
        data.extend_from_slice(seed);
        p_hash_sha256(secret, &data, n)
    }

    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }

    fn cert_pubkey(&self, der_cert: &[u8]) -> Result<Box<dyn RsaPublicKey>> {
        let (_, cert) = x509_parser::parse_x509_certificate(der_cert)
            .map_err(|e| Error::Crypto(format!("invalid certificate: {e}")))?;
        let spki = cert.public_key();
        let key = rsa::RsaPublicKey::from_pkcs1_der(spki.subject_public_key.data)
            .map_err(|e| Error::Crypto(format!("not an RSA public key: {e}")))?;
        Ok(Box::new(DefaultRsaPublicKey(key)))
    }

    fn rsa_encrypt(&self, pubkey: &dyn RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = downcast_pub(pubkey)?;
        let mut rng = rand::thread_rng();
        key.0
            .encrypt(&mut rng, PaddingScheme::new_pkcs1v15_encrypt(), plaintext)
            .map_err(|e| Error::Crypto(format!("RSA encrypt failed: {e}")))
    }

    fn rsa_decrypt(&self, privkey: &dyn RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key = downcast_priv(privkey)?;
        key.0
            .decrypt(PaddingScheme::new_pkcs1v15_encrypt(), ciphertext)
            .map_err(|e| Error::Crypto(format!("RSA decrypt failed: {e}")))
    }

    fn hmac(&self, alg: MacAlgorithm, key: &[u8], data: &[u8]) -> Vec<u8> {
        match alg {
            MacAlgorithm::Null => Vec::new(),
            MacAlgorithm::Md5 => mac_with::<Hmac<Md5>>(key, data),
            MacAlgorithm::Sha => mac_with::<Hmac<Sha1>>(key, data),
            MacAlgorithm::Sha256 => mac_with::<Hmac<Sha256>>(key, data),
        }
    }

    fn aes_cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        match key.len() {
            16 => Ok(cbc::Encryptor::<Aes128>::new(key.into(), iv.into())
                .encrypt_padded_vec_mut::<NoPadding>(plaintext)),
            32 => Ok(cbc::Encryptor::<Aes256>::new(key.into(), iv.into())
                .encrypt_padded_vec_mut::<NoPadding>(plaintext)),
            n => Err(Error::Crypto(format!("unsupported AES key length {n}"))),
        }
    }

    fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        match key.len() {
            16 => cbc::Decryptor::<Aes128>::new(key.into(), iv.into())
                .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
                .map_err(|_| Error::BadRecordMac),
            32 => cbc::Decryptor::<Aes256>::new(key.into(), iv.into())
                .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
                .map_err(|_| Error::BadRecordMac),
            n => Err(Error::Crypto(format!("unsupported AES key length {n}"))),
        }
    }

    fn des_ede3_cbc_encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(cbc::Encryptor::<TdesEde3>::new(key.into(), iv.into())
            .encrypt_padded_vec_mut::<NoPadding>(plaintext))
    }

    fn des_ede3_cbc_decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        cbc::Decryptor::<TdesEde3>::new(key.into(), iv.into())
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| Error::BadRecordMac)
    }

    fn rc4(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut cipher = Rc4::new(key.into());
        let mut out = data.to_vec();
        cipher.apply_keystream(&mut out);
        out
    }
}

fn downcast_pub(pubkey: &dyn RsaPublicKey) -> Result<&DefaultRsaPublicKey> {
    // The backend trait is object-safe and not generic over a concrete key
    // type, so the default implementation downcasts its own key newtype
    // back out. A caller supplying a different backend would supply their
    // own key types end-to-end and never hit this path.
    (pubkey as &dyn std::any::Any)
        .downcast_ref::<DefaultRsaPublicKey>()
        .ok_or_else(|| Error::Internal("public key from a different crypto backend".into()))
}

fn downcast_priv(privkey: &dyn RsaPrivateKey) -> Result<&DefaultRsaPrivateKey> {
    (privkey as &dyn std::any::Any)
        .downcast_ref::<DefaultRsaPrivateKey>()
        .ok_or_else(|| Error::Internal("private key from a different crypto backend".into()))
}

fn mac_with<M: Mac>(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// `P_SHA256(secret, seed)` truncated to `output_size` bytes (spec.md §4.4).
fn p_hash_sha256(secret: &[u8], seed: &[u8], output_size: usize) -> Vec<u8> {
    let mut a = seed.to_vec();
    let mut out = Vec::new();
    while out.len() < output_size {
        a = mac_with::<Hmac<Sha256>>(secret, &a);
        let mut input = a.clone();
        input.extend_from_slice(seed);
        out.extend_from_slice(&mac_with::<Hmac<Sha256>>(secret, &input));
    }
    out.truncate(output_size);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prf_output_length_matches_request() {
        let backend = DefaultCryptoBackend;
        for n in [0, 1, 12, 48, 77] {
            let out = backend.prf(b"secret", b"label", b"seed", n);
            assert_eq!(out.len(), n);
        }
    }

    #[test]
    fn prf_is_deterministic() {
        let backend = DefaultCryptoBackend;
        let a = backend.prf(b"secret", b"master secret", b"seed", 48);
        let b = backend.prf(b"secret", b"master secret", b"seed", 48);
        assert_eq!(a, b);
    }

    /// RFC 4231 test case 1, checking the HMAC-SHA-256 primitive the PRF is
    /// built on against a known-answer vector rather than only round-tripping
    /// against itself.
    #[test]
    fn hmac_sha256_matches_rfc4231_test_case_1() {
        let key = hex::decode("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();
        let data = b"Hi There";
        let expected = hex::decode("b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7").unwrap();

        let backend = DefaultCryptoBackend;
        let mac = backend.hmac(MacAlgorithm::Sha256, &key, data);
        assert_eq!(mac, expected);
    }
}
