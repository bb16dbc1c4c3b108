//! Record protection: MAC+encrypt on the way out, decrypt+verify on the
//! way in (spec.md §4.1 steps 3 and 5, §9 design note (c)).

use crate::cipher_suite::{BulkCipher, CipherType};
use crate::constants::ContentType;
use crate::crypto::CryptoBackend;
use crate::error::{Error, Result};
use crate::security_parameters::{ConnectionEnd, KeyBlock, SecurityParameters};

/// Builds the MAC input: `seq || type || version || length || fragment`
/// (spec.md §4.1 step 5).
fn mac_input(seq: u64, content_type: ContentType, version: u16, fragment: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(13 + fragment.len());
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.push(content_type.to_u8());
    buf.extend_from_slice(&version.to_be_bytes());
    buf.extend_from_slice(&(fragment.len() as u16).to_be_bytes());
    buf.extend_from_slice(fragment);
    buf
}

fn pkcs7_pad(data: &mut Vec<u8>, block_len: usize) {
    let pad_len = block_len - (data.len() % block_len);
    data.resize(data.len() + pad_len, (pad_len - 1) as u8);
}

fn pkcs7_unpad(data: &mut Vec<u8>) -> Result<()> {
    let pad_byte = *data.last().ok_or(Error::BadRecordMac)?;
    let pad_len = pad_byte as usize + 1;
    if pad_len > data.len() {
        return Err(Error::BadRecordMac);
    }
    if !data[data.len() - pad_len..].iter().all(|&b| b == pad_byte) {
        return Err(Error::BadRecordMac);
    }
    data.truncate(data.len() - pad_len);
    Ok(())
}

/// Protects an outbound fragment: `self_end` identifies which side's write
/// keys to use (always the encoding context's own endpoint).
pub fn encode(
    backend: &dyn CryptoBackend,
    params: &SecurityParameters,
    key_block: Option<&KeyBlock>,
    self_end: ConnectionEnd,
    seq: u64,
    content_type: ContentType,
    version: u16,
    fragment: &[u8],
) -> Result<Vec<u8>> {
    if params.is_null_cipher() {
        return Ok(fragment.to_vec());
    }

    let key_block = key_block.ok_or_else(|| Error::Internal("no key block for active cipher".into()))?;
    let mac_key = key_block.mac_key_for(self_end);
    let mac = backend.hmac(params.mac, mac_key, &mac_input(seq, content_type, version, fragment));

    match params.cipher_type {
        CipherType::Stream => {
            let enc_key = key_block.enc_key_for(self_end);
            let mut plain = fragment.to_vec();
            plain.extend_from_slice(&mac);
            Ok(encrypt_stream(backend, params.bulk_cipher, enc_key, &plain)?)
        }
        CipherType::Block => {
            let enc_key = key_block.enc_key_for(self_end);
            let mut plain = fragment.to_vec();
            plain.extend_from_slice(&mac);
            pkcs7_pad(&mut plain, params.block_length);

            let iv = backend.random(params.record_iv_length);
            let ciphertext = encrypt_block(backend, params.bulk_cipher, enc_key, &iv, &plain)?;

            let mut out = Vec::with_capacity(iv.len() + ciphertext.len());
            out.extend_from_slice(&iv);
            out.extend_from_slice(&ciphertext);
            Ok(out)
        }
    }
}

/// Unprotects an inbound fragment: `peer_end` identifies which side's write
/// keys produced it (the opposite of the decoding context's own endpoint).
pub fn decode(
    backend: &dyn CryptoBackend,
    params: &SecurityParameters,
    key_block: Option<&KeyBlock>,
    peer_end: ConnectionEnd,
    seq: u64,
    content_type: ContentType,
    version: u16,
    protected: &[u8],
) -> Result<Vec<u8>> {
    if params.is_null_cipher() {
        return Ok(protected.to_vec());
    }

    let key_block = key_block.ok_or_else(|| Error::Internal("no key block for active cipher".into()))?;
    let enc_key = key_block.enc_key_for(peer_end);
    let mac_key = key_block.mac_key_for(peer_end);

    let mut plain = match params.cipher_type {
        CipherType::Stream => decrypt_stream(backend, params.bulk_cipher, enc_key, protected)?,
        CipherType::Block => {
            if protected.len() < params.record_iv_length {
                return Err(Error::BadRecordMac);
            }
            let (iv, ciphertext) = protected.split_at(params.record_iv_length);
            let mut plain = decrypt_block(backend, params.bulk_cipher, enc_key, iv, ciphertext)?;
            pkcs7_unpad(&mut plain)?;
            plain
        }
    };

    if plain.len() < params.mac_length {
        return Err(Error::BadRecordMac);
    }
    let split_at = plain.len() - params.mac_length;
    let received_mac = plain.split_off(split_at);
    let fragment = plain;

    let expected_mac = backend.hmac(params.mac, mac_key, &mac_input(seq, content_type, version, &fragment));
    if expected_mac != received_mac {
        return Err(Error::BadRecordMac);
    }

    Ok(fragment)
}

fn encrypt_stream(backend: &dyn CryptoBackend, cipher: BulkCipher, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    match cipher {
        BulkCipher::Rc4_128 => Ok(backend.rc4(key, data)),
        _ => Err(Error::Internal("not a stream cipher".into())),
    }
}

fn decrypt_stream(backend: &dyn CryptoBackend, cipher: BulkCipher, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    // RC4 is its own inverse.
    encrypt_stream(backend, cipher, key, data)
}

fn encrypt_block(
    backend: &dyn CryptoBackend,
    cipher: BulkCipher,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    match cipher {
        BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => backend.aes_cbc_encrypt(key, iv, data),
        BulkCipher::TripleDesEdeCbc => backend.des_ede3_cbc_encrypt(key, iv, data),
        _ => Err(Error::Internal("not a block cipher".into())),
    }
}

fn decrypt_block(
    backend: &dyn CryptoBackend,
    cipher: BulkCipher,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>> {
    match cipher {
        BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => backend.aes_cbc_decrypt(key, iv, data),
        BulkCipher::TripleDesEdeCbc => backend.des_ede3_cbc_decrypt(key, iv, data),
        _ => Err(Error::Internal("not a block cipher".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_suite::TLS_RSA_WITH_AES_128_CBC_SHA;
    use crate::crypto::DefaultCryptoBackend;

    fn params_and_keys() -> (SecurityParameters, KeyBlock) {
        let suite = TLS_RSA_WITH_AES_128_CBC_SHA;
        let params = SecurityParameters::from_cipher_suite(
            ConnectionEnd::Client,
            &suite,
            [0u8; 48],
            [1u8; 32],
            [2u8; 32],
        );
        let kb = KeyBlock {
            client_write_mac_key: vec![3u8; suite.mac_key_length],
            server_write_mac_key: vec![4u8; suite.mac_key_length],
            client_write_enc_key: vec![5u8; suite.enc_key_length],
            server_write_enc_key: vec![6u8; suite.enc_key_length],
            client_write_iv: vec![],
            server_write_iv: vec![],
        };
        (params, kb)
    }

    #[test]
    fn cbc_round_trips() {
        let backend = DefaultCryptoBackend;
        let (params, kb) = params_and_keys();

        let protected = encode(
            &backend,
            &params,
            Some(&kb),
            ConnectionEnd::Client,
            0,
            ContentType::ApplicationData,
            0x0303,
            b"ping\n",
        )
        .unwrap();

        // header(0) + IV(16) + ciphertext(len(5+20 padded to 32)) == 16 + 32 = 48
        assert_eq!(protected.len(), 16 + 32);

        let recovered = decode(
            &backend,
            &params,
            Some(&kb),
            ConnectionEnd::Client,
            0,
            ContentType::ApplicationData,
            0x0303,
            &protected,
        )
        .unwrap();
        assert_eq!(recovered, b"ping\n");
    }

    #[test]
    fn cbc_bad_mac_is_rejected() {
        let backend = DefaultCryptoBackend;
        let (params, kb) = params_and_keys();

        let mut protected = encode(
            &backend,
            &params,
            Some(&kb),
            ConnectionEnd::Client,
            0,
            ContentType::ApplicationData,
            0x0303,
            b"ping\n",
        )
        .unwrap();
        let last = protected.len() - 1;
        protected[last] ^= 0xFF;

        let err = decode(
            &backend,
            &params,
            Some(&kb),
            ConnectionEnd::Client,
            0,
            ContentType::ApplicationData,
            0x0303,
            &protected,
        )
        .unwrap_err();
        assert!(matches!(err, Error::BadRecordMac));
    }

    #[test]
    fn null_cipher_is_identity() {
        let backend = DefaultCryptoBackend;
        let params = SecurityParameters::initial(ConnectionEnd::Client);
        let out = encode(
            &backend,
            &params,
            None,
            ConnectionEnd::Client,
            0,
            ContentType::ApplicationData,
            0x0303,
            b"abc",
        )
        .unwrap();
        assert_eq!(out, b"abc");
    }
}
