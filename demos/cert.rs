//! Minimal self-signed X.509 DER certificate builder for the loopback
//! demo. The engine never verifies a certificate's signature or chain of
//! trust (spec.md §1 non-goals: certificate validation is out of scope),
//! so the only requirement here is a well-formed DER structure carrying a
//! real RSA `subjectPublicKeyInfo` that `x509-parser` can decode.

fn der_len(n: usize) -> Vec<u8> {
    if n < 0x80 {
        vec![n as u8]
    } else {
        let bytes = n.to_be_bytes();
        let trimmed: Vec<u8> = bytes.iter().skip_while(|&&b| b == 0).copied().collect();
        let mut out = vec![0x80 | trimmed.len() as u8];
        out.extend_from_slice(&trimmed);
        out
    }
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&der_len(content.len()));
    out.extend_from_slice(content);
    out
}

fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &parts.concat())
}

fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x31, &parts.concat())
}

fn integer_small(v: u64) -> Vec<u8> {
    let mut bytes = v.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    tlv(0x02, &bytes)
}

fn oid(arcs_der: &[u8]) -> Vec<u8> {
    tlv(0x06, arcs_der)
}

fn null() -> Vec<u8> {
    tlv(0x05, &[])
}

fn printable_string(s: &str) -> Vec<u8> {
    tlv(0x13, s.as_bytes())
}

fn utc_time(s: &str) -> Vec<u8> {
    tlv(0x17, s.as_bytes())
}

fn bit_string(bytes: &[u8]) -> Vec<u8> {
    let mut content = vec![0u8];
    content.extend_from_slice(bytes);
    tlv(0x03, &content)
}

const RSA_ENCRYPTION_OID: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
const SHA256_WITH_RSA_OID: [u8; 9] = [0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B];
const COMMON_NAME_OID: [u8; 3] = [0x55, 0x04, 0x03];

fn rdn_common_name(name: &str) -> Vec<u8> {
    sequence(&[
        set(&[sequence(&[oid(&COMMON_NAME_OID), printable_string(name)])]),
    ])
}

/// Builds a self-signed certificate for `common_name` carrying
/// `rsa_public_key_pkcs1_der` as its subject public key.
pub fn build_self_signed_certificate(common_name: &str, rsa_public_key_pkcs1_der: &[u8]) -> Vec<u8> {
    let rsa_encryption_alg = sequence(&[oid(&RSA_ENCRYPTION_OID), null()]);
    let signature_alg = sequence(&[oid(&SHA256_WITH_RSA_OID), null()]);

    let issuer = rdn_common_name(common_name);
    let subject = issuer.clone();
    let validity = sequence(&[utc_time("250101000000Z"), utc_time("350101000000Z")]);
    let spki = sequence(&[rsa_encryption_alg, bit_string(rsa_public_key_pkcs1_der)]);

    let tbs_certificate = sequence(&[
        integer_small(1),
        signature_alg.clone(),
        issuer,
        validity,
        subject,
        spki,
    ]);

    // Not an actual signature over `tbs_certificate` — the engine never
    // checks it (spec.md §1 non-goals).
    let signature_value = bit_string(&[0u8; 32]);

    sequence(&[tbs_certificate, signature_alg, signature_value])
}
