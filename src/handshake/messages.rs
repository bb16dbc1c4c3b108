//! Wire encoding/decoding of each handshake message body (spec.md §4.3).

use crate::codec::{CodecError, Reader, Writer};

use super::extensions::{decode_extensions, encode_server_name_extension, find_server_name};

/// `gmt_unix_time:u32_be || random_bytes(28)` (spec.md §4.3 "Random
/// construction").
pub fn make_random(gmt_unix_time: u32, random_28: &[u8; 28]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[0..4].copy_from_slice(&gmt_unix_time.to_be_bytes());
    out[4..32].copy_from_slice(random_28);
    out
}

#[derive(Debug, Clone)]
pub struct ClientHello {
    pub version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub server_name: Option<String>,
}

impl ClientHello {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u16(self.version);
        out.put_bytes(&self.random);
        out.put_vec_u8(&self.session_id);

        let mut suites = Vec::new();
        for s in &self.cipher_suites {
            suites.put_u16(*s);
        }
        out.put_vec_u16(&suites);

        out.put_vec_u8(&self.compression_methods);

        if let Some(name) = &self.server_name {
            let entry = encode_server_name_extension(name);
            out.put_vec_u16(&entry);
        }
    }

    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(body);
        let version = r.u16()?;
        let random: [u8; 32] = r.take(32)?.try_into().unwrap();
        let session_id = r.vec_u8()?.to_vec();

        let suites_raw = r.vec_u16()?;
        let mut suites_r = Reader::new(suites_raw);
        let mut cipher_suites = Vec::new();
        while suites_r.remaining() > 0 {
            cipher_suites.push(suites_r.u16()?);
        }

        let compression_methods = r.vec_u8()?.to_vec();

        let extensions = decode_extensions(&mut r)?;
        let server_name = find_server_name(&extensions).map(str::to_owned);

        Ok(ClientHello {
            version,
            random,
            session_id,
            cipher_suites,
            compression_methods,
            server_name,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerHello {
    pub version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: u16,
    pub compression_method: u8,
}

impl ServerHello {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u16(self.version);
        out.put_bytes(&self.random);
        out.put_vec_u8(&self.session_id);
        out.put_u16(self.cipher_suite);
        out.put_u8(self.compression_method);
        // No extensions are ever produced in a ServerHello by this engine.
    }

    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(body);
        let version = r.u16()?;
        let random: [u8; 32] = r.take(32)?.try_into().unwrap();
        let session_id = r.vec_u8()?.to_vec();
        let cipher_suite = r.u16()?;
        let compression_method = r.u8()?;
        // Ignore any trailing extensions block; not acted upon.
        Ok(ServerHello {
            version,
            random,
            session_id,
            cipher_suite,
            compression_method,
        })
    }
}

/// Only the first certificate in the chain is retained (spec.md §1
/// non-goals: "single cert only").
#[derive(Debug, Clone)]
pub struct Certificate {
    pub der: Vec<u8>,
}

impl Certificate {
    pub fn encode(&self, out: &mut Vec<u8>) {
        let mut one_cert = Vec::new();
        one_cert.put_vec_u24(&self.der);
        out.put_vec_u24(&one_cert);
    }

    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(body);
        let list = r.vec_u24()?;
        let mut list_r = Reader::new(list);
        let first = list_r.vec_u24()?;
        Ok(Certificate { der: first.to_vec() })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ServerHelloDone;

impl ServerHelloDone {
    pub fn encode(&self, _out: &mut Vec<u8>) {}

    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        if !body.is_empty() {
            return Err(CodecError::LengthMismatch);
        }
        Ok(ServerHelloDone)
    }
}

#[derive(Debug, Clone)]
pub struct ClientKeyExchange {
    pub encrypted_pre_master_secret: Vec<u8>,
}

impl ClientKeyExchange {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_vec_u16(&self.encrypted_pre_master_secret);
    }

    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(body);
        let epms = r.vec_u16()?.to_vec();
        Ok(ClientKeyExchange {
            encrypted_pre_master_secret: epms,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Finished {
    pub verify_data: [u8; 12],
}

impl Finished {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_bytes(&self.verify_data);
    }

    pub fn decode(body: &[u8]) -> Result<Self, CodecError> {
        if body.len() != 12 {
            return Err(CodecError::LengthMismatch);
        }
        Ok(Finished {
            verify_data: body.try_into().unwrap(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_hello_round_trip_with_sni() {
        let ch = ClientHello {
            version: 0x0303,
            random: [7u8; 32],
            session_id: vec![1, 2, 3],
            cipher_suites: vec![0x002F, 0x0002],
            compression_methods: vec![0],
            server_name: Some("example.com".into()),
        };
        let mut buf = Vec::new();
        ch.encode(&mut buf);
        let decoded = ClientHello::decode(&buf).unwrap();
        assert_eq!(decoded.version, 0x0303);
        assert_eq!(decoded.session_id, vec![1, 2, 3]);
        assert_eq!(decoded.cipher_suites, vec![0x002F, 0x0002]);
        assert_eq!(decoded.server_name.as_deref(), Some("example.com"));
    }

    #[test]
    fn client_hello_without_sni_has_no_server_name() {
        let ch = ClientHello {
            version: 0x0303,
            random: [0u8; 32],
            session_id: vec![],
            cipher_suites: vec![0x0002],
            compression_methods: vec![0],
            server_name: None,
        };
        let mut buf = Vec::new();
        ch.encode(&mut buf);
        let decoded = ClientHello::decode(&buf).unwrap();
        assert!(decoded.server_name.is_none());
    }

    #[test]
    fn certificate_keeps_only_first() {
        let cert = Certificate { der: vec![9, 9, 9] };
        let mut buf = Vec::new();
        cert.encode(&mut buf);
        let decoded = Certificate::decode(&buf).unwrap();
        assert_eq!(decoded.der, vec![9, 9, 9]);
    }

    #[test]
    fn finished_requires_exactly_12_bytes() {
        assert!(Finished::decode(&[0u8; 11]).is_err());
        assert!(Finished::decode(&[0u8; 12]).is_ok());
    }
}
