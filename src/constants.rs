//! Content-type, handshake-type, and protocol-version enumerations
//! (spec.md §3, §4.1, §4.3).

use crate::codec::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
}

impl ContentType {
    pub fn to_u8(self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
        }
    }

    pub fn from_u8(v: u8) -> Result<Self, CodecError> {
        match v {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            _ => Err(CodecError::UnknownValue("ContentType", v as u32)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeType {
    HelloRequest,
    ClientHello,
    ServerHello,
    Certificate,
    ServerHelloDone,
    ClientKeyExchange,
    Finished,
}

impl HandshakeType {
    pub fn to_u8(self) -> u8 {
        match self {
            HandshakeType::HelloRequest => 0,
            HandshakeType::ClientHello => 1,
            HandshakeType::ServerHello => 2,
            HandshakeType::Certificate => 11,
            HandshakeType::ServerHelloDone => 14,
            HandshakeType::ClientKeyExchange => 16,
            HandshakeType::Finished => 20,
        }
    }

    pub fn from_u8(v: u8) -> Result<Self, CodecError> {
        match v {
            0 => Ok(HandshakeType::HelloRequest),
            1 => Ok(HandshakeType::ClientHello),
            2 => Ok(HandshakeType::ServerHello),
            11 => Ok(HandshakeType::Certificate),
            14 => Ok(HandshakeType::ServerHelloDone),
            16 => Ok(HandshakeType::ClientKeyExchange),
            20 => Ok(HandshakeType::Finished),
            _ => Err(CodecError::UnknownValue("HandshakeType", v as u32)),
        }
    }
}

/// `ProtocolVersion` is carried as a raw `u16` (`major << 8 | minor`) rather
/// than a `major.minor` pair, since the record layer only ever needs to
/// compare it against the handful of constants below (spec.md §4.1 step 2).
pub const TLS_1_0_VERSION: u16 = 0x0301;
pub const TLS_1_1_VERSION: u16 = 0x0302;
pub const TLS_1_2_VERSION: u16 = 0x0303;

/// The record layer accepts any version it recognizes as a legacy or
/// current TLS version; only the handshake layer enforces 1.2 exactly
/// (spec.md §4.1 step 2).
pub fn is_tls_version(v: u16) -> bool {
    matches!(v, TLS_1_0_VERSION | TLS_1_1_VERSION | TLS_1_2_VERSION)
}

/// Maximum plaintext length before protection (spec.md §8 boundaries).
pub const MAX_PLAINTEXT_LEN: usize = 1 << 14;

/// Maximum on-the-wire length after protection (spec.md §4.1, §8, design
/// note (d)).
pub const MAX_CIPHERTEXT_LEN: usize = (1 << 14) + 2048;
