//! Cipher-suite table: the 16-bit wire code and the bundle of algorithms it
//! selects (spec.md §3 "Cipher Suite").

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeAlgorithm {
    Rsa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCipher {
    Null,
    Aes128Cbc,
    Aes256Cbc,
    TripleDesEdeCbc,
    Rc4_128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherType {
    Stream,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgorithm {
    Null,
    Md5,
    Sha,
    Sha256,
}

/// A recognized TLS 1.2 cipher suite and the key-material sizes it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    pub code: u16,
    pub name: &'static str,
    pub key_exchange: KeyExchangeAlgorithm,
    pub bulk_cipher: BulkCipher,
    pub cipher_type: CipherType,
    pub mac: MacAlgorithm,
    pub enc_key_length: usize,
    pub block_length: usize,
    pub fixed_iv_length: usize,
    pub record_iv_length: usize,
    pub mac_length: usize,
    pub mac_key_length: usize,
}

/// Renders the suite's registry name (e.g. `TLS_RSA_WITH_AES_128_CBC_SHA`)
/// for log lines, mirroring the teacher's `PutName`/`AgentName` `Display`
/// impls.
impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const TLS_RSA_WITH_NULL_SHA: CipherSuite = CipherSuite {
    code: 0x0002,
    name: "TLS_RSA_WITH_NULL_SHA",
    key_exchange: KeyExchangeAlgorithm::Rsa,
    bulk_cipher: BulkCipher::Null,
    cipher_type: CipherType::Stream,
    mac: MacAlgorithm::Sha,
    enc_key_length: 0,
    block_length: 0,
    fixed_iv_length: 0,
    record_iv_length: 0,
    mac_length: 20,
    mac_key_length: 20,
};

pub const TLS_RSA_WITH_NULL_SHA256: CipherSuite = CipherSuite {
    code: 0x003B,
    name: "TLS_RSA_WITH_NULL_SHA256",
    key_exchange: KeyExchangeAlgorithm::Rsa,
    bulk_cipher: BulkCipher::Null,
    cipher_type: CipherType::Stream,
    mac: MacAlgorithm::Sha256,
    enc_key_length: 0,
    block_length: 0,
    fixed_iv_length: 0,
    record_iv_length: 0,
    mac_length: 32,
    mac_key_length: 32,
};

pub const TLS_RSA_WITH_AES_128_CBC_SHA: CipherSuite = CipherSuite {
    code: 0x002F,
    name: "TLS_RSA_WITH_AES_128_CBC_SHA",
    key_exchange: KeyExchangeAlgorithm::Rsa,
    bulk_cipher: BulkCipher::Aes128Cbc,
    cipher_type: CipherType::Block,
    mac: MacAlgorithm::Sha,
    enc_key_length: 16,
    block_length: 16,
    fixed_iv_length: 0,
    // TLS 1.2 CBC suites use an explicit, per-record random IV rather than
    // the implicit fixed IV of TLS 1.0/1.1 (spec.md §9 design note (c)).
    record_iv_length: 16,
    mac_length: 20,
    mac_key_length: 20,
};

/// Suites this engine recognizes, in lookup order.
pub const KNOWN_SUITES: &[CipherSuite] = &[
    TLS_RSA_WITH_AES_128_CBC_SHA,
    TLS_RSA_WITH_NULL_SHA,
    TLS_RSA_WITH_NULL_SHA256,
];

/// Looks up a cipher suite by its wire code. Unknown suites return `None`;
/// the caller (ServerHello processing, suite selection) is responsible for
/// aborting the handshake per spec.md §3.
pub fn lookup(code: u16) -> Option<CipherSuite> {
    KNOWN_SUITES.iter().copied().find(|s| s.code == code)
}

/// Looks up a cipher suite by its registry name (case-sensitive), for
/// callers taking a suite on the command line rather than the wire.
pub fn lookup_by_name(name: &str) -> Option<CipherSuite> {
    KNOWN_SUITES.iter().copied().find(|s| s.name == name)
}

/// Server-side suite selection: the first suite offered by the client that
/// this engine recognizes (spec.md §4.3 "Cipher selection (server)").
pub fn select_first_supported(offered: &[u16]) -> Option<CipherSuite> {
    offered.iter().find_map(|code| lookup(*code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_suite_is_none() {
        assert!(lookup(0xffff).is_none());
    }

    #[test]
    fn select_first_supported_skips_unknown() {
        let offered = [0xffff, TLS_RSA_WITH_AES_128_CBC_SHA.code];
        let chosen = select_first_supported(&offered).unwrap();
        assert_eq!(chosen.code, TLS_RSA_WITH_AES_128_CBC_SHA.code);
    }

    #[test]
    fn display_renders_registry_name() {
        assert_eq!(TLS_RSA_WITH_AES_128_CBC_SHA.to_string(), "TLS_RSA_WITH_AES_128_CBC_SHA");
    }

    #[test]
    fn lookup_by_name_round_trips_with_display() {
        let found = lookup_by_name("TLS_RSA_WITH_NULL_SHA256").unwrap();
        assert_eq!(found.code, TLS_RSA_WITH_NULL_SHA256.code);
        assert!(lookup_by_name("TLS_NOT_A_REAL_SUITE").is_none());
    }
}
