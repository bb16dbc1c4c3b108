//! Handshake message framing (`hs_type:u8 | length:u24_be | body`) and
//! reassembly across record boundaries (spec.md §4.3, §8 "Boundaries").

pub mod extensions;
pub mod messages;

use crate::codec::{CodecError, Reader, Writer};
use crate::constants::HandshakeType;

pub use messages::{Certificate, ClientHello, ClientKeyExchange, Finished, ServerHello, ServerHelloDone};

#[derive(Debug, Clone)]
pub enum HandshakeMessage {
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    Certificate(Certificate),
    ServerHelloDone(ServerHelloDone),
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
}

impl HandshakeMessage {
    pub fn handshake_type(&self) -> HandshakeType {
        match self {
            HandshakeMessage::ClientHello(_) => HandshakeType::ClientHello,
            HandshakeMessage::ServerHello(_) => HandshakeType::ServerHello,
            HandshakeMessage::Certificate(_) => HandshakeType::Certificate,
            HandshakeMessage::ServerHelloDone(_) => HandshakeType::ServerHelloDone,
            HandshakeMessage::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            HandshakeMessage::Finished(_) => HandshakeType::Finished,
        }
    }

    fn encode_body(&self, out: &mut Vec<u8>) {
        match self {
            HandshakeMessage::ClientHello(m) => m.encode(out),
            HandshakeMessage::ServerHello(m) => m.encode(out),
            HandshakeMessage::Certificate(m) => m.encode(out),
            HandshakeMessage::ServerHelloDone(m) => m.encode(out),
            HandshakeMessage::ClientKeyExchange(m) => m.encode(out),
            HandshakeMessage::Finished(m) => m.encode(out),
        }
    }

    /// Encodes the full `hs_type | length | body` message. The caller is
    /// responsible for appending the result to `pending.hs_messages`
    /// (spec.md §4.3 "Every successfully encoded or decoded handshake
    /// message is appended...").
    pub fn to_wire(&self) -> Vec<u8> {
        let mut body = Vec::new();
        self.encode_body(&mut body);

        let mut out = Vec::with_capacity(4 + body.len());
        out.put_u8(self.handshake_type().to_u8());
        out.put_u24(body.len() as u32);
        out.put_bytes(&body);
        out
    }

    /// Decodes a message body given its type, as already split out by the
    /// reassembler.
    pub fn decode(hs_type: HandshakeType, body: &[u8]) -> Result<Self, CodecError> {
        Ok(match hs_type {
            HandshakeType::ClientHello => HandshakeMessage::ClientHello(ClientHello::decode(body)?),
            HandshakeType::ServerHello => HandshakeMessage::ServerHello(ServerHello::decode(body)?),
            HandshakeType::Certificate => HandshakeMessage::Certificate(Certificate::decode(body)?),
            HandshakeType::ServerHelloDone => {
                HandshakeMessage::ServerHelloDone(ServerHelloDone::decode(body)?)
            }
            HandshakeType::ClientKeyExchange => {
                HandshakeMessage::ClientKeyExchange(ClientKeyExchange::decode(body)?)
            }
            HandshakeType::Finished => HandshakeMessage::Finished(Finished::decode(body)?),
            HandshakeType::HelloRequest => {
                return Err(CodecError::UnknownValue("HandshakeType", 0));
            }
        })
    }
}

/// Reassembles handshake messages out of a stream of `Handshake`
/// content-type payloads, which may split a message across records or pack
/// several messages into one record (spec.md §8 "Fragmentation...").
#[derive(Debug, Default)]
pub struct HandshakeReassembler {
    buf: Vec<u8>,
}

/// One fully reassembled handshake message: its type, full wire bytes
/// (header included, for the transcript), and body.
pub struct RawHandshakeMessage {
    pub hs_type: HandshakeType,
    pub wire: Vec<u8>,
    pub body: Vec<u8>,
}

impl HandshakeReassembler {
    pub fn new() -> Self {
        HandshakeReassembler { buf: Vec::new() }
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn has_pending_bytes(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Pops one complete message if enough bytes have accumulated.
    pub fn next_message(&mut self) -> Result<Option<RawHandshakeMessage>, CodecError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let mut header_reader = Reader::new(&self.buf[0..4]);
        let type_byte = header_reader.u8()?;
        let len = header_reader.u24()? as usize;

        if self.buf.len() < 4 + len {
            return Ok(None);
        }

        let hs_type = HandshakeType::from_u8(type_byte)?;
        let wire: Vec<u8> = self.buf.drain(0..4 + len).collect();
        let body = wire[4..].to_vec();
        Ok(Some(RawHandshakeMessage { hs_type, wire, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_a_message_split_across_two_feeds() {
        let msg = HandshakeMessage::ServerHelloDone(ServerHelloDone);
        let wire = msg.to_wire();
        assert_eq!(wire.len(), 4);

        let mut reasm = HandshakeReassembler::new();
        reasm.feed(&wire[0..2]);
        assert!(reasm.next_message().unwrap().is_none());
        reasm.feed(&wire[2..]);
        let full = reasm.next_message().unwrap().unwrap();
        assert_eq!(full.hs_type, HandshakeType::ServerHelloDone);
        assert!(!reasm.has_pending_bytes());
    }

    #[test]
    fn reassembles_two_messages_fed_together() {
        let a = HandshakeMessage::ServerHelloDone(ServerHelloDone).to_wire();
        let b = HandshakeMessage::Finished(Finished { verify_data: [0u8; 12] }).to_wire();
        let mut combined = a.clone();
        combined.extend_from_slice(&b);

        let mut reasm = HandshakeReassembler::new();
        reasm.feed(&combined);
        let first = reasm.next_message().unwrap().unwrap();
        assert_eq!(first.hs_type, HandshakeType::ServerHelloDone);
        let second = reasm.next_message().unwrap().unwrap();
        assert_eq!(second.hs_type, HandshakeType::Finished);
        assert!(!reasm.has_pending_bytes());
    }
}
