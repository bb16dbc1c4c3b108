//! Crate-wide error type and its mapping onto TLS alert descriptions.

use std::fmt;

use crate::alert::AlertDescription;

/// Failure while decoding a length-prefixed or fixed-width wire value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Not enough bytes were available to decode the value.
    Truncated,
    /// A length prefix did not match the number of bytes consumed.
    LengthMismatch,
    /// An enumerated wire value (content type, handshake type, ...) was not
    /// one of the values this engine understands.
    UnknownValue(&'static str, u32),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Truncated => write!(f, "truncated wire value"),
            CodecError::LengthMismatch => write!(f, "length prefix did not match body"),
            CodecError::UnknownValue(field, value) => {
                write!(f, "unknown value {value} for field {field}")
            }
        }
    }
}

/// All failure modes the engine can produce.
///
/// Every variant maps to a TLS alert description via [`Error::alert`]; the
/// context uses that mapping to enqueue the correct fatal alert before
/// transitioning to `CLOSED` (spec §7).
#[derive(Debug)]
pub enum Error {
    /// Wrong record or handshake message type for the current state.
    UnexpectedMessage(String),
    /// Record MAC verification or padding check failed.
    BadRecordMac,
    /// Finished mismatch, unacceptable cipher suite, or an unimplemented
    /// key-exchange algorithm was selected.
    HandshakeFailure(String),
    /// Record-layer version outside the range this engine accepts.
    ProtocolVersion(u16),
    /// A record exceeded the maximum permitted length.
    RecordOverflow(usize),
    /// Renegotiation was attempted; this engine does not implement it.
    NoRenegotiation,
    /// Backend failure or an internal invariant violation.
    Internal(String),
    /// The crypto backend reported a failure (RSA, PRF, random, ...).
    Crypto(String),
    /// A handshake message failed to decode.
    Codec(CodecError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedMessage(ctx) => write!(f, "unexpected message: {ctx}"),
            Error::BadRecordMac => write!(f, "bad record MAC"),
            Error::HandshakeFailure(ctx) => write!(f, "handshake failure: {ctx}"),
            Error::ProtocolVersion(v) => write!(f, "unsupported protocol version {v:#06x}"),
            Error::RecordOverflow(n) => write!(f, "record overflow: {n} bytes"),
            Error::NoRenegotiation => write!(f, "renegotiation is not supported"),
            Error::Internal(ctx) => write!(f, "internal error: {ctx}"),
            Error::Crypto(ctx) => write!(f, "crypto backend error: {ctx}"),
            Error::Codec(e) => write!(f, "codec error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl Error {
    /// Maps this error onto the TLS alert description the context must send
    /// (or has received) before shutting down, per spec.md §7.
    pub fn alert(&self) -> AlertDescription {
        match self {
            Error::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
            Error::BadRecordMac => AlertDescription::BadRecordMac,
            Error::HandshakeFailure(_) => AlertDescription::HandshakeFailure,
            Error::ProtocolVersion(_) => AlertDescription::ProtocolVersion,
            Error::RecordOverflow(_) => AlertDescription::RecordOverflow,
            Error::NoRenegotiation => AlertDescription::NoRenegotiation,
            Error::Internal(_) => AlertDescription::InternalError,
            Error::Crypto(_) => AlertDescription::InternalError,
            Error::Codec(_) => AlertDescription::UnexpectedMessage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
