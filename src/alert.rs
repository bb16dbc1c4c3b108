//! TLS alert messages: two bytes, `level | description` (spec.md §4.5).

use crate::codec::{CodecError, Reader, Writer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

impl AlertLevel {
    pub fn from_u8(v: u8) -> Result<Self, CodecError> {
        match v {
            1 => Ok(AlertLevel::Warning),
            2 => Ok(AlertLevel::Fatal),
            _ => Err(CodecError::UnknownValue("AlertLevel", v as u32)),
        }
    }
}

/// Alert descriptions this engine can raise or recognize. Only the subset
/// named in spec.md §7 plus `close_notify` and `record_overflow`/
/// `no_renegotiation` (added per design notes (d), (e)) is listed; any other
/// value decoded off the wire is preserved numerically via `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    CloseNotify,
    UnexpectedMessage,
    BadRecordMac,
    RecordOverflow,
    HandshakeFailure,
    ProtocolVersion,
    InternalError,
    NoRenegotiation,
    Other(u8),
}

impl AlertDescription {
    pub fn to_u8(self) -> u8 {
        match self {
            AlertDescription::CloseNotify => 0,
            AlertDescription::UnexpectedMessage => 10,
            AlertDescription::BadRecordMac => 20,
            AlertDescription::RecordOverflow => 22,
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::InternalError => 80,
            AlertDescription::NoRenegotiation => 100,
            AlertDescription::Other(v) => v,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            22 => AlertDescription::RecordOverflow,
            40 => AlertDescription::HandshakeFailure,
            70 => AlertDescription::ProtocolVersion,
            80 => AlertDescription::InternalError,
            100 => AlertDescription::NoRenegotiation,
            other => AlertDescription::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn fatal(description: AlertDescription) -> Self {
        Alert {
            level: AlertLevel::Fatal,
            description,
        }
    }

    /// Per design note (a): the teacher's behavior sends `close_notify` at
    /// fatal level rather than the RFC 5246 §7.2.1 warning level. This
    /// engine follows the source behavior (documented open question) since
    /// spec.md §4.5 calls it out explicitly as the contract to implement.
    pub fn close_notify() -> Self {
        Alert {
            level: AlertLevel::Fatal,
            description: AlertDescription::CloseNotify,
        }
    }

    pub fn warning(description: AlertDescription) -> Self {
        Alert {
            level: AlertLevel::Warning,
            description,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(self.level as u8);
        out.put_u8(self.description.to_u8());
    }

    pub fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        let level = AlertLevel::from_u8(r.u8()?)?;
        let description = AlertDescription::from_u8(r.u8()?);
        Ok(Alert { level, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let a = Alert::fatal(AlertDescription::HandshakeFailure);
        let mut buf = Vec::new();
        a.encode(&mut buf);
        assert_eq!(buf, vec![2, 40]);
        let mut r = Reader::new(&buf);
        let b = Alert::decode(&mut r).unwrap();
        assert_eq!(b.description.to_u8(), 40);
        assert!(b.is_fatal());
    }
}
