//! The public per-connection handle: `feed`/`next_record`/`send`, wrapping
//! [`Core`] and a boxed [`Driver`] (spec.md §5 "Connection API").

use crate::alert::{Alert, AlertDescription};
use crate::codec::Reader;
use crate::constants::{ContentType, HandshakeType};
use crate::context::{Core, Endpoint, State};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::handshake::HandshakeMessage;
use crate::protection;
use crate::record::{self, ParsedRecord};

/// A sans-I/O TLS 1.2 connection: bytes in via [`Connection::feed`], bytes
/// out via [`Connection::next_record`]. Owns no socket (spec.md §1).
pub struct Connection {
    core: Core,
    driver: Option<Box<dyn Driver>>,
    in_buf: Vec<u8>,
}

impl Connection {
    pub(crate) fn new(core: Core, driver: Box<dyn Driver>) -> Self {
        Connection {
            core,
            driver: Some(driver),
            in_buf: Vec::new(),
        }
    }

    pub fn on_data(&mut self, cb: impl FnMut(&[u8]) + 'static) {
        self.core.callbacks.on_data = Some(Box::new(cb));
    }

    pub fn on_handshake_finish(&mut self, cb: impl FnMut() + 'static) {
        self.core.callbacks.on_handshake_finish = Some(Box::new(cb));
    }

    pub fn on_change_state(&mut self, cb: impl FnMut(State, State) + 'static) {
        self.core.callbacks.on_change_state = Some(Box::new(cb));
    }

    pub fn on_error(&mut self, cb: impl FnMut(u8) + 'static) {
        self.core.callbacks.on_error = Some(Box::new(cb));
    }

    pub fn state(&self) -> State {
        self.core.state
    }

    pub fn is_open(&self) -> bool {
        self.core.state == State::Open
    }

    /// Starts the handshake. Client-only; a server connection starts
    /// passively on the first inbound ClientHello (spec.md §5).
    pub fn start(&mut self) -> Result<()> {
        if self.core.endpoint != Endpoint::Client {
            return Err(Error::Internal("only a client connection can be started explicitly".into()));
        }
        self.transition(State::HsStart)
    }

    /// Feeds inbound bytes (spec.md §5 "feed(bytes)"): parses as many
    /// complete records as are available, dispatching each by content
    /// type, and returns once the buffer is exhausted or the connection
    /// has shut down.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.in_buf.extend_from_slice(bytes);

        loop {
            if self.core.shutdown {
                return Ok(());
            }
            let (content_type, version, consumed, fragment) = match record::parse_record(&self.in_buf) {
                Ok(ParsedRecord::Incomplete) => return Ok(()),
                Ok(ParsedRecord::Complete {
                    content_type,
                    version,
                    payload,
                    consumed,
                }) => {
                    let fragment = self.decode_fragment(content_type, version, payload)?;
                    (content_type, version, consumed, fragment)
                }
                Err(e) => {
                    self.core.fail(e);
                    return Ok(());
                }
            };
            self.in_buf.drain(0..consumed);

            if let Err(e) = self.dispatch_record(content_type, version, &fragment) {
                self.core.fail(e);
                return Ok(());
            }
        }
    }

    fn decode_fragment(&mut self, content_type: ContentType, version: u16, payload: &[u8]) -> Result<Vec<u8>> {
        let (params, key_block) = match &self.core.current_decode {
            Some(epoch) => (epoch.security_parameters.clone(), epoch.key_block.as_ref()),
            None => (
                crate::security_parameters::SecurityParameters::initial(self.core.endpoint.peer()),
                None,
            ),
        };
        let seq = self.core.seq_read;
        let fragment = protection::decode(
            self.core.backend.as_ref(),
            &params,
            key_block,
            self.core.endpoint.peer(),
            seq,
            content_type,
            version,
            payload,
        )?;
        self.core.seq_read += 1;
        Ok(fragment)
    }

    fn dispatch_record(&mut self, content_type: ContentType, _version: u16, fragment: &[u8]) -> Result<()> {
        match content_type {
            ContentType::ChangeCipherSpec => {
                if fragment != [1u8] {
                    return Err(Error::UnexpectedMessage("malformed ChangeCipherSpec".into()));
                }
                self.dispatch_change_cipher_spec()
            }
            ContentType::Alert => self.dispatch_alert(fragment),
            ContentType::Handshake => {
                if self.core.state == State::Open {
                    // Renegotiation is not implemented (spec.md §1
                    // non-goals); reject it with a warning-level alert
                    // rather than tearing down an otherwise healthy
                    // connection (spec.md §9 design note (e)).
                    log::debug!("{:?}: rejecting renegotiation attempt", self.core.endpoint);
                    self.core
                        .enqueue_alert(Alert::warning(AlertDescription::NoRenegotiation))?;
                    return Ok(());
                }
                self.dispatch_handshake(fragment)
            }
            ContentType::ApplicationData => {
                if self.core.state != State::Open {
                    return Err(Error::UnexpectedMessage("application data before handshake completion".into()));
                }
                if let Some(cb) = self.core.callbacks.on_data.as_mut() {
                    cb(fragment);
                }
                Ok(())
            }
        }
    }

    fn dispatch_alert(&mut self, fragment: &[u8]) -> Result<()> {
        let mut r = Reader::new(fragment);
        let alert = Alert::decode(&mut r).map_err(Error::from)?;
        log::debug!(
            "{:?}: received alert level={:?} description={}",
            self.core.endpoint,
            alert.level,
            alert.description.to_u8()
        );
        if alert.is_fatal() || alert.description == AlertDescription::CloseNotify {
            self.core.shutdown = true;
            self.core.error = Some(alert.description);
            if let Some(cb) = self.core.callbacks.on_error.as_mut() {
                cb(alert.description.to_u8());
            }
            self.core.advance_state(State::Closed);
        }
        Ok(())
    }

    fn dispatch_change_cipher_spec(&mut self) -> Result<()> {
        let mut driver = self
            .driver
            .take()
            .ok_or_else(|| Error::Internal("driver missing".into()))?;
        let requested = driver.on_change_cipher_spec(&mut self.core);
        self.driver = Some(driver);
        self.apply_requested_transition(requested)
    }

    fn dispatch_handshake(&mut self, fragment: &[u8]) -> Result<()> {
        self.core.reassembler.feed(fragment);
        while let Some(raw) = self.core.reassembler.next_message().map_err(Error::from)? {
            if raw.hs_type == HandshakeType::HelloRequest {
                // HelloRequest triggers renegotiation in full TLS; this
                // engine ignores it outright rather than rejecting, since
                // it carries no content to fail on (spec.md §1 non-goals).
                continue;
            }
            let msg = HandshakeMessage::decode(raw.hs_type, &raw.body).map_err(Error::from)?;
            self.core.pending.hs_messages.push(&raw.wire);

            let mut driver = self
                .driver
                .take()
                .ok_or_else(|| Error::Internal("driver missing".into()))?;
            let requested = driver.on_handshake_message(&mut self.core, &msg, &raw);
            self.driver = Some(driver);
            self.apply_requested_transition(requested)?;

            if self.core.shutdown {
                break;
            }
        }
        Ok(())
    }

    fn apply_requested_transition(&mut self, requested: Result<Option<State>>) -> Result<()> {
        match requested {
            Ok(Some(state)) => self.transition(state),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Advances `core.state` and invokes `on_state_enter` exactly once for
    /// the new state (spec.md §9 design note).
    fn transition(&mut self, new_state: State) -> Result<()> {
        self.core.advance_state(new_state);
        let mut driver = self
            .driver
            .take()
            .ok_or_else(|| Error::Internal("driver missing".into()))?;
        let result = driver.on_state_enter(&mut self.core, new_state);
        self.driver = Some(driver);
        result
    }

    /// Queues application data for transmission (spec.md §5 "send(bytes)").
    /// Only valid once the handshake has completed.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.core.state != State::Open {
            return Err(Error::Internal("send before handshake completion".into()));
        }
        for chunk in data.chunks(crate::constants::MAX_PLAINTEXT_LEN) {
            self.core.enqueue_application_data(chunk)?;
        }
        Ok(())
    }

    /// Sends `close_notify` and marks the connection shut down (spec.md §5
    /// "close()").
    pub fn close(&mut self) -> Result<()> {
        if self.core.shutdown {
            return Ok(());
        }
        self.core.enqueue_alert(Alert::close_notify())?;
        self.core.shutdown = true;
        self.core.advance_state(State::Closed);
        Ok(())
    }

    /// Tears the connection down immediately without sending
    /// `close_notify`, e.g. after a transport error.
    pub fn shutdown(&mut self) {
        self.core.shutdown = true;
        self.core.advance_state(State::Closed);
    }

    /// Pulls the next queued outbound record, if any (spec.md §5
    /// "next_record()").
    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        self.core.out_queue.pop_front()
    }

    pub fn has_pending_output(&self) -> bool {
        !self.core.out_queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DefaultCryptoBackend;
    use crate::handshake::ClientHello;

    /// A driver that never reacts to anything; used to exercise
    /// `Connection`'s own record-dispatch logic in isolation from either
    /// endpoint's handshake driver.
    struct NoopDriver;

    impl Driver for NoopDriver {
        fn on_state_enter(&mut self, _core: &mut Core, _state: State) -> Result<()> {
            Ok(())
        }
        fn on_handshake_message(
            &mut self,
            _core: &mut Core,
            _msg: &HandshakeMessage,
            _raw: &crate::handshake::RawHandshakeMessage,
        ) -> Result<Option<State>> {
            Ok(None)
        }
        fn on_change_cipher_spec(&mut self, _core: &mut Core) -> Result<Option<State>> {
            Ok(None)
        }
    }

    fn open_connection_with_noop_driver() -> Connection {
        let mut core = Core::new(Endpoint::Server, std::sync::Arc::new(DefaultCryptoBackend));
        core.state = State::Open;
        Connection::new(core, Box::new(NoopDriver))
    }

    #[test]
    fn renegotiation_attempt_while_open_is_rejected_without_tearing_down() {
        let mut conn = open_connection_with_noop_driver();

        let client_hello = HandshakeMessage::ClientHello(ClientHello {
            version: 0x0303,
            random: [0u8; 32],
            session_id: vec![],
            cipher_suites: vec![0x002F],
            compression_methods: vec![0],
            server_name: None,
        })
        .to_wire();
        let record = record::frame(ContentType::Handshake, 0x0303, &client_hello).unwrap();

        conn.feed(&record).unwrap();

        assert_eq!(conn.state(), State::Open);
        let reply = conn.next_record().expect("a NoRenegotiation alert was queued");
        let (content_type, _version, consumed, payload) = match record::parse_record(&reply).unwrap() {
            ParsedRecord::Complete {
                content_type,
                version,
                payload,
                consumed,
            } => (content_type, version, consumed, payload),
            ParsedRecord::Incomplete => panic!("queued record must be complete"),
        };
        assert_eq!(content_type, ContentType::Alert);
        assert_eq!(consumed, reply.len());
        let mut r = Reader::new(payload);
        let alert = Alert::decode(&mut r).unwrap();
        assert!(!alert.is_fatal());
        assert_eq!(alert.description, AlertDescription::NoRenegotiation);
    }

    #[test]
    fn application_data_arriving_before_open_is_rejected() {
        let mut core = Core::new(Endpoint::Server, std::sync::Arc::new(DefaultCryptoBackend));
        core.state = State::HsStart;
        let mut conn = Connection::new(core, Box::new(NoopDriver));

        let record = record::frame(ContentType::ApplicationData, 0x0303, b"too early").unwrap();
        conn.feed(&record).unwrap();

        assert_eq!(conn.state(), State::Closed);
    }
}
