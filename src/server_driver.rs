//! Server-side [`Driver`]: ClientHello processing, cipher/session
//! selection, and the full/abbreviated handshake completion paths
//! (spec.md §4.3, §4.4 "Session resumption (server)").

use std::sync::Arc;

use crate::cipher_suite;
use crate::context::{Core, State};
use crate::crypto::RsaPrivateKey;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::handshake::{
    Certificate, ClientHello, ClientKeyExchange, Finished, HandshakeMessage, RawHandshakeMessage, ServerHello,
    ServerHelloDone,
};
use crate::prf::{self, LABEL_CLIENT_FINISHED, LABEL_SERVER_FINISHED};
use crate::security_parameters::SecurityParameters;
use crate::session_cache::{ServerSessionStore, SessionCacheEntry};

fn gmt_unix_time() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

pub struct ServerDriver {
    cert_der: Arc<Vec<u8>>,
    private_key: Arc<dyn RsaPrivateKey>,
    sessions: Arc<ServerSessionStore>,
    resuming: bool,
}

impl ServerDriver {
    pub fn new(cert_der: Arc<Vec<u8>>, private_key: Arc<dyn RsaPrivateKey>, sessions: Arc<ServerSessionStore>) -> Self {
        ServerDriver {
            cert_der,
            private_key,
            sessions,
            resuming: false,
        }
    }

    fn server_random(&self, core: &Core) -> [u8; 32] {
        let mut r = [0u8; 28];
        r.copy_from_slice(&core.backend.random(28));
        crate::handshake::messages::make_random(gmt_unix_time(), &r)
    }

    /// Handles an inbound ClientHello: picks the cipher suite and decides
    /// full vs abbreviated handshake, then reports the target state
    /// (spec.md §4.3 "Cipher selection (server)", §4.4).
    fn on_client_hello(&mut self, core: &mut Core, hello: &ClientHello) -> Result<Option<State>> {
        let suite = cipher_suite::select_first_supported(&hello.cipher_suites)
            .ok_or_else(|| Error::HandshakeFailure("no mutually supported cipher suite".into()))?;
        log::debug!("server: selected {}", suite);

        core.tls_version = hello.version;
        core.pending.cipher = Some(suite);
        core.pending.security_parameters.client_random = hello.random;

        let resumable = if !hello.session_id.is_empty() {
            self.sessions.get(&hello.session_id)
        } else {
            None
        };

        core.advance_state(State::HsStart);

        if let Some(entry) = resumable {
            log::debug!("server: resuming session (session_id len={})", entry.session_id.len());
            self.resuming = true;
            core.session_id = entry.session_id.clone();

            let server_random = self.server_random(core);
            core.pending.security_parameters = SecurityParameters::from_cipher_suite(
                core.pending.security_parameters.connection_end,
                &suite,
                entry.security_parameters.master_secret,
                hello.random,
                server_random,
            );

            Ok(Some(State::SessResume))
        } else {
            self.resuming = false;
            core.session_id = core.backend.random(32);
            core.pending.security_parameters.server_random = self.server_random(core);
            Ok(Some(State::SessNew))
        }
    }

    /// Sends ServerHello + Certificate + ServerHelloDone for a full
    /// handshake (spec.md §4.3).
    fn send_full_handshake_flight(&mut self, core: &mut Core) -> Result<()> {
        let suite = core
            .pending
            .cipher
            .ok_or_else(|| Error::Internal("no cipher suite chosen".into()))?;

        core.enqueue_handshake(HandshakeMessage::ServerHello(ServerHello {
            version: core.tls_version,
            random: core.pending.security_parameters.server_random,
            session_id: core.session_id.clone(),
            cipher_suite: suite.code,
            compression_method: 0,
        }))?;
        core.enqueue_handshake(HandshakeMessage::Certificate(Certificate {
            der: (*self.cert_der).clone(),
        }))?;
        core.enqueue_handshake(HandshakeMessage::ServerHelloDone(ServerHelloDone))
    }

    /// Sends ServerHello + ChangeCipherSpec + Finished for an abbreviated
    /// handshake: the server speaks first (spec.md §4.4).
    fn send_abbreviated_handshake_flight(&mut self, core: &mut Core) -> Result<()> {
        let suite = core
            .pending
            .cipher
            .ok_or_else(|| Error::Internal("no cipher suite chosen".into()))?;

        core.enqueue_handshake(HandshakeMessage::ServerHello(ServerHello {
            version: core.tls_version,
            random: core.pending.security_parameters.server_random,
            session_id: core.session_id.clone(),
            cipher_suite: suite.code,
            compression_method: 0,
        }))?;
        core.enqueue_change_cipher_spec()?;
        let verify_data = core.compute_outbound_verify_data(LABEL_SERVER_FINISHED);
        core.enqueue_handshake(HandshakeMessage::Finished(Finished { verify_data }))
    }

    fn on_client_key_exchange(&mut self, core: &mut Core, cke: &ClientKeyExchange) -> Result<Option<State>> {
        let premaster = core
            .backend
            .rsa_decrypt(self.private_key.as_ref(), &cke.encrypted_pre_master_secret)
            .map_err(|_| Error::HandshakeFailure("premaster secret decryption failed".into()))?;

        let suite = core
            .pending
            .cipher
            .ok_or_else(|| Error::Internal("no cipher suite chosen".into()))?;
        let master_secret = prf::master_secret(
            core.backend.as_ref(),
            &premaster,
            &core.pending.security_parameters.client_random,
            &core.pending.security_parameters.server_random,
        );
        core.pending.security_parameters = SecurityParameters::from_cipher_suite(
            core.pending.security_parameters.connection_end,
            &suite,
            master_secret,
            core.pending.security_parameters.client_random,
            core.pending.security_parameters.server_random,
        );
        Ok(None)
    }

    fn verify_peer_finished(
        &self,
        core: &Core,
        finished: &Finished,
        raw_len: usize,
        label: &'static [u8],
    ) -> Result<()> {
        let expected = core.compute_inbound_expected_verify_data(label, raw_len);
        if expected != finished.verify_data {
            return Err(Error::HandshakeFailure("Finished verify_data mismatch".into()));
        }
        Ok(())
    }

    fn remember_session(&self, core: &Core) {
        let Some(suite) = core.pending.cipher else {
            return;
        };
        self.sessions.insert(SessionCacheEntry {
            session_id: core.session_id.clone(),
            tls_version: core.tls_version,
            cipher_suite: suite,
            compression_method: 0,
            security_parameters: core.pending.security_parameters.clone(),
        });
    }
}

impl Driver for ServerDriver {
    fn on_state_enter(&mut self, core: &mut Core, state: State) -> Result<()> {
        match state {
            State::SessNew => self.send_full_handshake_flight(core),
            State::SessResume => self.send_abbreviated_handshake_flight(core),
            _ => Ok(()),
        }
    }

    fn on_handshake_message(
        &mut self,
        core: &mut Core,
        msg: &HandshakeMessage,
        raw: &RawHandshakeMessage,
    ) -> Result<Option<State>> {
        match (core.state, msg) {
            (State::Idle, HandshakeMessage::ClientHello(hello)) => self.on_client_hello(core, hello),
            (State::SessNew, HandshakeMessage::ClientKeyExchange(cke)) => self.on_client_key_exchange(core, cke),
            (State::HsHalf, HandshakeMessage::Finished(finished)) if !self.resuming => {
                // Full handshake: our decode epoch has switched, the
                // client's Finished is next; respond with our own.
                self.verify_peer_finished(core, finished, raw.wire.len(), LABEL_CLIENT_FINISHED)?;
                core.enqueue_change_cipher_spec()?;
                let verify_data = core.compute_outbound_verify_data(LABEL_SERVER_FINISHED);
                core.enqueue_handshake(HandshakeMessage::Finished(Finished { verify_data }))?;
                core.advance_state(State::HsFull);
                self.remember_session(core);
                Ok(Some(State::Open))
            }
            (State::HsHalf, HandshakeMessage::Finished(finished)) if self.resuming => {
                // Abbreviated handshake: we already sent our
                // ChangeCipherSpec/Finished when SessResume was entered.
                self.verify_peer_finished(core, finished, raw.wire.len(), LABEL_CLIENT_FINISHED)?;
                self.remember_session(core);
                Ok(Some(State::Open))
            }
            _ => Err(Error::UnexpectedMessage(format!(
                "server received {:?} in state {:?}",
                msg.handshake_type(),
                core.state
            ))),
        }
    }

    fn on_change_cipher_spec(&mut self, core: &mut Core) -> Result<Option<State>> {
        match core.state {
            State::SessNew => {
                core.apply_change_cipher_spec_decode()?;
                Ok(Some(State::HsHalf))
            }
            State::SessResume => {
                core.apply_change_cipher_spec_decode()?;
                Ok(Some(State::HsHalf))
            }
            _ => Err(Error::UnexpectedMessage(format!(
                "unexpected ChangeCipherSpec in state {:?}",
                core.state
            ))),
        }
    }
}
