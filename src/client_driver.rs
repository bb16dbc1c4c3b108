//! Client-side [`Driver`]: ClientHello construction, server certificate
//! handling, and the full/abbreviated handshake completion paths
//! (spec.md §4.3, §4.4).

use std::sync::Arc;

use crate::cipher_suite;
use crate::context::{Core, Proposed, State};
use crate::crypto::RsaPublicKey;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::handshake::{
    Certificate, ClientHello, ClientKeyExchange, Finished, HandshakeMessage, RawHandshakeMessage, ServerHello,
};
use crate::prf::{self, LABEL_CLIENT_FINISHED, LABEL_SERVER_FINISHED};
use crate::security_parameters::SecurityParameters;
use crate::session_cache::{SessionCache, SessionCacheEntry};

fn gmt_unix_time() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

pub struct ClientDriver {
    session_cache: Arc<SessionCache>,
    server_name: Option<String>,
    offered_cipher_suites: Vec<u16>,
    server_pubkey: Option<Box<dyn RsaPublicKey>>,
    resuming: bool,
}

impl ClientDriver {
    pub fn new(session_cache: Arc<SessionCache>, server_name: Option<String>) -> Self {
        Self::with_cipher_suites(
            session_cache,
            server_name,
            cipher_suite::KNOWN_SUITES.iter().map(|s| s.code).collect(),
        )
    }

    /// Like [`ClientDriver::new`], but offers only `cipher_suites` instead of
    /// every suite this engine recognizes (spec.md §3 "Cipher Suite";
    /// selecting a narrower offer is a caller-side policy choice).
    pub fn with_cipher_suites(session_cache: Arc<SessionCache>, server_name: Option<String>, cipher_suites: Vec<u16>) -> Self {
        ClientDriver {
            session_cache,
            server_name,
            offered_cipher_suites: cipher_suites,
            server_pubkey: None,
            resuming: false,
        }
    }

    fn send_client_hello(&mut self, core: &mut Core) -> Result<()> {
        let cached = self
            .server_name
            .as_deref()
            .and_then(|name| self.session_cache.get(name));

        let client_random = {
            let mut r = [0u8; 28];
            r.copy_from_slice(&core.backend.random(28));
            crate::handshake::messages::make_random(gmt_unix_time(), &r)
        };
        core.pending.security_parameters.client_random = client_random;

        let session_id = cached.as_ref().map(|e| e.session_id.clone()).unwrap_or_default();

        core.proposed = Some(Proposed {
            session_id: session_id.clone(),
            cipher_suites: self.offered_cipher_suites.clone(),
            compression_methods: vec![0],
            tls_version: core.tls_version,
        });

        let hello = ClientHello {
            version: core.tls_version,
            random: client_random,
            session_id,
            cipher_suites: self.offered_cipher_suites.clone(),
            compression_methods: vec![0],
            server_name: self.server_name.clone(),
        };
        core.enqueue_handshake(HandshakeMessage::ClientHello(hello))
    }

    /// Builds and sends ClientKeyExchange, switches the write epoch, and
    /// sends this side's Finished (spec.md §4.3 "ClientKeyExchange ->
    /// ChangeCipherSpec -> Finished").
    fn finish_full_handshake(&mut self, core: &mut Core) -> Result<()> {
        let pubkey = self
            .server_pubkey
            .take()
            .ok_or_else(|| Error::UnexpectedMessage("ServerHelloDone before Certificate".into()))?;

        let proposed_version = core
            .proposed
            .as_ref()
            .map(|p| p.tls_version)
            .unwrap_or(core.tls_version);
        let mut premaster = Vec::with_capacity(48);
        premaster.extend_from_slice(&proposed_version.to_be_bytes());
        premaster.extend_from_slice(&core.backend.random(46));

        let encrypted = core.backend.rsa_encrypt(pubkey.as_ref(), &premaster)?;
        core.enqueue_handshake(HandshakeMessage::ClientKeyExchange(ClientKeyExchange {
            encrypted_pre_master_secret: encrypted,
        }))?;

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

        core.enqueue_change_cipher_spec()?;
        let verify_data = core.compute_outbound_verify_data(LABEL_CLIENT_FINISHED);
        core.enqueue_handshake(HandshakeMessage::Finished(Finished { verify_data }))
    }

    /// Sends this side's ChangeCipherSpec + Finished to complete an
    /// abbreviated (session-resumption) handshake, after verifying the
    /// server's (spec.md §4.4 "Session resumption (client)").
    fn finish_abbreviated_handshake(&mut self, core: &mut Core) -> Result<()> {
        core.enqueue_change_cipher_spec()?;
        let verify_data = core.compute_outbound_verify_data(LABEL_CLIENT_FINISHED);
        core.enqueue_handshake(HandshakeMessage::Finished(Finished { verify_data }))
    }

    fn remember_session(&self, core: &Core) {
        let Some(name) = self.server_name.clone() else {
            return;
        };
        let Some(suite) = core.pending.cipher else {
            return;
        };
        self.session_cache.insert(
            name,
            SessionCacheEntry {
                session_id: core.session_id.clone(),
                tls_version: core.tls_version,
                cipher_suite: suite,
                compression_method: 0,
                security_parameters: core.pending.security_parameters.clone(),
            },
        );
    }
}

impl Driver for ClientDriver {
    fn on_state_enter(&mut self, core: &mut Core, state: State) -> Result<()> {
        match state {
            State::HsStart => self.send_client_hello(core),
            State::Open => {
                self.remember_session(core);
                Ok(())
            }
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
            (State::HsStart, HandshakeMessage::ServerHello(hello)) => self.on_server_hello(core, hello),
            (State::SessNew, HandshakeMessage::Certificate(cert)) => self.on_certificate(core, cert),
            (State::SessNew, HandshakeMessage::ServerHelloDone(_)) => {
                self.finish_full_handshake(core)?;
                Ok(Some(State::HsHalf))
            }
            (State::HsHalf, HandshakeMessage::Finished(finished)) => {
                // Abbreviated handshake: the server's Finished arrives
                // after our decode epoch switched but before we have sent
                // our own ChangeCipherSpec/Finished.
                self.verify_peer_finished(core, finished, raw.wire.len(), LABEL_SERVER_FINISHED)?;
                self.finish_abbreviated_handshake(core)?;
                core.advance_state(State::HsFull);
                Ok(Some(State::Open))
            }
            (State::HsFull, HandshakeMessage::Finished(finished)) => {
                self.verify_peer_finished(core, finished, raw.wire.len(), LABEL_SERVER_FINISHED)?;
                Ok(Some(State::Open))
            }
            _ => Err(Error::UnexpectedMessage(format!(
                "client received {:?} in state {:?}",
                msg.handshake_type(),
                core.state
            ))),
        }
    }

    fn on_change_cipher_spec(&mut self, core: &mut Core) -> Result<Option<State>> {
        match core.state {
            State::SessResume => {
                core.apply_change_cipher_spec_decode()?;
                Ok(Some(State::HsHalf))
            }
            State::HsHalf => {
                core.apply_change_cipher_spec_decode()?;
                Ok(Some(State::HsFull))
            }
            _ => Err(Error::UnexpectedMessage(format!(
                "unexpected ChangeCipherSpec in state {:?}",
                core.state
            ))),
        }
    }
}

impl ClientDriver {
    fn on_server_hello(&mut self, core: &mut Core, hello: &ServerHello) -> Result<Option<State>> {
        let suite = cipher_suite::lookup(hello.cipher_suite)
            .ok_or_else(|| Error::HandshakeFailure(format!("unsupported cipher suite {:#06x}", hello.cipher_suite)))?;
        log::debug!("client: server selected {}", suite);
        core.tls_version = hello.version;
        core.session_id = hello.session_id.clone();
        core.pending.cipher = Some(suite);
        core.pending.security_parameters.server_random = hello.random;

        let offered_session_id = core.proposed.as_ref().map(|p| p.session_id.clone()).unwrap_or_default();
        let cached = self
            .server_name
            .as_deref()
            .and_then(|name| self.session_cache.get(name));

        if !offered_session_id.is_empty() && offered_session_id == hello.session_id {
            if let Some(entry) = cached {
                log::debug!("client: resuming session (session_id len={})", entry.session_id.len());
                self.resuming = true;
                core.pending.security_parameters = SecurityParameters::from_cipher_suite(
                    core.pending.security_parameters.connection_end,
                    &suite,
                    entry.security_parameters.master_secret,
                    core.pending.security_parameters.client_random,
                    hello.random,
                );
                return Ok(Some(State::SessResume));
            }
        }

        if let Some(name) = &self.server_name {
            if !offered_session_id.is_empty() {
                // The server ignored our resumption offer with a fresh
                // session_id; the old entry no longer applies.
                self.session_cache.evict(name);
            }
        }
        self.resuming = false;
        Ok(Some(State::SessNew))
    }

    fn on_certificate(&mut self, core: &mut Core, cert: &Certificate) -> Result<Option<State>> {
        self.server_pubkey = Some(core.backend.cert_pubkey(&cert.der)?);
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
}
