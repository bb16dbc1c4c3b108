//! Per-connection state: `State`, `Pending`/`Proposed` parameters, and
//! `Core` — the half of the connection a [`crate::driver::Driver`] is
//! allowed to touch (spec.md §3 "Context").

use std::collections::VecDeque;

use crate::alert::{Alert, AlertDescription};
use crate::cipher_suite::CipherSuite;
use crate::constants::{ContentType, TLS_1_2_VERSION};
use crate::crypto::CryptoBackend;
use crate::error::{Error, Result};
use crate::handshake::{HandshakeMessage, HandshakeReassembler};
use crate::prf;
use crate::protection;
use crate::security_parameters::{ConnectionEnd, KeyBlock, SecurityParameters};
use crate::transcript::Transcript;

/// Connection states, in the order spec.md §3 lists them. `state` never
/// decreases in this order during a single handshake (spec.md §3
/// invariants) — `Closed` is the sole exception, reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    Idle,
    HsStart,
    SessNew,
    SessResume,
    HsHalf,
    HsFull,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Client,
    Server,
}

impl Endpoint {
    pub fn connection_end(self) -> ConnectionEnd {
        match self {
            Endpoint::Client => ConnectionEnd::Client,
            Endpoint::Server => ConnectionEnd::Server,
        }
    }

    pub fn peer(self) -> ConnectionEnd {
        match self {
            Endpoint::Client => ConnectionEnd::Server,
            Endpoint::Server => ConnectionEnd::Client,
        }
    }
}

/// Parameters the client offered in ClientHello (spec.md §3 "proposed
/// (client only)").
#[derive(Debug, Clone)]
pub struct Proposed {
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub tls_version: u16,
}

/// Parameters being negotiated for the epoch about to start (spec.md §3
/// "pending").
pub struct Pending {
    pub security_parameters: SecurityParameters,
    pub key_block: Option<KeyBlock>,
    pub tls_version: u16,
    pub session_id: Vec<u8>,
    pub cipher: Option<CipherSuite>,
    pub hs_messages: Transcript,
}

impl Pending {
    pub fn new(connection_end: ConnectionEnd) -> Self {
        Pending {
            security_parameters: SecurityParameters::initial(connection_end),
            key_block: None,
            tls_version: TLS_1_2_VERSION,
            session_id: Vec::new(),
            cipher: None,
            hs_messages: Transcript::new(),
        }
    }
}

/// One epoch's active security parameters, applied by ChangeCipherSpec
/// (spec.md §3 "current_decode, current_encode").
#[derive(Clone)]
pub struct Epoch {
    pub security_parameters: SecurityParameters,
    pub key_block: Option<KeyBlock>,
}

/// Callback slots (spec.md §3). Stored as trait objects since a connection
/// owns exactly one of each and they are invoked re-entrantly from within
/// `feed` (spec.md §5).
#[derive(Default)]
pub struct Callbacks {
    pub on_data: Option<Box<dyn FnMut(&[u8])>>,
    pub on_handshake_finish: Option<Box<dyn FnMut()>>,
    pub on_change_state: Option<Box<dyn FnMut(State, State)>>,
    pub on_error: Option<Box<dyn FnMut(u8)>>,
}

/// Everything a [`crate::driver::Driver`] needs to react to handshake
/// events, without holding the driver itself (spec.md §3 "Context", minus
/// the driver/callback registration, which lives one level up in
/// `Connection`).
pub struct Core {
    pub endpoint: Endpoint,
    pub backend: std::sync::Arc<dyn CryptoBackend>,
    pub state: State,
    pub tls_version: u16,
    pub session_id: Vec<u8>,
    pub proposed: Option<Proposed>,
    pub pending: Pending,
    pub current_decode: Option<Epoch>,
    pub current_encode: Option<Epoch>,
    pub seq_read: u64,
    pub seq_write: u64,
    pub out_queue: VecDeque<Vec<u8>>,
    pub shutdown: bool,
    pub error: Option<AlertDescription>,
    pub reassembler: HandshakeReassembler,
    pub callbacks: Callbacks,
}

impl Core {
    pub fn new(endpoint: Endpoint, backend: std::sync::Arc<dyn CryptoBackend>) -> Self {
        Core {
            endpoint,
            backend,
            state: State::Idle,
            tls_version: TLS_1_2_VERSION,
            session_id: Vec::new(),
            proposed: None,
            pending: Pending::new(endpoint.connection_end()),
            current_decode: None,
            current_encode: None,
            seq_read: 0,
            seq_write: 0,
            out_queue: VecDeque::new(),
            shutdown: false,
            error: None,
            reassembler: HandshakeReassembler::new(),
            callbacks: Callbacks::default(),
        }
    }

    /// Updates `state` and fires `on_change_state`/`on_handshake_finish` as
    /// appropriate, without invoking the driver. Used for the second half
    /// of a compound move a driver triggers entirely within one of its own
    /// callbacks (e.g. a server completing the abbreviated handshake).
    pub fn advance_state(&mut self, new_state: State) {
        let prev = self.state;
        if new_state == prev {
            return;
        }
        debug_assert!(
            new_state == State::Closed || new_state >= prev,
            "state must not decrease: {prev:?} -> {new_state:?}"
        );
        self.state = new_state;
        log::debug!("{:?}: state {:?} -> {:?}", self.endpoint, prev, new_state);
        if let Some(cb) = self.callbacks.on_change_state.as_mut() {
            cb(prev, new_state);
        }
        if new_state == State::Open {
            if let Some(cb) = self.callbacks.on_handshake_finish.as_mut() {
                cb();
            }
        }
    }

    /// Derives the connection's key block from `pending` if it hasn't been
    /// derived yet (spec.md §4.4 "Key block derivation (on first
    /// ChangeCipherSpec of the connection)"). A no-op on every epoch switch
    /// after the first, and for the null cipher (no key material needed).
    fn ensure_key_block_derived(&mut self) -> Result<()> {
        if self.pending.key_block.is_some() {
            return Ok(());
        }
        let suite = self
            .pending
            .cipher
            .ok_or_else(|| Error::Internal("no cipher suite chosen before ChangeCipherSpec".into()))?;
        if suite.enc_key_length == 0 && suite.mac_key_length == 0 {
            return Ok(());
        }
        let kb = prf::key_block(
            self.backend.as_ref(),
            &self.pending.security_parameters.master_secret,
            &self.pending.security_parameters.client_random,
            &self.pending.security_parameters.server_random,
            &suite,
        );
        self.pending.key_block = Some(kb);
        Ok(())
    }

    /// Applies ChangeCipherSpec to the write direction: the next outbound
    /// record uses `pending`'s parameters, and `seq_write` resets
    /// (spec.md §3 invariants, §4.2).
    pub fn apply_change_cipher_spec_encode(&mut self) -> Result<()> {
        self.ensure_key_block_derived()?;
        self.current_encode = Some(Epoch {
            security_parameters: self.pending.security_parameters.clone(),
            key_block: self.pending.key_block.clone(),
        });
        self.seq_write = 0;
        Ok(())
    }

    /// Applies ChangeCipherSpec to the read direction.
    pub fn apply_change_cipher_spec_decode(&mut self) -> Result<()> {
        self.ensure_key_block_derived()?;
        self.current_decode = Some(Epoch {
            security_parameters: self.pending.security_parameters.clone(),
            key_block: self.pending.key_block.clone(),
        });
        self.seq_read = 0;
        Ok(())
    }

    /// Protects and frames `fragment`, appending it to `out_queue`
    /// (spec.md §4.1 "Outbound pipeline").
    pub fn enqueue_record(&mut self, content_type: ContentType, version: u16, fragment: &[u8]) -> Result<()> {
        // Until ChangeCipherSpec switches the encode epoch, every outbound
        // record is sent in the clear — `pending.security_parameters` may
        // already name a chosen cipher suite, but that suite applies to the
        // *next* epoch, not the current one (spec.md §3 invariants).
        let (params, key_block) = match &self.current_encode {
            Some(epoch) => (epoch.security_parameters.clone(), epoch.key_block.as_ref()),
            None => (SecurityParameters::initial(self.endpoint.connection_end()), None),
        };

        let seq = self.seq_write;
        let protected = protection::encode(
            self.backend.as_ref(),
            &params,
            key_block,
            self.endpoint.connection_end(),
            seq,
            content_type,
            version,
            fragment,
        )?;
        self.seq_write += 1;

        let record = crate::record::frame(content_type, version, &protected)?;
        log::trace!(
            "{:?}: queued {:?} record, {} bytes plaintext, seq {}",
            self.endpoint,
            content_type,
            fragment.len(),
            seq
        );
        self.out_queue.push_back(record);
        Ok(())
    }

    /// Encodes a handshake message, appends it to `out_queue`, and appends
    /// its wire bytes to the transcript (spec.md §4.3).
    pub fn enqueue_handshake(&mut self, msg: HandshakeMessage) -> Result<()> {
        let wire = msg.to_wire();
        self.enqueue_record(ContentType::Handshake, self.tls_version, &wire)?;
        self.pending.hs_messages.push(&wire);
        Ok(())
    }

    /// Sends ChangeCipherSpec and applies it to the write direction
    /// (spec.md §4.1 step 3, §4.2).
    pub fn enqueue_change_cipher_spec(&mut self) -> Result<()> {
        self.enqueue_record(ContentType::ChangeCipherSpec, self.tls_version, &[1u8])?;
        self.apply_change_cipher_spec_encode()
    }

    pub fn enqueue_alert(&mut self, alert: Alert) -> Result<()> {
        let mut body = Vec::new();
        alert.encode(&mut body);
        self.enqueue_record(ContentType::Alert, self.tls_version, &body)
    }

    pub fn enqueue_application_data(&mut self, data: &[u8]) -> Result<()> {
        self.enqueue_record(ContentType::ApplicationData, self.tls_version, data)
    }

    /// Computes the Finished verify_data a sender should use right now —
    /// over the transcript exactly as it stands, i.e. excluding the
    /// Finished message about to be built (spec.md §4.4).
    pub fn compute_outbound_verify_data(&self, label: &'static [u8]) -> [u8; prf::VERIFY_DATA_LENGTH] {
        let hash = self.pending.hs_messages.hash(self.backend.as_ref());
        prf::verify_data(self.backend.as_ref(), &self.pending.security_parameters.master_secret, label, &hash)
    }

    /// Computes the Finished verify_data a receiver should have seen for
    /// `raw`, which has already been appended to the transcript — the hash
    /// input excludes exactly `raw`'s own bytes (spec.md §4.4, §8).
    pub fn compute_inbound_expected_verify_data(
        &self,
        label: &'static [u8],
        raw_len: usize,
    ) -> [u8; prf::VERIFY_DATA_LENGTH] {
        let full = self.pending.hs_messages.as_bytes();
        let truncated = &full[..full.len() - raw_len];
        let hash = self.backend.sha256(truncated);
        prf::verify_data(self.backend.as_ref(), &self.pending.security_parameters.master_secret, label, &hash)
    }

    /// Raises a fatal error: enqueues the matching alert (unless already
    /// shut down), marks the connection terminal, and fires `on_error`
    /// (spec.md §7).
    pub fn fail(&mut self, err: Error) {
        let description = err.alert();
        log::error!("{:?}: fatal error: {err} (alert {})", self.endpoint, description.to_u8());
        if !self.shutdown {
            let _ = self.enqueue_alert(Alert::fatal(description));
        }
        self.error = Some(description);
        self.shutdown = true;
        if let Some(cb) = self.callbacks.on_error.as_mut() {
            cb(description.to_u8());
        }
        self.advance_state(State::Closed);
    }
}
