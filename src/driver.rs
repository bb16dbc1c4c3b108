//! Endpoint-specific handshake logic, realized as a trait with one
//! implementation per endpoint rather than the source's per-state callback
//! registration table (spec.md §9 design note: "a tagged state enum with a
//! match-dispatched driver function per endpoint, or a trait/interface with
//! variants (ClientDriver, ServerDriver) invoked on each state entry").
//!
//! A driver never touches [`crate::connection::Connection`] directly — only
//! [`Core`], which holds everything a driver needs (pending parameters,
//! the transcript, the outbound queue) without re-entering the connection
//! that owns the driver itself.

use crate::context::{Core, State};
use crate::error::Result;
use crate::handshake::{HandshakeMessage, RawHandshakeMessage};

/// Endpoint-specific reaction to one handshake event. Each method may
/// request a state transition by returning `Ok(Some(state))`; the caller
/// (`Connection`) performs the transition and then invokes
/// [`Driver::on_state_enter`] for the new state exactly once.
pub trait Driver {
    /// Called once, synchronously, by `Connection::transition` whenever the
    /// state changes — including compound moves the driver itself
    /// triggers via [`Core::advance_state`] — giving each state a single
    /// entry point, matching the "entered at most once" contract.
    fn on_state_enter(&mut self, core: &mut Core, state: State) -> Result<()>;

    /// Called after a handshake message has been decoded and appended to
    /// the transcript. May request a transition.
    fn on_handshake_message(
        &mut self,
        core: &mut Core,
        msg: &HandshakeMessage,
        raw: &RawHandshakeMessage,
    ) -> Result<Option<State>>;

    /// Called after an inbound ChangeCipherSpec has been applied (the
    /// decode epoch has switched). May request a transition.
    fn on_change_cipher_spec(&mut self, core: &mut Core) -> Result<Option<State>>;
}
