//! The daemon's concrete [`alloc_core::MessageTransport`]. The core's
//! `send_*` methods are synchronous (it has no executor of its own), so
//! outbound frames are queued on an unbounded channel and drained by the
//! connection task that owns the actual socket write half — the same
//! split the scheduler connection itself is built from (`reactor.rs`).

use alloc_core::{JobId, TransportError};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::transfer::SchedReply;

pub struct DaemonTransport {
    tx: UnboundedSender<SchedReply>,
}

impl DaemonTransport {
    pub fn new(tx: UnboundedSender<SchedReply>) -> Self {
        DaemonTransport { tx }
    }

    fn send(&self, reply: SchedReply) -> Result<(), TransportError> {
        self.tx
            .send(reply)
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

impl alloc_core::MessageTransport for DaemonTransport {
    fn send_alloc_request(
        &mut self,
        id: JobId,
        priority: u32,
        userid: u32,
        t_submit: f64,
        jobspec_redacted: &Value,
    ) -> Result<(), TransportError> {
        self.send(SchedReply::AllocRequest {
            id,
            priority,
            userid,
            t_submit,
            jobspec_redacted: jobspec_redacted.clone(),
        })
    }

    fn send_free_request(&mut self, id: JobId) -> Result<(), TransportError> {
        self.send(SchedReply::FreeRequest { id })
    }

    fn send_cancel(&mut self, id: JobId) {
        // Fire-and-forget by contract; a failed send here just means the
        // scheduler connection is already gone, which the reactor's own
        // read loop will notice independently.
        let _ = self.send(SchedReply::Cancel { id });
    }
}

/// Placeholder transport installed before any scheduler has ever
/// connected. `AllocCore::new` needs a transport to construct, but
/// `work_available()` can never be true until a `ready` handshake
/// succeeds, which only happens after [`DaemonTransport::new`] has
/// already been rebound in — so these methods should never actually run.
pub struct NullTransport;

impl alloc_core::MessageTransport for NullTransport {
    fn send_alloc_request(
        &mut self,
        id: JobId,
        _priority: u32,
        _userid: u32,
        _t_submit: f64,
        _jobspec_redacted: &Value,
    ) -> Result<(), TransportError> {
        Err(TransportError::SendFailed(format!(
            "no scheduler connected yet (job {id})"
        )))
    }

    fn send_free_request(&mut self, id: JobId) -> Result<(), TransportError> {
        Err(TransportError::SendFailed(format!(
            "no scheduler connected yet (job {id})"
        )))
    }

    fn send_cancel(&mut self, id: JobId) {
        log::warn!("dropped cancel for job {id}: no scheduler connected yet");
    }
}
