//! Library-facing error type.
//!
//! spec.md §7's "unknown type" protocol-violation row has no variant here:
//! `AllocOutcome` is a closed, exhaustively-matched enum, so a wire tag
//! that doesn't name one of its variants fails to decode before it ever
//! reaches `handle_alloc_response` — it surfaces as a malformed-payload
//! error at the transport codec in `jobmgrd`, not as an `AllocCoreError`.

use thiserror::Error;

use crate::job::JobId;

#[derive(Debug, Error)]
pub enum AllocCoreError {
    #[error("job {0} is not active")]
    UnknownJob(JobId),

    #[error("job {0} has no pending allocation request")]
    NotPending(JobId),

    #[error("job {0} already has resources allocated")]
    AlreadyAllocated(JobId),

    #[error("ANNOTATE response for job {0} carried no annotations")]
    MissingAnnotations(JobId),

    #[error("ready request mode {0:?} is invalid (limited mode requires limit >= 1)")]
    BadReadyMode(crate::protocol::ReadyMode),

    #[error("sched-ready arrived with no route sender")]
    MissingSender,

    #[error("Request requires owner credentials")]
    PermissionDenied,

    #[error("sending alloc request failed: {0}")]
    SendFailed(#[from] crate::collab::TransportError),
}

/// Errors that require the interface to be torn down: malformed payload,
/// unknown job id, protocol violation, already allocated. Permission and
/// bad-mode errors are request-local and never reach this classification.
impl AllocCoreError {
    pub fn requires_teardown(&self) -> bool {
        matches!(
            self,
            AllocCoreError::UnknownJob(_)
                | AllocCoreError::NotPending(_)
                | AllocCoreError::AlreadyAllocated(_)
                | AllocCoreError::MissingAnnotations(_)
        )
    }
}
