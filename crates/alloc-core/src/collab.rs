//! Trait boundaries for the core's out-of-scope collaborators: the event
//! log, the active-jobs index, outbound messaging, and the drain
//! supervisor. The core is generic over these (boxed, since it is
//! single-threaded and never needs to be generic over more than one
//! concrete implementation at a time — mirrors the `Box<dyn QueueHandler>`
//! pattern used for shared handler state elsewhere in this codebase).

use serde_json::Value;

use crate::job::{Job, JobId};
use crate::protocol::JobEvent;

/// Append-only per-job event journal.
pub trait EventLog {
    /// Appends `event` for `job_id`. `no_commit` marks an event that
    /// should be visible in memory but not journaled (the annotations
    /// clear events posted on DENY/CANCEL/disconnect).
    fn post(&mut self, job_id: JobId, event: JobEvent, no_commit: bool);
}

/// Keyed lookup of all in-flight jobs, owned outside the core.
pub trait ActiveJobs {
    fn get(&self, id: JobId) -> Option<&Job>;
    fn get_mut(&mut self, id: JobId) -> Option<&mut Job>;
    /// Iterates jobs in the collaborator's own order (used by the
    /// hello/ready sweeps, which replay in active-jobs order).
    fn iter(&self) -> Box<dyn Iterator<Item = &Job> + '_>;
    /// Re-drives the job-state action for `id` (e.g. after a CANCEL
    /// response requeues a `SCHED` job, or a `ready` sweep finds a
    /// `CLEANUP` job still holding resources). Out of scope for the core
    /// to implement; it just asks the collaborator to do it.
    fn drive_state_action(&mut self, id: JobId);
    /// Count of jobs currently in `JobState::Run`, surfaced by the admin
    /// status response.
    fn running_count(&self) -> u32;
    /// Registers a newly submitted job. The allocation core itself never
    /// calls this (jobs become active before the core sees them), but the
    /// collaborator needs it to exist at all, and so do test fixtures.
    fn insert(&mut self, job: Job);
    /// Drops a job that has gone `Inactive`.
    fn remove(&mut self, id: JobId) -> Option<Job>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport send failed: {0}")]
    SendFailed(String),
}

/// Outbound messaging to the scheduler.
pub trait MessageTransport {
    fn send_alloc_request(
        &mut self,
        id: JobId,
        priority: u32,
        userid: u32,
        t_submit: f64,
        jobspec_redacted: &Value,
    ) -> Result<(), TransportError>;

    fn send_free_request(&mut self, id: JobId) -> Result<(), TransportError>;

    /// Fire-and-forget; completion is only ever observed through a later
    /// CANCEL allocation response.
    fn send_cancel(&mut self, id: JobId);
}

/// Notified whenever the pending allocation count may have reached zero.
pub trait DrainSupervisor {
    fn check(&mut self);
}
