//! The job reference type the allocation core operates on.
//!
//! Jobs are not owned here — the [`crate::collab::ActiveJobs`] collaborator
//! owns storage; the core only ever sees `&Job` / `&mut Job` through that
//! trait and mutates the marker fields it is responsible for.

use bitflags::bitflags;
use serde_json::Value;

use crate::queue::Handle;

pub type JobId = u64;
pub type UserId = u32;

/// Lower bound of the priority range. A job at this priority is held and
/// never dispatched.
pub const PRIORITY_MIN: u32 = 0;
/// Upper bound of the priority range.
pub const PRIORITY_MAX: u32 = u32::MAX;
/// Priority assigned to jobs that don't specify one.
pub const PRIORITY_DEFAULT: u32 = 16;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JobFlags: u32 {
        const DEBUG = 1 << 0;
    }
}

/// The subset of the surrounding job-manager's lifecycle the allocation
/// core needs to compile against. The core only ever branches on `Sched`
/// and `Cleanup`; the other variants exist so fixtures can build a
/// plausible job history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    New,
    Depend,
    Priority,
    Sched,
    Run,
    Cleanup,
    Inactive,
}

/// A job awaiting or holding resources.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub priority: u32,
    pub userid: UserId,
    pub t_submit: f64,
    /// Opaque, already-redacted jobspec; the core never interprets this.
    pub jobspec_redacted: Value,
    pub state: JobState,
    pub flags: JobFlags,
    pub annotations: Option<Value>,

    // Markers owned by the allocation core.
    pub alloc_queued: bool,
    pub alloc_pending: bool,
    pub free_pending: bool,
    pub alloc_bypass: bool,
    pub has_resources: bool,

    /// Present iff this job is a member of exactly one of the core's two
    /// queues. Invalidated (but not cleared) by a full re-sort; callers
    /// must rebind it via the cursor-rewrite dance in `queue.rs`.
    pub handle: Option<Handle>,
}

impl Job {
    pub fn new(id: JobId, priority: u32, userid: UserId, t_submit: f64, jobspec_redacted: Value) -> Self {
        Job {
            id,
            priority,
            userid,
            t_submit,
            jobspec_redacted,
            state: JobState::New,
            flags: JobFlags::empty(),
            annotations: None,
            alloc_queued: false,
            alloc_pending: false,
            free_pending: false,
            alloc_bypass: false,
            has_resources: false,
            handle: None,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.flags.contains(JobFlags::DEBUG)
    }
}
