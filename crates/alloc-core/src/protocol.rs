//! Wire payload shapes. These are the in-memory representations the core
//! reads and writes; `crates/jobmgrd` is responsible for actually framing
//! and encoding them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::job::JobId;

/// Routing identity of a message sender, used to attribute `sched_sender`
/// and to match disconnects against it.
pub type RouteId = String;

/// A single record replayed to a freshly (re)started scheduler during
/// `sched-hello`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelloRecord {
    pub id: JobId,
    pub priority: u32,
    pub userid: u32,
    pub t_submit: f64,
}

/// One item of the `sched-hello` streaming reply: either a record, or the
/// stream's `ENODATA` end marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HelloReply {
    Record(HelloRecord),
    End,
}

/// `sched-ready` request mode. Externally tagged (the default `serde`
/// enum representation) rather than internally tagged: `jobmgrd` carries
/// this over `bincode`, which can't deserialize the internally-tagged
/// form (no `deserialize_any` support).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyMode {
    Limited { limit: i64 },
    Unlimited,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub count: usize,
}

/// Outcome tag of a `sched.alloc` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum AllocOutcome {
    Success = 0,
    Annotate = 1,
    Deny = 2,
    Cancel = 3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocResponse {
    pub id: JobId,
    #[serde(rename = "type")]
    pub outcome: AllocOutcome,
    pub note: Option<String>,
    pub annotations: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FreeResponse {
    pub id: JobId,
}

/// `alloc-admin` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRequest {
    pub query_only: bool,
    pub enable: bool,
    pub reason: Option<String>,
    /// `true` iff the caller holds owner credentials; checked for
    /// non-`query_only` requests.
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminResponse {
    pub enable: bool,
    pub reason: String,
    pub queue_length: usize,
    pub alloc_pending: u32,
    pub free_pending: u32,
    pub running: u32,
}

/// Userid used for exceptions attributed to the scheduler rather than a
/// real submitter.
pub const USERID_UNKNOWN: &str = "UNKNOWN";

/// Events the core posts through the event log.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Alloc { annotations: Option<Value> },
    Free,
    /// `None` represents the null-payload "clear" event.
    Annotations { annotations: Option<Value> },
    Exception {
        exc_type: String,
        severity: u8,
        userid: String,
        note: String,
    },
    DebugAllocRequest,
    DebugFreeRequest,
}
