//! Wire message shapes for both sockets this daemon exposes: the
//! scheduler-facing socket and the administrative socket `jobmgr-admin`
//! talks to.

use serde::{Deserialize, Serialize};

use alloc_core::{AdminRequest, AdminResponse, AllocResponse, FreeResponse, HelloReply, JobId, ReadyMode, ReadyResponse};

/// Messages the scheduler sends to the daemon.
#[derive(Debug, Serialize, Deserialize)]
pub enum SchedMessage {
    /// Opens the connection: requests the `sched-hello` replay stream.
    Hello,
    /// Completes the handshake with a concurrency mode.
    Ready { mode: ReadyMode },
    Alloc(AllocResponse),
    Free(FreeResponse),
}

/// Messages the daemon sends to the scheduler.
#[derive(Debug, Serialize, Deserialize)]
pub enum SchedReply {
    Hello(HelloReply),
    Ready(ReadyResponse),
    /// A newly issued `sched.alloc`/`sched.free`/cancel request, pushed
    /// asynchronously rather than in response to anything the scheduler
    /// just sent.
    AllocRequest {
        id: JobId,
        priority: u32,
        userid: u32,
        t_submit: f64,
        jobspec_redacted: serde_json::Value,
    },
    FreeRequest {
        id: JobId,
    },
    Cancel {
        id: JobId,
    },
}

/// Messages `jobmgr-admin` sends to the daemon.
#[derive(Debug, Serialize, Deserialize)]
pub enum AdminMessage {
    Admin(AdminRequest),
    QueueList,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum AdminReply {
    Admin(AdminResponse),
    QueueList(Vec<JobId>),
}
