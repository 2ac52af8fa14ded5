//! The allocation core of the job manager: the scheduler-facing half of
//! resource handling, structured as a collaborator-driven Rust library.
//!
//! This crate has no event loop of its own. A host binary (`jobmgrd`)
//! drives it by calling [`AllocCore::prep`]/[`AllocCore::check`] once per
//! reactor iteration and feeding wire messages into the `handle_*`
//! methods; everything else — storage, transport, logging — is injected
//! through the traits in [`collab`].

pub mod admin;
pub mod collab;
pub mod dispatch;
pub mod error;
pub mod free;
pub mod hello_ready;
pub mod job;
pub mod protocol;
pub mod queue;
pub mod queueing;
pub mod response;
pub mod state;
pub mod teardown;
pub mod util;

#[cfg(test)]
mod test_support;

pub use collab::{ActiveJobs, DrainSupervisor, EventLog, MessageTransport, TransportError};
pub use error::AllocCoreError;
pub use job::{Job, JobFlags, JobId, JobState, PRIORITY_DEFAULT, PRIORITY_MAX, PRIORITY_MIN};
pub use protocol::{
    AdminRequest, AdminResponse, AllocOutcome, AllocResponse, FreeResponse, HelloReply,
    HelloRecord, JobEvent, ReadyMode, ReadyResponse, RouteId, USERID_UNKNOWN,
};
pub use queue::{Handle, OrderKey, OrderedQueue};
pub use state::{AllocState, CoreRef};

pub use state::AllocCore;
