//! Process-wide protocol state and the core struct that ties the queues,
//! state, and collaborators together.

use crate::collab::{ActiveJobs, DrainSupervisor, EventLog, MessageTransport};
use crate::protocol::RouteId;
use crate::queue::OrderedQueue;
use crate::util::WrappedRcRefCell;

/// A shared handle to an [`AllocCore`], via the `WrappedRcRefCell<T>`
/// wrapper in `util.rs`.
pub type CoreRef = WrappedRcRefCell<AllocCore>;

pub struct AllocState {
    pub ready: bool,
    pub disable: bool,
    pub disable_reason: Option<String>,
    /// 0 = unlimited, N = limited concurrency.
    pub alloc_limit: u32,
    pub alloc_pending_count: u32,
    pub free_pending_count: u32,
    pub sched_sender: Option<RouteId>,
}

impl Default for AllocState {
    fn default() -> Self {
        AllocState {
            ready: false,
            disable: false,
            disable_reason: None,
            alloc_limit: 0,
            alloc_pending_count: 0,
            free_pending_count: 0,
            sched_sender: None,
        }
    }
}

/// The allocation core: the waiting queue, the pending list, the protocol
/// state, and the collaborators it drives everything else through.
pub struct AllocCore {
    pub(crate) waiting: OrderedQueue,
    pub(crate) pending: OrderedQueue,
    pub(crate) state: AllocState,
    pub(crate) active_jobs: Box<dyn ActiveJobs>,
    pub(crate) event_log: Box<dyn EventLog>,
    pub(crate) transport: Box<dyn MessageTransport>,
    pub(crate) drain: Box<dyn DrainSupervisor>,
}

impl AllocCore {
    pub fn new(
        active_jobs: Box<dyn ActiveJobs>,
        event_log: Box<dyn EventLog>,
        transport: Box<dyn MessageTransport>,
        drain: Box<dyn DrainSupervisor>,
    ) -> Self {
        AllocCore {
            waiting: OrderedQueue::new(),
            pending: OrderedQueue::new(),
            state: AllocState::default(),
            active_jobs,
            event_log,
            transport,
            drain,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disable
    }

    pub fn alloc_limit(&self) -> u32 {
        self.state.alloc_limit
    }

    pub fn alloc_pending_count(&self) -> u32 {
        self.state.alloc_pending_count
    }

    pub fn free_pending_count(&self) -> u32 {
        self.state.free_pending_count
    }

    pub fn waiting_queue_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn active_jobs(&self) -> &dyn ActiveJobs {
        self.active_jobs.as_ref()
    }

    pub fn active_jobs_mut(&mut self) -> &mut dyn ActiveJobs {
        self.active_jobs.as_mut()
    }

    /// Direct access to the protocol-state table, for the admin surface
    /// and test fixtures. Never exposed across a process boundary.
    pub fn state_mut(&mut self) -> &mut AllocState {
        &mut self.state
    }

    pub fn state(&self) -> &AllocState {
        &self.state
    }

    /// Swaps in a new outbound transport. The core itself outlives any
    /// single scheduler connection; the host binary calls this each time a
    /// new connection completes `sched-hello` so alloc/free/cancel frames
    /// land on the live socket rather than a stale one.
    pub fn rebind_transport(&mut self, transport: Box<dyn MessageTransport>) {
        self.transport = transport;
    }
}
