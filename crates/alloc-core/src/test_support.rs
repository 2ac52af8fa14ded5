//! In-memory collaborator doubles and a `Fixture` builder, shared by every
//! module's unit tests. Hand-rolled fakes rather than a mocking crate.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::collab::{ActiveJobs, DrainSupervisor, EventLog, MessageTransport, TransportError};
use crate::job::{Job, JobId, JobState};
use crate::protocol::JobEvent;
use crate::state::AllocCore;

/// Insertion-ordered, matching `DaemonActiveJobs` in `jobmgrd` — the hello
/// replay and the ready/teardown sweeps all iterate in active-jobs order,
/// and a plain `HashMap` wouldn't preserve that.
pub(crate) struct MapActiveJobs {
    jobs: HashMap<JobId, Job>,
    order: Vec<JobId>,
}

impl MapActiveJobs {
    pub(crate) fn new() -> Self {
        MapActiveJobs {
            jobs: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl ActiveJobs for MapActiveJobs {
    fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Job> + '_> {
        Box::new(self.order.iter().filter_map(|id| self.jobs.get(id)))
    }

    fn drive_state_action(&mut self, _id: JobId) {
        // No surrounding state machine in tests; nothing to re-drive.
    }

    fn running_count(&self) -> u32 {
        self.jobs
            .values()
            .filter(|j| j.state == JobState::Run)
            .count() as u32
    }

    fn insert(&mut self, job: Job) {
        if !self.jobs.contains_key(&job.id) {
            self.order.push(job.id);
        }
        self.jobs.insert(job.id, job);
    }

    fn remove(&mut self, id: JobId) -> Option<Job> {
        let removed = self.jobs.remove(&id);
        if removed.is_some() {
            self.order.retain(|&existing| existing != id);
        }
        removed
    }
}

#[derive(Default)]
pub(crate) struct EventLogBuf {
    pub(crate) events: Vec<(JobId, JobEvent)>,
}

pub(crate) struct RecordingEventLog {
    buf: Rc<RefCell<EventLogBuf>>,
}

impl EventLog for RecordingEventLog {
    fn post(&mut self, job_id: JobId, event: JobEvent, _no_commit: bool) {
        self.buf.borrow_mut().events.push((job_id, event));
    }
}

#[derive(Default)]
pub(crate) struct TransportLog {
    pub(crate) allocs: Vec<JobId>,
    pub(crate) frees: Vec<JobId>,
    pub(crate) cancels: Vec<JobId>,
}

pub(crate) struct RecordingTransport {
    log: Rc<RefCell<TransportLog>>,
}

impl MessageTransport for RecordingTransport {
    fn send_alloc_request(
        &mut self,
        id: JobId,
        _priority: u32,
        _userid: u32,
        _t_submit: f64,
        _jobspec_redacted: &Value,
    ) -> Result<(), TransportError> {
        self.log.borrow_mut().allocs.push(id);
        Ok(())
    }

    fn send_free_request(&mut self, id: JobId) -> Result<(), TransportError> {
        self.log.borrow_mut().frees.push(id);
        Ok(())
    }

    fn send_cancel(&mut self, id: JobId) {
        self.log.borrow_mut().cancels.push(id);
    }
}

pub(crate) struct NoopDrain;

impl DrainSupervisor for NoopDrain {
    fn check(&mut self) {}
}

#[allow(unused)]
pub(crate) fn enable_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds an [`AllocCore`] wired to in-memory doubles, with handles kept
/// alongside so tests can inspect what was posted/sent.
pub(crate) struct Fixture {
    pub(crate) core: AllocCore,
    events: Rc<RefCell<EventLogBuf>>,
    transport: Rc<RefCell<TransportLog>>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        enable_test_logging();
        let events = Rc::new(RefCell::new(EventLogBuf::default()));
        let transport = Rc::new(RefCell::new(TransportLog::default()));

        let core = AllocCore::new(
            Box::new(MapActiveJobs::new()),
            Box::new(RecordingEventLog {
                buf: events.clone(),
            }),
            Box::new(RecordingTransport {
                log: transport.clone(),
            }),
            Box::new(NoopDrain),
        );

        Fixture {
            core,
            events,
            transport,
        }
    }

    /// Inserts a freshly-submitted job with the given priority. Submit
    /// time is derived from the id so ties are deterministic in tests
    /// that want them.
    pub(crate) fn submit(&mut self, id: JobId, priority: u32) {
        let job = Job::new(id, priority, 1000, id as f64, serde_json::json!({}));
        self.core.active_jobs_mut().insert(job);
    }

    pub(crate) fn events(&self) -> Vec<(JobId, JobEvent)> {
        self.events.borrow().events.clone()
    }

    pub(crate) fn sent_allocs(&self) -> Vec<JobId> {
        self.transport.borrow().allocs.clone()
    }

    pub(crate) fn sent_frees(&self) -> Vec<JobId> {
        self.transport.borrow().frees.clone()
    }

    pub(crate) fn sent_cancels(&self) -> Vec<JobId> {
        self.transport.borrow().cancels.clone()
    }
}

impl AllocCore {
    /// Marks `id` as already having an in-flight allocation request,
    /// without going through [`AllocCore::check`] — lets response/admin/
    /// teardown tests set up the precondition they actually care about
    /// directly.
    pub(crate) fn make_pending(&mut self, id: JobId) {
        self.state_mut().alloc_pending_count += 1;
        self.active_jobs_mut().get_mut(id).unwrap().alloc_pending = true;
    }

    /// Puts the core into ready, unlimited-concurrency mode without
    /// requiring a `sched_sender` (dispatch tests don't exercise the
    /// handshake itself).
    pub(crate) fn make_ready_unlimited(&mut self) {
        self.state_mut().ready = true;
        self.state_mut().alloc_limit = 0;
    }
}
