//! The daemon's concrete [`alloc_core::ActiveJobs`] — an in-memory job
//! table, since the allocation core itself never persists anything; active
//! job storage is an out-of-scope collaborator.
//!
//! Iteration order matters: `hello_replay`/the ready and teardown sweeps
//! all walk `ActiveJobs::iter()`, and spec.md's hello-replay scenario
//! requires records come back in active-jobs order, mirroring the
//! original's `zhashx` (insertion-ordered). A plain `HashMap` doesn't
//! promise that, so insertion order is tracked alongside it in `order`.

use std::collections::HashMap;

use alloc_core::{ActiveJobs, Job, JobId, JobState};

#[derive(Default)]
pub struct DaemonActiveJobs {
    jobs: HashMap<JobId, Job>,
    order: Vec<JobId>,
}

impl DaemonActiveJobs {
    pub fn new() -> Self {
        DaemonActiveJobs::default()
    }
}

impl ActiveJobs for DaemonActiveJobs {
    fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Job> + '_> {
        Box::new(self.order.iter().filter_map(|id| self.jobs.get(id)))
    }

    fn drive_state_action(&mut self, id: JobId) {
        // The surrounding job lifecycle (DEPEND/PRIORITY/SCHED/RUN/CLEANUP)
        // is out of scope here; a real job manager would re-enter its own
        // state machine for `id` at this point.
        log::trace!("drive_state_action: job {id}");
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
