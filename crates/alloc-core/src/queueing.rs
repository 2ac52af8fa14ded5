//! The waiting-queue/pending-list operations, and the reprioritization
//! helpers used to re-sort both queues after a bulk priority change.

use crate::collab::ActiveJobs;
use crate::error::AllocCoreError;
use crate::job::{JobId, PRIORITY_MIN};
use crate::queue::OrderKey;
use crate::state::AllocCore;

pub(crate) fn order_key(active_jobs: &dyn ActiveJobs, id: JobId) -> OrderKey {
    let job = active_jobs
        .get(id)
        .expect("order_key called for a job missing from active_jobs");
    OrderKey::new(job.priority, job.t_submit)
}

impl AllocCore {
    /// Inserts `job_id` into the waiting queue. Returns `Ok(true)` if
    /// inserted, `Ok(false)` if this was a no-op (duplicate request,
    /// already queued/pending, or priority floored at `PRIORITY_MIN`).
    pub fn enqueue(&mut self, job_id: JobId) -> Result<bool, AllocCoreError> {
        let job = self
            .active_jobs
            .get(job_id)
            .ok_or(AllocCoreError::UnknownJob(job_id))?;
        if job.alloc_bypass || job.alloc_queued || job.alloc_pending || job.priority == PRIORITY_MIN
        {
            return Ok(false);
        }
        let key = OrderKey::new(job.priority, job.t_submit);
        let fwd = key.fwd_hint();
        let handle = self.waiting.insert(job_id, key, fwd);
        let job = self.active_jobs.get_mut(job_id).unwrap();
        job.alloc_queued = true;
        job.handle = Some(handle);
        // A newly queued job may outrank the pending list's weakest
        // member, so every enqueue rechecks for preemption rather than
        // waiting for an explicit reprioritize.
        self.recalc_pending();
        Ok(true)
    }

    /// Removes `job_id` from the waiting queue. Idempotent if not queued.
    pub fn dequeue(&mut self, job_id: JobId) -> Result<(), AllocCoreError> {
        let job = self
            .active_jobs
            .get_mut(job_id)
            .ok_or(AllocCoreError::UnknownJob(job_id))?;
        if !job.alloc_queued {
            return Ok(());
        }
        let handle = job
            .handle
            .take()
            .expect("alloc_queued job must carry a handle");
        job.alloc_queued = false;
        self.waiting.remove(handle);
        Ok(())
    }

    /// Re-positions `job_id` in whichever queue it currently inhabits,
    /// using its current priority.
    pub fn reorder(&mut self, job_id: JobId) -> Result<(), AllocCoreError> {
        let job = self
            .active_jobs
            .get(job_id)
            .ok_or(AllocCoreError::UnknownJob(job_id))?;
        let key = OrderKey::new(job.priority, job.t_submit);
        let fwd = key.fwd_hint();
        if job.alloc_queued {
            let handle = job.handle.expect("alloc_queued job must carry a handle");
            self.waiting.reorder(handle, key, fwd);
        } else if job.alloc_pending && self.state.alloc_limit > 0 {
            let handle = job.handle.expect("alloc_pending job must carry a handle");
            self.pending.reorder(handle, key, fwd);
        }
        // A single job's priority change can change which job outranks
        // the pending list's weakest member, same as a full re-sort.
        self.recalc_pending();
        Ok(())
    }

    /// Full re-sort of both queues, rebinding every job's handle from its
    /// new cursor position, then rechecking for preemption.
    pub fn reprioritize_all(&mut self) {
        {
            let active_jobs = self.active_jobs.as_ref();
            let rebinds = self.waiting.resort_rebinding(|id| order_key(active_jobs, id));
            for (id, handle) in rebinds {
                self.active_jobs.get_mut(id).unwrap().handle = Some(handle);
            }
        }
        {
            let active_jobs = self.active_jobs.as_ref();
            let rebinds = self.pending.resort_rebinding(|id| order_key(active_jobs, id));
            for (id, handle) in rebinds {
                self.active_jobs.get_mut(id).unwrap().handle = Some(handle);
            }
        }
        self.recalc_pending();
    }

    /// While a concurrency limit is active, cancels pending-list members
    /// from the tail inward as long as the waiting queue's head outranks
    /// them. The sole preemption path.
    pub fn recalc_pending(&mut self) {
        if self.state.alloc_limit == 0 {
            return;
        }
        let heads: Vec<JobId> = self.waiting.iter().collect();
        let tails: Vec<JobId> = self.pending.iter_rev().collect();
        let active_jobs = self.active_jobs.as_ref();

        let mut to_cancel = Vec::new();
        for (h, t) in heads.iter().zip(tails.iter()) {
            let hk = order_key(active_jobs, *h);
            let tk = order_key(active_jobs, *t);
            if hk.precedes(&tk) {
                to_cancel.push(*t);
            } else {
                break;
            }
        }
        for job_id in to_cancel {
            self.cancel_request(job_id);
        }
    }

    /// Cursor-style iteration over the waiting queue for administrative
    /// listing.
    pub fn queue_iter(&self) -> impl Iterator<Item = JobId> + '_ {
        self.waiting.iter()
    }

    pub(crate) fn cancel_request(&mut self, job_id: JobId) {
        self.transport.send_cancel(job_id);
    }
}
