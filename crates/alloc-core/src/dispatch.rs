//! The prep/check dispatch loop.
//!
//! The reactor itself (the thing that calls `prep`/`check` once per
//! iteration and starts/stops an idle watcher in between) lives in
//! `crates/jobmgrd` — the core only exposes the two hooks and is driven
//! externally rather than calling into a reactor of its own.

use crate::error::AllocCoreError;
use crate::job::PRIORITY_MIN;
use crate::protocol::JobEvent;
use crate::queue::OrderKey;
use crate::state::AllocCore;

impl AllocCore {
    /// `true` iff a dispatch should be attempted: not administratively
    /// disabled, scheduler ready, waiting queue non-empty, head's priority
    /// isn't `PRIORITY_MIN`, and (if limited) there's headroom.
    pub fn work_available(&self) -> bool {
        if self.state.disable {
            return false;
        }
        if !self.state.ready {
            return false;
        }
        let head = match self.waiting.first() {
            Some(h) => h,
            None => return false,
        };
        if self.state.alloc_limit > 0 && self.state.alloc_pending_count >= self.state.alloc_limit {
            return false;
        }
        let job = self
            .active_jobs
            .get(head)
            .expect("waiting queue head must be active");
        job.priority != PRIORITY_MIN
    }

    /// Runs before the reactor polls: the caller should start its idle
    /// watcher iff this returns `true`, so dispatch is retried every
    /// iteration without the reactor blocking in poll.
    pub fn prep(&self) -> bool {
        self.work_available()
    }

    /// Runs after the reactor polls: dispatches at most one job per call.
    /// Returns `Ok(true)` if a request was sent, `Ok(false)` if there was
    /// nothing to do. A transport failure here is fatal — the caller
    /// should stop the reactor with an error, since the protocol would
    /// otherwise desynchronize.
    pub fn check(&mut self) -> Result<bool, AllocCoreError> {
        if !self.work_available() {
            return Ok(false);
        }
        let job_id = self.waiting.first().expect("work_available implies a head");
        let (priority, userid, t_submit, jobspec) = {
            let job = self.active_jobs.get(job_id).unwrap();
            (
                job.priority,
                job.userid,
                job.t_submit,
                job.jobspec_redacted.clone(),
            )
        };

        self.transport
            .send_alloc_request(job_id, priority, userid, t_submit, &jobspec)?;

        let job = self.active_jobs.get_mut(job_id).unwrap();
        let handle = job.handle.take().expect("queued job must carry a handle");
        job.alloc_queued = false;
        self.waiting.remove(handle);
        job.alloc_pending = true;
        self.state.alloc_pending_count += 1;

        let is_debug = job.is_debug();
        if self.state.alloc_limit > 0 {
            let key = OrderKey::new(job.priority, job.t_submit);
            let fwd = key.fwd_hint();
            let new_handle = self.pending.insert(job_id, key, fwd);
            self.active_jobs.get_mut(job_id).unwrap().handle = Some(new_handle);
        }

        if is_debug {
            self.event_log
                .post(job_id, JobEvent::DebugAllocRequest, false);
            log::trace!("debug.alloc-request: job {job_id}");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn work_unavailable_when_disabled() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.make_ready_unlimited();
        fx.core.state_mut().disable = true;
        assert!(!fx.core.work_available());
    }

    #[test]
    fn work_unavailable_at_priority_min() {
        let mut fx = Fixture::new();
        fx.submit(1, 0);
        fx.core.make_ready_unlimited();
        assert!(!fx.core.work_available());
    }

    #[test]
    fn check_dispatches_one_job_per_call() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.submit(2, 16);
        fx.core.make_ready_unlimited();
        assert!(fx.core.check().unwrap());
        assert_eq!(fx.sent_allocs(), vec![1]);
        assert!(fx.core.check().unwrap());
        assert_eq!(fx.sent_allocs(), vec![1, 2]);
        assert!(!fx.core.check().unwrap());
    }
}
