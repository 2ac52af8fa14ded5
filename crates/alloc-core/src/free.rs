//! Releasing resources back to the scheduler.

use crate::error::AllocCoreError;
use crate::protocol::{FreeResponse, JobEvent};
use crate::state::AllocCore;

impl AllocCore {
    /// Sends `sched.free` for a job that no longer needs its resources.
    /// A no-op while the scheduler isn't ready or a free request is
    /// already outstanding; the caller is expected to invoke this only
    /// for jobs that actually hold resources (entering `CLEANUP`).
    pub fn send_free_request(&mut self, id: crate::job::JobId) -> Result<(), AllocCoreError> {
        let job = self
            .active_jobs
            .get(id)
            .ok_or(AllocCoreError::UnknownJob(id))?;
        if !self.state.ready || job.free_pending {
            return Ok(());
        }

        let is_debug = job.is_debug();
        self.transport.send_free_request(id)?;

        let job = self.active_jobs.get_mut(id).unwrap();
        job.free_pending = true;
        self.state.free_pending_count += 1;

        if is_debug {
            self.event_log.post(id, JobEvent::DebugFreeRequest, false);
            log::trace!("debug.free-request: job {id}");
        }
        Ok(())
    }

    /// Handles a `sched.free` response: the scheduler has released the
    /// job's resources. Always terminal — there is no DENY for a free
    /// request.
    pub fn handle_free_response(&mut self, resp: FreeResponse) -> Result<(), AllocCoreError> {
        let id = resp.id;
        let job = self
            .active_jobs
            .get(id)
            .ok_or(AllocCoreError::UnknownJob(id))?;
        if !job.free_pending {
            return Err(AllocCoreError::NotPending(id));
        }

        self.state.free_pending_count -= 1;
        let job = self.active_jobs.get_mut(id).unwrap();
        job.free_pending = false;
        job.has_resources = false;

        self.event_log.post(id, JobEvent::Free, false);
        self.active_jobs.drive_state_action(id);
        self.drain.check();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::FreeResponse;
    use crate::test_support::*;

    #[test]
    fn send_free_request_is_a_noop_while_scheduler_not_ready() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.active_jobs_mut().get_mut(1).unwrap().has_resources = true;
        fx.core.send_free_request(1).unwrap();
        assert!(fx.sent_frees().is_empty());
    }

    #[test]
    fn send_free_request_marks_pending_and_sends() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.active_jobs_mut().get_mut(1).unwrap().has_resources = true;
        fx.core.make_ready_unlimited();
        fx.core.send_free_request(1).unwrap();
        assert_eq!(fx.sent_frees(), vec![1]);
        assert!(fx.core.active_jobs().get(1).unwrap().free_pending);
        assert_eq!(fx.core.free_pending_count(), 1);
    }

    #[test]
    fn free_response_clears_resources() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.active_jobs_mut().get_mut(1).unwrap().has_resources = true;
        fx.core.make_ready_unlimited();
        fx.core.send_free_request(1).unwrap();

        fx.core.handle_free_response(FreeResponse { id: 1 }).unwrap();

        let job = fx.core.active_jobs().get(1).unwrap();
        assert!(!job.has_resources);
        assert!(!job.free_pending);
        assert_eq!(fx.core.free_pending_count(), 0);
        assert_eq!(fx.events().last().unwrap().1, crate::protocol::JobEvent::Free);
    }

    #[test]
    fn free_response_without_pending_request_is_an_error() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        let err = fx.core.handle_free_response(FreeResponse { id: 1 }).unwrap_err();
        assert!(matches!(err, crate::error::AllocCoreError::NotPending(_)));
    }
}
