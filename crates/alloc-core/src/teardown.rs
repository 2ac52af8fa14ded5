//! Scheduler disconnect recovery.

use crate::job::JobId;
use crate::protocol::{JobEvent, RouteId};
use crate::queue::OrderKey;
use crate::state::AllocCore;

impl AllocCore {
    /// Moves a job that was in flight with the scheduler back into the
    /// waiting queue, as if it had never been dispatched. Used both by a
    /// CANCEL allocation response for a job the rest of the job manager
    /// still wants scheduled (`JobState::Sched`), and by
    /// [`AllocCore::interface_teardown`] for every outstanding request when
    /// the scheduler disconnects. Clears any scheduler annotations the job
    /// picked up while its request was in flight, since they came from a
    /// scheduler that no longer owns the request.
    pub(crate) fn requeue_pending(&mut self, job_id: JobId) {
        if let Some(handle) = self.active_jobs.get_mut(job_id).unwrap().handle.take() {
            self.pending.remove(handle);
        }

        let job = self.active_jobs.get_mut(job_id).unwrap();
        job.alloc_pending = false;
        job.alloc_queued = true;
        let cleared = job.annotations.take().is_some();
        let key = OrderKey::new(job.priority, job.t_submit);
        let fwd = key.fwd_hint();
        let handle = self.waiting.insert(job_id, key, fwd);
        self.active_jobs.get_mut(job_id).unwrap().handle = Some(handle);

        if cleared {
            self.event_log
                .post(job_id, JobEvent::Annotations { annotations: None }, true);
        }
    }

    /// Called when the route identified by `route` disconnects. Returns
    /// `true` iff it matched the currently recorded scheduler and a
    /// teardown was performed; a disconnect from any other route is a
    /// no-op, since a disconnect is only meaningful for the route that
    /// last completed `sched-ready`.
    pub fn disconnect(&mut self, route: &RouteId) -> bool {
        if self.state.sched_sender.as_deref() != Some(route.as_str()) {
            return false;
        }
        self.interface_teardown();
        true
    }

    /// Unwinds every assumption the core made about there being a live,
    /// responsive scheduler: every job with an outstanding allocation
    /// request is requeued, every job with an outstanding free request is
    /// marked for re-request, and the ready/limit/sender state is reset so
    /// the next `sched-hello`/`sched-ready` starts clean.
    pub fn interface_teardown(&mut self) {
        if !self.state.ready {
            return;
        }

        let alloc_pending_ids: Vec<JobId> = self
            .active_jobs
            .iter()
            .filter(|job| job.alloc_pending)
            .map(|job| job.id)
            .collect();
        for id in alloc_pending_ids {
            self.requeue_pending(id);
        }

        let free_pending_ids: Vec<JobId> = self
            .active_jobs
            .iter()
            .filter(|job| job.free_pending)
            .map(|job| job.id)
            .collect();
        for id in free_pending_ids {
            self.active_jobs.get_mut(id).unwrap().free_pending = false;
        }

        self.state.ready = false;
        self.state.alloc_pending_count = 0;
        self.state.free_pending_count = 0;
        self.state.sched_sender = None;
        // `disable` is an administrative setting and survives teardown:
        // disable/enable is independent of scheduler connectivity.
        // `alloc_limit` survives too: spec.md §4.7 and the original
        // `interface_teardown` don't reset it, and the next `sched-ready`
        // overwrites it anyway.
        self.drain.check();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;

    #[test]
    fn disconnect_on_wrong_route_is_a_noop() {
        let mut fx = Fixture::new();
        fx.core.state_mut().sched_sender = Some("sched-0".to_string());
        fx.core.state_mut().ready = true;
        assert!(!fx.core.disconnect(&"sched-1".to_string()));
        assert!(fx.core.is_ready());
    }

    #[test]
    fn teardown_requeues_alloc_pending_jobs() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.make_pending(1);
        fx.core.state_mut().sched_sender = Some("sched-0".to_string());
        fx.core.state_mut().ready = true;

        assert!(fx.core.disconnect(&"sched-0".to_string()));

        assert!(!fx.core.is_ready());
        assert_eq!(fx.core.alloc_pending_count(), 0);
        let job = fx.core.active_jobs().get(1).unwrap();
        assert!(job.alloc_queued);
        assert!(!job.alloc_pending);
        assert_eq!(fx.core.waiting_queue_len(), 1);
    }

    #[test]
    fn teardown_clears_free_pending_markers() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.active_jobs_mut().get_mut(1).unwrap().free_pending = true;
        fx.core.state_mut().free_pending_count = 1;
        fx.core.state_mut().sched_sender = Some("sched-0".to_string());
        fx.core.state_mut().ready = true;

        assert!(fx.core.disconnect(&"sched-0".to_string()));

        assert!(!fx.core.active_jobs().get(1).unwrap().free_pending);
        assert_eq!(fx.core.free_pending_count(), 0);
    }
}
