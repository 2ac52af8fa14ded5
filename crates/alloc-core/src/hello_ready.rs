//! The `sched-hello` streaming replay and the `sched-ready` handshake.

use crate::error::AllocCoreError;
use crate::protocol::{HelloReply, ReadyMode, ReadyResponse, RouteId};
use crate::state::AllocCore;

impl AllocCore {
    /// Builds the `sched-hello` replay stream for every job that currently
    /// has resources allocated, in whatever order the active-jobs
    /// collaborator iterates. The caller streams each
    /// [`HelloReply::Record`] and finishes with [`HelloReply::End`].
    pub fn hello_replay(&self) -> Vec<HelloReply> {
        let mut out: Vec<HelloReply> = self
            .active_jobs
            .iter()
            .filter(|job| job.has_resources)
            .map(|job| {
                HelloReply::Record(crate::protocol::HelloRecord {
                    id: job.id,
                    priority: job.priority,
                    userid: job.userid,
                    t_submit: job.t_submit,
                })
            })
            .collect();
        out.push(HelloReply::End);
        out
    }

    /// Handles `sched-ready`. `sender` identifies the route the scheduler's
    /// follow-up messages will arrive on; it is recorded as `sched_sender`
    /// so a later disconnect on a different route is ignored.
    ///
    /// A missing `sender` is an error: the handshake cannot be completed
    /// without a route to reply on, so the request is answered with a
    /// transport error and `sched_sender`/`ready`/`alloc_limit` are left
    /// untouched (see DESIGN.md's resolution of this point).
    pub fn handle_ready(
        &mut self,
        mode: ReadyMode,
        sender: Option<RouteId>,
    ) -> Result<ReadyResponse, AllocCoreError> {
        let sender = sender.ok_or(AllocCoreError::MissingSender)?;

        let limit = match mode {
            ReadyMode::Unlimited => 0,
            ReadyMode::Limited { limit } if limit >= 1 => limit as u32,
            ReadyMode::Limited { .. } => return Err(AllocCoreError::BadReadyMode(mode)),
        };

        self.state.sched_sender = Some(sender);
        self.state.alloc_limit = limit;
        self.state.ready = true;

        let response = ReadyResponse {
            count: self.waiting.len(),
        };

        // Re-drive any job stuck in CLEANUP still holding resources: its
        // free request may have been interrupted by the previous scheduler
        // going away.
        let stuck_cleanup: Vec<_> = self
            .active_jobs
            .iter()
            .filter(|job| job.state == crate::job::JobState::Cleanup && job.has_resources)
            .map(|job| job.id)
            .collect();
        for id in stuck_cleanup {
            self.active_jobs.drive_state_action(id);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use crate::job::JobState;
    use crate::protocol::ReadyMode;
    use crate::test_support::*;

    #[test]
    fn ready_without_sender_is_an_error() {
        let mut fx = Fixture::new();
        let err = fx.core.handle_ready(ReadyMode::Unlimited, None).unwrap_err();
        assert!(matches!(err, crate::error::AllocCoreError::MissingSender));
        assert!(!fx.core.is_ready());
        assert_eq!(fx.core.alloc_limit(), 0);
    }

    #[test]
    fn ready_unlimited_records_sender_and_count() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.enqueue(1).unwrap();
        let resp = fx
            .core
            .handle_ready(ReadyMode::Unlimited, Some("sched-0".to_string()))
            .unwrap();
        assert_eq!(resp.count, 1);
        assert!(fx.core.is_ready());
        assert_eq!(fx.core.alloc_limit(), 0);
    }

    #[test]
    fn ready_limited_rejects_zero_limit() {
        let mut fx = Fixture::new();
        let err = fx
            .core
            .handle_ready(ReadyMode::Limited { limit: 0 }, Some("sched-0".to_string()))
            .unwrap_err();
        assert!(matches!(err, crate::error::AllocCoreError::BadReadyMode(_)));
    }

    #[test]
    fn hello_replay_only_includes_resourced_jobs() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.submit(2, 16);
        fx.core.active_jobs_mut().get_mut(1).unwrap().has_resources = true;
        fx.core.active_jobs_mut().get_mut(2).unwrap().alloc_pending = true;
        let replay = fx.core.hello_replay();
        assert_eq!(replay.len(), 2); // one record + End
        assert!(matches!(replay[0], crate::protocol::HelloReply::Record(ref r) if r.id == 1));
        assert!(matches!(replay[1], crate::protocol::HelloReply::End));
    }

    /// spec.md §8 scenario 6: active-jobs contains ids {7,8,9} with
    /// `has_resources` set on {7,9}; hello replays 7 then 9, in
    /// active-jobs (insertion) order, terminated by `End`.
    #[test]
    fn hello_replay_preserves_active_jobs_order() {
        let mut fx = Fixture::new();
        fx.submit(7, 16);
        fx.submit(8, 16);
        fx.submit(9, 16);
        fx.core.active_jobs_mut().get_mut(7).unwrap().has_resources = true;
        fx.core.active_jobs_mut().get_mut(9).unwrap().has_resources = true;

        let replay = fx.core.hello_replay();
        assert_eq!(replay.len(), 3); // two records + End
        assert!(matches!(replay[0], crate::protocol::HelloReply::Record(ref r) if r.id == 7));
        assert!(matches!(replay[1], crate::protocol::HelloReply::Record(ref r) if r.id == 9));
        assert!(matches!(replay[2], crate::protocol::HelloReply::End));
    }

    #[test]
    fn ready_does_not_panic_on_stuck_cleanup_sweep() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        {
            let job = fx.core.active_jobs_mut().get_mut(1).unwrap();
            job.state = JobState::Cleanup;
            job.has_resources = true;
        }
        let resp = fx
            .core
            .handle_ready(ReadyMode::Unlimited, Some("sched-0".to_string()))
            .unwrap();
        assert_eq!(resp.count, 0);
    }
}
