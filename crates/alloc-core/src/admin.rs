//! The `alloc-admin` query/enable/disable surface, plus the queue-listing
//! helper backing the `jobmgr-admin queue list` subcommand.

use crate::error::AllocCoreError;
use crate::job::JobId;
use crate::protocol::{AdminRequest, AdminResponse};
use crate::state::AllocCore;

impl AllocCore {
    /// Handles one `alloc-admin` request. `query_only` requests never
    /// require ownership and never mutate state; anything else requires
    /// `is_owner`.
    pub fn handle_admin_request(
        &mut self,
        req: AdminRequest,
    ) -> Result<AdminResponse, AllocCoreError> {
        if !req.query_only {
            if !req.is_owner {
                return Err(AllocCoreError::PermissionDenied);
            }
            if !req.enable {
                self.state.disable_reason = req.reason.filter(|r| !r.is_empty());
                self.cancel_all_pending();
            }
            self.state.disable = !req.enable;
        }

        let (enable, reason) = if self.state.disable {
            (false, self.state.disable_reason.clone().unwrap_or_default())
        } else if !self.state.ready {
            (false, "Scheduler is offline".to_string())
        } else {
            (true, String::new())
        };

        Ok(AdminResponse {
            enable,
            reason,
            queue_length: self.waiting.len(),
            alloc_pending: self.state.alloc_pending_count,
            free_pending: self.state.free_pending_count,
            running: self.active_jobs.running_count(),
        })
    }

    /// Sends a CANCEL for every job with an outstanding allocation
    /// request, used when administratively disabling so in-flight
    /// requests don't quietly succeed into a disabled interface.
    pub(crate) fn cancel_all_pending(&mut self) {
        let ids: Vec<JobId> = self
            .active_jobs
            .iter()
            .filter(|job| job.alloc_pending)
            .map(|job| job.id)
            .collect();
        for id in ids {
            self.cancel_request(id);
        }
    }

    /// Lists the waiting queue's job ids in dispatch order, for
    /// `jobmgr-admin queue list`. A thin, read-only wrapper over
    /// [`AllocCore::queue_iter`] so the admin surface doesn't need to reach
    /// into queueing internals directly.
    pub fn list_waiting(&self) -> Vec<JobId> {
        self.queue_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::protocol::AdminRequest;
    use crate::test_support::*;

    fn query() -> AdminRequest {
        AdminRequest {
            query_only: true,
            enable: true,
            reason: None,
            is_owner: false,
        }
    }

    #[test]
    fn query_never_requires_ownership() {
        let mut fx = Fixture::new();
        fx.core.state_mut().ready = true;
        let resp = fx.core.handle_admin_request(query()).unwrap();
        assert!(resp.enable);
    }

    #[test]
    fn query_reports_scheduler_offline_when_not_ready() {
        let mut fx = Fixture::new();
        let resp = fx.core.handle_admin_request(query()).unwrap();
        assert!(!resp.enable);
        assert_eq!(resp.reason, "Scheduler is offline");
    }

    #[test]
    fn disable_without_ownership_is_denied() {
        let mut fx = Fixture::new();
        let req = AdminRequest {
            query_only: false,
            enable: false,
            reason: None,
            is_owner: false,
        };
        let err = fx.core.handle_admin_request(req).unwrap_err();
        assert!(matches!(err, crate::error::AllocCoreError::PermissionDenied));
    }

    #[test]
    fn disable_cancels_pending_and_records_reason() {
        let mut fx = Fixture::new();
        fx.submit(1, 16);
        fx.core.make_pending(1);

        let req = AdminRequest {
            query_only: false,
            enable: false,
            reason: Some("maintenance".to_string()),
            is_owner: true,
        };
        let resp = fx.core.handle_admin_request(req).unwrap();
        assert!(!resp.enable);
        assert_eq!(resp.reason, "maintenance");
        assert_eq!(fx.sent_cancels(), vec![1]);
        assert!(fx.core.is_disabled());
    }

    #[test]
    fn re_enable_clears_reason() {
        let mut fx = Fixture::new();
        fx.core.state_mut().disable = true;
        fx.core.state_mut().disable_reason = Some("maintenance".to_string());
        fx.core.state_mut().ready = true;

        let req = AdminRequest {
            query_only: false,
            enable: true,
            reason: None,
            is_owner: true,
        };
        let resp = fx.core.handle_admin_request(req).unwrap();
        assert!(resp.enable);
        assert_eq!(resp.reason, "");
    }

    #[test]
    fn list_waiting_reports_dispatch_order() {
        let mut fx = Fixture::new();
        fx.submit(1, 10);
        fx.submit(2, 20);
        fx.core.enqueue(1).unwrap();
        fx.core.enqueue(2).unwrap();
        assert_eq!(fx.core.list_waiting(), vec![2, 1]);
    }
}
