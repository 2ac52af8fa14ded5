//! Handling the scheduler's `sched.alloc` response.

use crate::error::AllocCoreError;
use crate::job::JobId;
use crate::protocol::{AllocOutcome, AllocResponse, JobEvent, USERID_UNKNOWN};
use crate::state::AllocCore;

impl AllocCore {
    /// Handles one `sched.alloc` response. Any `Err` here means the
    /// interface must be torn down (`AllocCoreError::requires_teardown`);
    /// the caller is expected to call [`AllocCore::interface_teardown`]
    /// when that's the case.
    pub fn handle_alloc_response(&mut self, resp: AllocResponse) -> Result<(), AllocCoreError> {
        let AllocResponse {
            id,
            outcome,
            note,
            annotations,
        } = resp;

        if self.active_jobs.get(id).is_none() {
            return Err(AllocCoreError::UnknownJob(id));
        }
        if !self.active_jobs.get(id).unwrap().alloc_pending {
            return Err(AllocCoreError::NotPending(id));
        }

        match outcome {
            AllocOutcome::Success => self.handle_alloc_success(id, annotations),
            AllocOutcome::Annotate => self.handle_alloc_annotate(id, annotations),
            AllocOutcome::Deny => self.handle_alloc_deny(id, note),
            AllocOutcome::Cancel => self.handle_alloc_cancel(id),
        }
    }

    fn remove_from_pending_list(&mut self, id: JobId) {
        if self.state.alloc_limit > 0 {
            if let Some(handle) = self.active_jobs.get_mut(id).unwrap().handle.take() {
                self.pending.remove(handle);
            }
        }
    }

    fn handle_alloc_success(
        &mut self,
        id: JobId,
        annotations: Option<serde_json::Value>,
    ) -> Result<(), AllocCoreError> {
        self.remove_from_pending_list(id);

        if self.active_jobs.get(id).unwrap().has_resources {
            return Err(AllocCoreError::AlreadyAllocated(id));
        }

        // Annotations are published before the job state is touched
        // further.
        if annotations.is_some() {
            self.active_jobs.get_mut(id).unwrap().annotations = annotations.clone();
            self.event_log
                .post(id, JobEvent::Annotations { annotations }, false);
        }

        self.state.alloc_pending_count -= 1;
        let job = self.active_jobs.get_mut(id).unwrap();
        job.alloc_pending = false;
        job.has_resources = true;
        let current_annotations = job.annotations.clone();

        self.event_log.post(
            id,
            JobEvent::Alloc {
                annotations: current_annotations,
            },
            false,
        );
        Ok(())
    }

    fn handle_alloc_annotate(
        &mut self,
        id: JobId,
        annotations: Option<serde_json::Value>,
    ) -> Result<(), AllocCoreError> {
        let annotations = annotations.ok_or(AllocCoreError::MissingAnnotations(id))?;
        self.active_jobs.get_mut(id).unwrap().annotations = Some(annotations.clone());
        self.event_log.post(
            id,
            JobEvent::Annotations {
                annotations: Some(annotations),
            },
            false,
        );
        Ok(())
    }

    fn handle_alloc_deny(&mut self, id: JobId, note: Option<String>) -> Result<(), AllocCoreError> {
        self.state.alloc_pending_count -= 1;
        self.active_jobs.get_mut(id).unwrap().alloc_pending = false;
        self.remove_from_pending_list(id);

        let cleared = self.active_jobs.get(id).unwrap().annotations.is_some();
        if cleared {
            self.active_jobs.get_mut(id).unwrap().annotations = None;
            self.event_log
                .post(id, JobEvent::Annotations { annotations: None }, true);
        }

        self.event_log.post(
            id,
            JobEvent::Exception {
                exc_type: "alloc".to_string(),
                severity: 0,
                userid: USERID_UNKNOWN.to_string(),
                note: note.unwrap_or_default(),
            },
            false,
        );
        Ok(())
    }

    fn handle_alloc_cancel(&mut self, id: JobId) -> Result<(), AllocCoreError> {
        self.state.alloc_pending_count -= 1;

        let in_sched_state = matches!(
            self.active_jobs.get(id).unwrap().state,
            crate::job::JobState::Sched
        );

        if in_sched_state {
            // `requeue_pending` clears any scheduler annotations and posts
            // the null-annotations event itself.
            self.requeue_pending(id);
        } else {
            self.remove_from_pending_list(id);
            let cleared = self.active_jobs.get(id).unwrap().annotations.is_some();
            if cleared {
                self.active_jobs.get_mut(id).unwrap().annotations = None;
                self.event_log
                    .post(id, JobEvent::Annotations { annotations: None }, true);
            }
        }
        self.active_jobs.get_mut(id).unwrap().alloc_pending = false;

        self.active_jobs.drive_state_action(id);
        self.drain.check();
        Ok(())
    }
}
