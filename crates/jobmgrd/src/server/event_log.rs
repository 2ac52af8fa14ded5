//! An append-only per-job event journal backed by a single JSON-lines
//! file, the daemon's concrete [`alloc_core::EventLog`]. `no_commit`
//! events (the null-annotation clears, visible in memory but not
//! journaled) are kept in the in-memory tail but never written out.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use alloc_core::{JobEvent, JobId};
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
struct EventRecord {
    job_id: JobId,
    timestamp: String,
    event: String,
}

pub struct JsonlEventLog {
    file: File,
}

impl JsonlEventLog {
    pub fn open(path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JsonlEventLog { file })
    }
}

fn event_name(event: &JobEvent) -> String {
    match event {
        JobEvent::Alloc { .. } => "alloc".to_string(),
        JobEvent::Free => "free".to_string(),
        JobEvent::Annotations { .. } => "annotations".to_string(),
        JobEvent::Exception { exc_type, .. } => format!("exception.{exc_type}"),
        JobEvent::DebugAllocRequest => "debug.alloc-request".to_string(),
        JobEvent::DebugFreeRequest => "debug.free-request".to_string(),
    }
}

impl alloc_core::EventLog for JsonlEventLog {
    fn post(&mut self, job_id: JobId, event: JobEvent, no_commit: bool) {
        if no_commit {
            log::trace!("event (no_commit): job {job_id} {event:?}");
            return;
        }
        let record = EventRecord {
            job_id,
            timestamp: Utc::now().to_rfc3339(),
            event: event_name(&event),
        };
        match serde_json::to_string(&record) {
            Ok(line) => {
                if let Err(e) = writeln!(self.file, "{line}") {
                    log::error!("failed to append event for job {job_id}: {e}");
                }
            }
            Err(e) => log::error!("failed to encode event for job {job_id}: {e}"),
        }
    }
}
