//! The daemon's concrete [`alloc_core::DrainSupervisor`]. The core calls
//! `check()` from deep inside a `&mut self` borrow of [`alloc_core::AllocCore`],
//! so this can't re-borrow the core to inspect its own pending counts —
//! it just raises a flag, and the reactor loop (which isn't holding that
//! borrow) resolves it against the actual counts right after the call
//! that triggered it returns.

use std::cell::Cell;
use std::rc::Rc;

pub struct DaemonDrainSupervisor {
    shutdown_requested: Rc<Cell<bool>>,
    maybe_drained: Rc<Cell<bool>>,
}

impl DaemonDrainSupervisor {
    pub fn new(shutdown_requested: Rc<Cell<bool>>, maybe_drained: Rc<Cell<bool>>) -> Self {
        DaemonDrainSupervisor {
            shutdown_requested,
            maybe_drained,
        }
    }
}

impl alloc_core::DrainSupervisor for DaemonDrainSupervisor {
    fn check(&mut self) {
        if self.shutdown_requested.get() {
            self.maybe_drained.set(true);
        }
    }
}
