//! Shared-state wrapper following the same `WrappedRcRefCell<T>`
//! convention used for `WorkerStateRef`/`StateRef` elsewhere in this
//! codebase. The allocation core is single-threaded and cooperative, so
//! interior mutability via `Rc<RefCell<_>>` is enough — no `Arc`/`Mutex`.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub struct WrappedRcRefCell<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> WrappedRcRefCell<T> {
    pub fn wrap(value: T) -> Self {
        WrappedRcRefCell {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn get(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }
}

impl<T> Clone for WrappedRcRefCell<T> {
    fn clone(&self) -> Self {
        WrappedRcRefCell {
            inner: self.inner.clone(),
        }
    }
}
