//! The priority-ordered queue structure shared by the waiting queue and the
//! pending list.
//!
//! Jobs are ordered by a total order: priority descending, ties broken by
//! `t_submit` ascending. Modeled as an arena-backed intrusive doubly linked
//! list so that a `Handle` stays valid across insertions/removals anywhere
//! else in the list — the one operation that invalidates it is a full
//! re-sort, which rebuilds the list from scratch rather than relinking
//! nodes in place, so handles must be rebound by walking the list after
//! sorting.

use std::cmp::Ordering;

use crate::job::JobId;

pub type Handle = usize;

/// The key a job is ordered by. Stored alongside the job id in each node so
/// the queue never needs to reach back into job storage to compare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderKey {
    pub priority: u32,
    pub t_submit: f64,
}

impl OrderKey {
    pub fn new(priority: u32, t_submit: f64) -> Self {
        OrderKey { priority, t_submit }
    }

    /// `true` iff a job with this priority should be inserted via a
    /// forward (head-first) scan rather than a backward (tail-first) one:
    /// the hint is `true` iff the job's priority is strictly greater than
    /// half of `PRIORITY_MAX`.
    pub fn fwd_hint(&self) -> bool {
        self.priority as u64 > (crate::job::PRIORITY_MAX as u64) / 2
    }

    /// Orders `self` ahead of `other` iff `self` should be dispatched
    /// first: higher priority wins, ties go to the earlier submission.
    pub(crate) fn precedes(&self, other: &OrderKey) -> bool {
        match self.priority.cmp(&other.priority) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.t_submit < other.t_submit,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    job_id: JobId,
    key: OrderKey,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// An ordered multiset of job references, in the core's priority-total-order.
#[derive(Debug, Default)]
pub struct OrderedQueue {
    nodes: Vec<Option<Node>>,
    free: Vec<Handle>,
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
}

impl OrderedQueue {
    pub fn new() -> Self {
        OrderedQueue {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<JobId> {
        self.head.map(|h| self.nodes[h].as_ref().unwrap().job_id)
    }

    pub fn last(&self) -> Option<JobId> {
        self.tail.map(|h| self.nodes[h].as_ref().unwrap().job_id)
    }

    fn alloc_slot(&mut self, node: Node) -> Handle {
        if let Some(h) = self.free.pop() {
            self.nodes[h] = Some(node);
            h
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn unlink(&mut self, handle: Handle) {
        let (prev, next) = {
            let node = self.nodes[handle].as_ref().expect("unlink of freed handle");
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].as_mut().unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].as_mut().unwrap().prev = prev,
            None => self.tail = prev,
        }
    }

    /// Finds the handle immediately before which `key` should be inserted
    /// to preserve sort order, scanning from the head (`fwd = true`) or
    /// from the tail (`fwd = false`). Returns `None` if `key` belongs at
    /// the tail.
    fn find_insertion_point(&self, key: &OrderKey, fwd: bool) -> Option<Handle> {
        if fwd {
            let mut cur = self.head;
            while let Some(h) = cur {
                let node = self.nodes[h].as_ref().unwrap();
                if key.precedes(&node.key) {
                    return Some(h);
                }
                cur = node.next;
            }
            None
        } else {
            // Scan from the tail looking for the last node that still
            // precedes `key`; insert right after it. Equivalent ordering
            // to the forward scan, just walked from the other end.
            let mut cur = self.tail;
            while let Some(h) = cur {
                let node = self.nodes[h].as_ref().unwrap();
                if node.key.precedes(key) {
                    return node.next;
                }
                cur = node.prev;
            }
            self.head
        }
    }

    fn link_before(&mut self, handle: Handle, before: Option<Handle>) {
        match before {
            Some(b) => {
                let prev = self.nodes[b].as_ref().unwrap().prev;
                self.nodes[handle].as_mut().unwrap().prev = prev;
                self.nodes[handle].as_mut().unwrap().next = Some(b);
                match prev {
                    Some(p) => self.nodes[p].as_mut().unwrap().next = Some(handle),
                    None => self.head = Some(handle),
                }
                self.nodes[b].as_mut().unwrap().prev = Some(handle);
            }
            None => {
                self.nodes[handle].as_mut().unwrap().prev = self.tail;
                self.nodes[handle].as_mut().unwrap().next = None;
                match self.tail {
                    Some(t) => self.nodes[t].as_mut().unwrap().next = Some(handle),
                    None => self.head = Some(handle),
                }
                self.tail = Some(handle);
            }
        }
    }

    /// Inserts `job_id` with the given order key, scanning in the
    /// direction indicated by `fwd`. Returns the new handle.
    pub fn insert(&mut self, job_id: JobId, key: OrderKey, fwd: bool) -> Handle {
        let before = self.find_insertion_point(&key, fwd);
        let handle = self.alloc_slot(Node {
            job_id,
            key,
            prev: None,
            next: None,
        });
        self.link_before(handle, before);
        self.len += 1;
        handle
    }

    /// Removes the job at `handle`. Idempotent-safe to call only once per
    /// handle; callers must clear their stored handle after calling this.
    pub fn remove(&mut self, handle: Handle) {
        self.unlink(handle);
        self.nodes[handle] = None;
        self.free.push(handle);
        self.len -= 1;
    }

    /// Moves the job at `handle` to its new sorted position given an
    /// updated key, preserving the handle's identity.
    pub fn reorder(&mut self, handle: Handle, new_key: OrderKey, fwd: bool) {
        self.unlink(handle);
        self.nodes[handle].as_mut().unwrap().key = new_key;
        let before = self.find_insertion_point(&new_key, fwd);
        // find_insertion_point must not see the node we just unlinked, and
        // it doesn't: unlink already removed it from the prev/next chain
        // that the scan walks, even though the slot itself is still live.
        self.link_before(handle, before);
    }

    /// Iterates job ids from head (highest priority / earliest) to tail.
    pub fn iter(&self) -> impl Iterator<Item = JobId> + '_ {
        std::iter::successors(self.head, move |h| self.nodes[*h].as_ref().unwrap().next)
            .map(move |h| self.nodes[h].as_ref().unwrap().job_id)
    }

    /// Iterates job ids from tail (lowest priority / latest) to head, used
    /// to walk the pending list inward from its weakest member
    /// (`recalc_pending`).
    pub fn iter_rev(&self) -> impl Iterator<Item = JobId> + '_ {
        std::iter::successors(self.tail, move |h| self.nodes[*h].as_ref().unwrap().prev)
            .map(move |h| self.nodes[h].as_ref().unwrap().job_id)
    }

    /// Full re-sort: rebuilds the list from scratch in sorted order using
    /// `key_of` to read each job's current key, handing back
    /// `(job_id, new_handle)` pairs in head-to-tail order so the caller can
    /// rebind each job's stored handle.
    pub fn resort_rebinding(&mut self, key_of: impl Fn(JobId) -> OrderKey) -> Vec<(JobId, Handle)> {
        let mut entries: Vec<(JobId, OrderKey)> = self
            .iter()
            .map(|id| (id, key_of(id)))
            .collect();
        entries.sort_by(|(_, a), (_, b)| {
            if a.precedes(b) {
                Ordering::Less
            } else if b.precedes(a) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });

        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;

        let mut out = Vec::with_capacity(entries.len());
        for (id, key) in entries {
            let handle = self.alloc_slot(Node {
                job_id: id,
                key,
                prev: self.tail,
                next: None,
            });
            if let Some(t) = self.tail {
                self.nodes[t].as_mut().unwrap().next = Some(handle);
            } else {
                self.head = Some(handle);
            }
            self.tail = Some(handle);
            self.len += 1;
            out.push((id, handle));
        }
        out
    }
}
