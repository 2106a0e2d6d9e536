//! Reentrant exclusive section for cache misses.
//!
//! The owning thread may enter again while it already holds the gate, which is
//! what lets a computation read other indices of the same cache.

use std::marker::PhantomData;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct GateOwner {
    thread: Option<ThreadId>,
    depth: usize,
}

/// Mutex-like gate that tracks its owning thread and nesting depth.
#[derive(Debug, Default)]
pub(crate) struct ComputeGate {
    owner: Mutex<GateOwner>,
    released: Condvar,
}

impl ComputeGate {
    /// Blocks until the gate is free or already owned by this thread.
    pub(crate) fn enter(&self) -> GateGuard<'_> {
        let me = thread::current().id();
        let mut owner = self.lock_owner();
        loop {
            match owner.thread {
                None => {
                    owner.thread = Some(me);
                    owner.depth = 1;
                    break;
                }
                Some(current) if current == me => {
                    owner.depth += 1;
                    break;
                }
                Some(_) => {
                    owner = self
                        .released
                        .wait(owner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        GateGuard {
            gate: self,
            _not_send: PhantomData,
        }
    }

    pub(crate) fn is_held_by_current_thread(&self) -> bool {
        self.lock_owner().thread == Some(thread::current().id())
    }

    fn lock_owner(&self) -> MutexGuard<'_, GateOwner> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Leaves the gate on drop; must stay on the entering thread.
pub(crate) struct GateGuard<'a> {
    gate: &'a ComputeGate,
    _not_send: PhantomData<*const ()>,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.gate.lock_owner();
        owner.depth = owner.depth.saturating_sub(1);
        if owner.depth == 0 {
            owner.thread = None;
            drop(owner);
            self.gate.released.notify_all();
        }
    }
}
