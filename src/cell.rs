//! The settlement cell behind every [Promise](crate::Promise).
//!
//! The outcome and the list of waiting observers live under one mutex. Settling stores the
//! outcome first, then wakes everybody: blocking observers through the condvar, async observers
//! through their registered wakers. Observers clone the stored outcome, so any number of them,
//! arriving before or after settlement, see the same result.

use crate::Error;
use crate::promise::State;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Instant;

pub(crate) struct Cell<T> {
    slot: Mutex<Slot<T>>,
    cond: Condvar,
}

struct Slot<T> {
    outcome: Option<Result<T, Error>>,
    wakers: Vec<(u64, Waker)>,
    next_key: u64,
}

impl<T> Cell<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::with_outcome(None)
    }

    #[inline]
    pub(crate) fn settled(outcome: Result<T, Error>) -> Self {
        Self::with_outcome(Some(outcome))
    }

    fn with_outcome(outcome: Option<Result<T, Error>>) -> Self {
        Self {
            slot: Mutex::new(Slot { outcome, wakers: Vec::new(), next_key: 0 }),
            cond: Condvar::new(),
        }
    }

    // No user code runs while the lock is held, a poisoned lock still holds a consistent slot.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome if nobody did before. Returns false when already settled.
    pub(crate) fn try_settle(&self, outcome: Result<T, Error>) -> bool {
        let wakers = {
            let mut slot = self.lock();
            if slot.outcome.is_some() {
                return false;
            }
            log::trace!("promise settled {}", if outcome.is_ok() { "fulfilled" } else { "rejected" });
            slot.outcome = Some(outcome);
            std::mem::take(&mut slot.wakers)
        };
        self.cond.notify_all();
        for (_, waker) in wakers {
            waker.wake();
        }
        true
    }

    pub(crate) fn state(&self) -> State {
        match &self.lock().outcome {
            None => State::Pending,
            Some(Ok(_)) => State::Fulfilled,
            Some(Err(_)) => State::Rejected,
        }
    }

    /// Drop the waker registered under `key`, for observers that stop waiting.
    pub(crate) fn forget(&self, key: u64) {
        self.lock().wakers.retain(|(k, _)| *k != key);
    }
}

impl<T: Clone> Cell<T> {
    pub(crate) fn peek(&self) -> Option<Result<T, Error>> {
        self.lock().outcome.clone()
    }

    /// Block the current thread until settled.
    pub(crate) fn wait(&self) -> Result<T, Error> {
        let mut slot = self.lock();
        loop {
            if let Some(outcome) = &slot.outcome {
                return outcome.clone();
            }
            slot = self.cond.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block the current thread until settled, or None when `deadline` passes first.
    pub(crate) fn wait_deadline(&self, deadline: Instant) -> Option<Result<T, Error>> {
        let mut slot = self.lock();
        loop {
            if let Some(outcome) = &slot.outcome {
                return Some(outcome.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            slot = self
                .cond
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Poll for the outcome on behalf of an async observer.
    ///
    /// `key` identifies the observer's waker slot across polls, it is cleared once the outcome
    /// is returned.
    pub(crate) fn poll_settled(
        &self, cx: &mut Context<'_>, key: &mut Option<u64>,
    ) -> Poll<Result<T, Error>> {
        let mut slot = self.lock();
        if let Some(outcome) = &slot.outcome {
            // settle() already drained the waker list
            *key = None;
            return Poll::Ready(outcome.clone());
        }
        if let Some(k) = *key {
            if let Some((_, waker)) = slot.wakers.iter_mut().find(|(wk, _)| *wk == k) {
                if !waker.will_wake(cx.waker()) {
                    *waker = cx.waker().clone();
                }
                return Poll::Pending;
            }
        }
        let k = slot.next_key;
        slot.next_key += 1;
        slot.wakers.push((k, cx.waker().clone()));
        *key = Some(k);
        Poll::Pending
    }
}
