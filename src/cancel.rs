//! Cancellation of individual waits.
//!
//! A [CancelToken] is a settlement cell holding the cancel reason, so any number of waits can
//! watch one token from threads or tasks.

use crate::cell::Cell;
use crate::promise::{Settled, State};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An external signal that abandons waits on promises.
///
/// Cancelling only ends the waits passed this token ([Promise::wait_cancel](crate::Promise::wait_cancel),
/// [Promise::settled_cancel](crate::Promise::settled_cancel)). The promises and their producers
/// carry on. The first reason given wins, clones share the same signal.
#[derive(Clone)]
pub struct CancelToken {
    cell: Arc<Cell<String>>,
}

impl CancelToken {
    #[inline]
    pub fn new() -> Self {
        Self { cell: Arc::new(Cell::new()) }
    }

    /// Returns false if the token was already cancelled.
    #[inline]
    pub fn cancel<S: Into<String>>(&self, reason: S) -> bool {
        self.cell.try_settle(Ok(reason.into()))
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cell.state() != State::Pending
    }

    #[inline]
    pub fn reason(&self) -> Option<String> {
        self.cell.peek().and_then(Result::ok)
    }

    /// Resolves to the reason once cancelled.
    pub fn cancelled(&self) -> impl Future<Output = String> + Send + use<> {
        let settled = Settled::new(self.cell.clone());
        async move {
            match settled.await {
                Ok(reason) => reason,
                Err(e) => e.to_string(),
            }
        }
    }
}

impl Default for CancelToken {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "CancelToken(cancelled: {})", reason),
            None => write!(f, "CancelToken(active)"),
        }
    }
}
