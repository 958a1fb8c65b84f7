//! The observer-facing [Promise] handle and how producers are launched.
//!
//! A promise is settled exactly once, by one of:
//!
//! - a blocking producer closure, see [Promise::new]
//! - an async producer, see [Promise::from_future]
//! - a [Resolver] held by the caller, see [Promise::pending]
//! - construction, see [Promise::resolve] and [Promise::reject]
//!
//! A panic inside a producer does not escape its task, it settles the promise with
//! [Error::Panic] instead.

use crate::cancel::CancelToken;
use crate::cell::Cell;
use crate::runtime::{AsyncExec, AsyncJoinHandle};
use crate::time::AsyncTime;
use crate::utils::Cancellable;
use crate::Error;
use futures_lite::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Settlement state of a promise, see [Promise::state].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Fulfilled => write!(f, "Fulfilled"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// A single-assignment value observed by any number of holders.
///
/// Cloning the handle is cheap, every clone refers to the same settlement. Reading the outcome
/// never consumes it: every [wait](Promise::wait) or [settled](Promise::settled) returns a clone
/// of the same value or fault.
///
/// Blocking waits (`wait*`) are meant for plain threads, async code should use the `settled*`
/// counterparts instead.
pub struct Promise<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for Promise<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self { cell: self.cell.clone() }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Promise({})", self.cell.state())
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Run a blocking producer on the runtime's thread pool.
    ///
    /// Returns immediately, the promise settles once `producer` returns (or panics).
    pub fn new<RT, F>(rt: &RT, producer: F) -> Self
    where
        RT: AsyncExec,
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        let cell = Arc::new(Cell::new());
        let _cell = cell.clone();
        rt.spawn_blocking(move || {
            let outcome = catch_unwind(AssertUnwindSafe(producer)).unwrap_or_else(|payload| {
                let e = Error::from_panic(payload);
                log::debug!("promise producer {}", e);
                Err(e)
            });
            _cell.try_settle(outcome);
        })
        .detach();
        Self { cell }
    }

    /// Run an async producer as a runtime task.
    pub fn from_future<RT, F>(rt: &RT, producer: F) -> Self
    where
        RT: AsyncExec,
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let cell = Arc::new(Cell::new());
        let _cell = cell.clone();
        rt.spawn_detach(async move {
            let outcome = AssertUnwindSafe(producer).catch_unwind().await.unwrap_or_else(|payload| {
                let e = Error::from_panic(payload);
                log::debug!("promise producer {}", e);
                Err(e)
            });
            _cell.try_settle(outcome);
        });
        Self { cell }
    }

    /// An already fulfilled promise.
    #[inline]
    pub fn resolve(value: T) -> Self {
        Self { cell: Arc::new(Cell::settled(Ok(value))) }
    }

    /// An already rejected promise.
    #[inline]
    pub fn reject<E: Into<Error>>(fault: E) -> Self {
        Self { cell: Arc::new(Cell::settled(Err(fault.into()))) }
    }

    /// A pending promise together with the [Resolver] that settles it.
    pub fn pending() -> (Self, Resolver<T>) {
        let cell = Arc::new(Cell::new());
        (Self { cell: cell.clone() }, Resolver { cell })
    }

    /// A promise that never settles.
    #[inline]
    pub(crate) fn never() -> Self {
        Self { cell: Arc::new(Cell::new()) }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.cell.state()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    #[inline]
    pub fn is_fulfilled(&self) -> bool {
        self.state() == State::Fulfilled
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        self.state() == State::Rejected
    }

    /// The outcome if already settled, without waiting.
    #[inline]
    pub fn try_get(&self) -> Option<Result<T, Error>> {
        self.cell.peek()
    }

    /// Block the current thread until the promise settles.
    ///
    /// NOTE: promises derived by combinators settle from a runtime task. On a runtime that only
    /// makes progress inside [block_on](crate::runtime::AsyncExec::block_on) (smol with a custom
    /// executor), waiting on one from a thread outside `block_on` never returns.
    #[inline]
    pub fn wait(&self) -> Result<T, Error> {
        self.cell.wait()
    }

    /// Block the current thread until the promise settles or `timeout` elapses.
    ///
    /// On expiry returns [Error::Timeout], the promise itself keeps going and later waits may
    /// still see its outcome. A `timeout` too large to express as a deadline waits without
    /// bound, the same as [wait](Promise::wait), and is subject to the same NOTE about runtimes
    /// driven only inside `block_on`.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, Error> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.cell.wait();
        };
        match self.cell.wait_deadline(deadline) {
            Some(outcome) => outcome,
            None => Err(Error::Timeout(timeout)),
        }
    }

    /// Block the current thread until the promise settles or `token` is cancelled.
    ///
    /// On cancellation returns [Error::Cancelled] with the token's reason, the promise itself
    /// is not affected.
    pub fn wait_cancel(&self, token: &CancelToken) -> Result<T, Error> {
        futures_lite::future::block_on(self.settled_cancel(token))
    }

    /// A future resolving to the outcome once the promise settles.
    #[inline]
    pub fn settled(&self) -> Settled<T> {
        Settled::new(self.cell.clone())
    }

    /// Async form of [wait_timeout](Promise::wait_timeout), timed by the runtime's timer.
    pub async fn settled_timeout<RT: AsyncTime>(&self, timeout: Duration) -> Result<T, Error> {
        match RT::timeout(timeout, self.settled()).await {
            Ok(outcome) => outcome,
            Err(()) => Err(Error::Timeout(timeout)),
        }
    }

    /// Async form of [wait_cancel](Promise::wait_cancel).
    pub async fn settled_cancel(&self, token: &CancelToken) -> Result<T, Error> {
        match Cancellable::new(self.settled(), token.cancelled()).await {
            Ok(outcome) => outcome,
            Err(reason) => Err(Error::Cancelled(reason)),
        }
    }
}

/// The settling side of [Promise::pending].
///
/// Only the first settle call is accepted. Dropping a resolver that never settled rejects the
/// promise with [Error::Abandoned], observers never hang on a lost producer.
pub struct Resolver<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Resolver<T> {
    /// Returns false if the promise was already settled.
    #[inline]
    pub fn settle(&self, outcome: Result<T, Error>) -> bool {
        self.cell.try_settle(outcome)
    }

    #[inline]
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    #[inline]
    pub fn reject<E: Into<Error>>(&self, fault: E) -> bool {
        self.settle(Err(fault.into()))
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if self.cell.try_settle(Err(Error::Abandoned)) {
            log::debug!("resolver dropped before settling");
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Resolver({})", self.cell.state())
    }
}

/// Future returned by [Promise::settled].
///
/// Owns a reference to the promise, so it may outlive the handle it came from. Dropping it
/// before settlement unregisters its waker.
pub struct Settled<T> {
    cell: Arc<Cell<T>>,
    key: Option<u64>,
}

impl<T> Settled<T> {
    #[inline]
    pub(crate) fn new(cell: Arc<Cell<T>>) -> Self {
        Self { cell, key: None }
    }
}

impl<T: Clone> Future for Settled<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _self = self.get_mut();
        _self.cell.poll_settled(cx, &mut _self.key)
    }
}

impl<T> Drop for Settled<T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.cell.forget(key);
        }
    }
}
