//! Combinators that derive a new [Promise] from one or more inputs.
//!
//! Each combinator spawns one task through [Promise::from_future]. The task observes the input
//! cells and settles the derived promise, so combinators need nothing special from the promise
//! itself and may be nested freely.
//!
//! Multi-input combinators watch all of their inputs at once, so [all] fails as soon as any
//! input rejects and [race] settles as soon as any input settles.
//!
//! ## First-settled tie-break
//!
//! When several inputs are already settled by the time the combinator's task looks at them, the
//! one with the lowest index is taken first. Inputs that settle while the task is waiting are
//! taken in the order the task observes them. Callers should not rely on either order.

use crate::promise::{Promise, Settled, State};
use crate::runtime::AsyncExec;
use crate::time::AsyncTime;
use crate::Error;
use futures_lite::stream::{Stream, StreamExt};
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

/// The outcome of one input of [all_settled].
#[derive(Debug, Clone)]
pub enum SettleRecord<T> {
    Fulfilled(T),
    Rejected(Error),
}

impl<T> SettleRecord<T> {
    #[inline]
    pub fn status(&self) -> State {
        match self {
            Self::Fulfilled(_) => State::Fulfilled,
            Self::Rejected(_) => State::Rejected,
        }
    }

    #[inline]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fulfilled(v) => Some(v),
            Self::Rejected(_) => None,
        }
    }

    #[inline]
    pub fn fault(&self) -> Option<&Error> {
        match self {
            Self::Fulfilled(_) => None,
            Self::Rejected(e) => Some(e),
        }
    }
}

impl<T> From<Result<T, Error>> for SettleRecord<T> {
    #[inline]
    fn from(outcome: Result<T, Error>) -> Self {
        match outcome {
            Ok(v) => Self::Fulfilled(v),
            Err(e) => Self::Rejected(e),
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Transform the value once fulfilled, a rejection passes through untouched.
    pub fn then<RT, U, F>(&self, rt: &RT, on_fulfilled: F) -> Promise<U>
    where
        RT: AsyncExec,
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, Error> + Send + 'static,
    {
        let input = self.settled();
        Promise::from_future(rt, async move { on_fulfilled(input.await?) })
    }

    /// Transform either outcome, only the handler matching the outcome is called.
    pub fn then_else<RT, U, F, R>(&self, rt: &RT, on_fulfilled: F, on_rejected: R) -> Promise<U>
    where
        RT: AsyncExec,
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, Error> + Send + 'static,
        R: FnOnce(Error) -> Result<U, Error> + Send + 'static,
    {
        let input = self.settled();
        Promise::from_future(rt, async move {
            match input.await {
                Ok(v) => on_fulfilled(v),
                Err(e) => on_rejected(e),
            }
        })
    }

    /// Continue with another promise once fulfilled, settling with whatever that promise settles
    /// with.
    pub fn then_promise<RT, U, F>(&self, rt: &RT, on_fulfilled: F) -> Promise<U>
    where
        RT: AsyncExec,
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        let input = self.settled();
        Promise::from_future(rt, async move {
            let next = on_fulfilled(input.await?);
            next.settled().await
        })
    }

    /// Recover from a rejection. The handler returning `Err` keeps the promise rejected.
    pub fn catch<RT, R>(&self, rt: &RT, on_rejected: R) -> Promise<T>
    where
        RT: AsyncExec,
        R: FnOnce(Error) -> Result<T, Error> + Send + 'static,
    {
        self.then_else(rt, Ok, on_rejected)
    }

    /// Run `on_finally` after the input settles either way, then settle with the input's
    /// outcome.
    pub fn finally<RT, F>(&self, rt: &RT, on_finally: F) -> Promise<T>
    where
        RT: AsyncExec,
        F: FnOnce() + Send + 'static,
    {
        let input = self.settled();
        Promise::from_future(rt, async move {
            let outcome = input.await;
            on_finally();
            outcome
        })
    }

    /// See [timeout].
    #[inline]
    pub fn timeout<RT>(&self, rt: &RT, d: Duration) -> Promise<T>
    where
        RT: AsyncExec + AsyncTime,
    {
        timeout(rt, self, d)
    }
}

/// Fulfills with every value in input order, or rejects with the first rejection observed.
///
/// An empty input fulfills with an empty vector.
pub fn all<RT, T, I>(rt: &RT, promises: I) -> Promise<Vec<T>>
where
    RT: AsyncExec,
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let mut gather = Gather::new(promises);
    Promise::from_future(rt, async move {
        let mut values: Vec<Option<T>> = (0..gather.len()).map(|_| None).collect();
        while let Some((i, outcome)) = gather.next().await {
            values[i] = Some(outcome?);
        }
        Ok(values.into_iter().flatten().collect())
    })
}

/// Fulfills once every input settled, with one [SettleRecord] per input in input order. Never
/// rejects.
pub fn all_settled<RT, T, I>(rt: &RT, promises: I) -> Promise<Vec<SettleRecord<T>>>
where
    RT: AsyncExec,
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let mut gather = Gather::new(promises);
    Promise::from_future(rt, async move {
        let mut records: Vec<Option<SettleRecord<T>>> = (0..gather.len()).map(|_| None).collect();
        while let Some((i, outcome)) = gather.next().await {
            records[i] = Some(outcome.into());
        }
        Ok(records.into_iter().flatten().collect())
    })
}

/// Settles like the first input observed to settle, in either direction.
///
/// An empty input never settles.
pub fn race<RT, T, I>(rt: &RT, promises: I) -> Promise<T>
where
    RT: AsyncExec,
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let mut gather = Gather::new(promises);
    if gather.waits.is_empty() {
        return Promise::never();
    }
    Promise::from_future(rt, async move {
        match gather.next().await {
            Some((_, outcome)) => outcome,
            None => Err(Error::Abandoned),
        }
    })
}

/// Fulfills with the first fulfillment observed. When every input rejects, rejects with
/// [Error::Aggregate] holding each fault in input order.
///
/// An empty input rejects with an empty aggregate.
pub fn any<RT, T, I>(rt: &RT, promises: I) -> Promise<T>
where
    RT: AsyncExec,
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let mut gather = Gather::new(promises);
    Promise::from_future(rt, async move {
        let mut faults: Vec<Option<Error>> = (0..gather.len()).map(|_| None).collect();
        while let Some((i, outcome)) = gather.next().await {
            match outcome {
                Ok(v) => return Ok(v),
                Err(e) => faults[i] = Some(e),
            }
        }
        Err(Error::Aggregate(faults.into_iter().flatten().collect()))
    })
}

/// Settles like `promise` if it settles within `d`, otherwise rejects with [Error::Timeout].
///
/// This is a [race] between `promise` and a deadline promise on the runtime's timer. `promise`
/// itself is not affected by the deadline.
pub fn timeout<RT, T>(rt: &RT, promise: &Promise<T>, d: Duration) -> Promise<T>
where
    RT: AsyncExec + AsyncTime,
    T: Clone + Send + 'static,
{
    let deadline = Promise::from_future(rt, async move {
        RT::sleep(d).await;
        Err(Error::Timeout(d))
    });
    race(rt, [promise.clone(), deadline])
}

/// Fulfills with `value` after `d`.
pub fn sleep<RT, T>(rt: &RT, d: Duration, value: T) -> Promise<T>
where
    RT: AsyncExec + AsyncTime,
    T: Clone + Send + 'static,
{
    Promise::from_future(rt, async move {
        RT::sleep(d).await;
        Ok(value)
    })
}

/// Fulfills with `()` after `d`.
#[inline]
pub fn delay<RT>(rt: &RT, d: Duration) -> Promise<()>
where
    RT: AsyncExec + AsyncTime,
{
    sleep(rt, d, ())
}

/// Yields `(index, outcome)` for each input as it settles.
///
/// Every input is polled with its own waker, so a wake only re-polls the inputs that asked for
/// it rather than the whole set.
struct Gather<T> {
    waits: Vec<Option<Settled<T>>>,
    wakers: Vec<Waker>,
    ready: Arc<ReadySet>,
    remaining: usize,
}

/// Indices of inputs woken since the gather last looked, plus the gather's own waker.
struct ReadySet {
    inner: Mutex<ReadyInner>,
}

struct ReadyInner {
    indices: BTreeSet<usize>,
    parent: Option<Waker>,
}

impl ReadySet {
    fn lock(&self) -> MutexGuard<'_, ReadyInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct InputWaker {
    index: usize,
    ready: Arc<ReadySet>,
}

impl Wake for InputWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let parent = {
            let mut inner = self.ready.lock();
            inner.indices.insert(self.index);
            inner.parent.clone()
        };
        if let Some(waker) = parent {
            waker.wake();
        }
    }
}

impl<T: Clone> Gather<T> {
    fn new<I: IntoIterator<Item = Promise<T>>>(promises: I) -> Self
    where
        T: Send + 'static,
    {
        let waits: Vec<_> = promises.into_iter().map(|p| Some(p.settled())).collect();
        let remaining = waits.len();
        // every input starts out ready so the first poll registers all of them
        let ready = Arc::new(ReadySet {
            inner: Mutex::new(ReadyInner { indices: (0..remaining).collect(), parent: None }),
        });
        let wakers = (0..remaining)
            .map(|index| Waker::from(Arc::new(InputWaker { index, ready: ready.clone() })))
            .collect();
        Self { waits, wakers, ready, remaining }
    }

    #[inline]
    fn len(&self) -> usize {
        self.waits.len()
    }
}

impl<T: Clone> Stream for Gather<T> {
    type Item = (usize, Result<T, Error>);

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let _self = self.get_mut();
        if _self.remaining == 0 {
            return Poll::Ready(None);
        }
        loop {
            // the parent waker is stored before taking an index, so a wake landing after the
            // last index is taken still reaches us
            let next = {
                let mut inner = _self.ready.lock();
                match &inner.parent {
                    Some(w) if w.will_wake(cx.waker()) => {}
                    _ => inner.parent = Some(cx.waker().clone()),
                }
                inner.indices.pop_first()
            };
            let Some(i) = next else {
                return Poll::Pending;
            };
            if let Some(settled) = &mut _self.waits[i] {
                let mut input_cx = Context::from_waker(&_self.wakers[i]);
                if let Poll::Ready(outcome) = Pin::new(settled).poll(&mut input_cx) {
                    _self.waits[i] = None;
                    _self.remaining -= 1;
                    return Poll::Ready(Some((i, outcome)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountWaker(AtomicUsize);

    impl Wake for CountWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn poll_gather<T: Clone>(
        gather: &mut Gather<T>, waker: &Waker,
    ) -> Poll<Option<(usize, Result<T, Error>)>> {
        let mut cx = Context::from_waker(waker);
        Pin::new(gather).poll_next(&mut cx)
    }

    #[test]
    fn test_gather_takes_woken_inputs() {
        let count = Arc::new(CountWaker(AtomicUsize::new(0)));
        let waker = Waker::from(count.clone());
        let (promises, resolvers): (Vec<_>, Vec<_>) =
            (0..4).map(|_| Promise::<usize>::pending()).unzip();
        let mut gather = Gather::new(promises);
        assert_eq!(gather.len(), 4);

        assert!(poll_gather(&mut gather, &waker).is_pending());
        // nothing woke, so nothing is polled again
        assert!(poll_gather(&mut gather, &waker).is_pending());
        assert!(gather.ready.lock().indices.is_empty());
        assert_eq!(count.0.load(Ordering::SeqCst), 0);

        resolvers[2].resolve(20);
        assert_eq!(count.0.load(Ordering::SeqCst), 1);
        assert_eq!(gather.ready.lock().indices.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(Some((2, Ok(20))))));

        // two inputs settle between polls, the lower index comes out first
        resolvers[3].resolve(30);
        resolvers[0].reject("e0");
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(Some((0, Err(_))))));
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(Some((3, Ok(30))))));
        assert!(poll_gather(&mut gather, &waker).is_pending());

        resolvers[1].resolve(10);
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(Some((1, Ok(10))))));
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(None)));
    }

    #[test]
    fn test_gather_already_settled() {
        let waker = Waker::from(Arc::new(CountWaker(AtomicUsize::new(0))));
        let (pending, _resolver) = Promise::<i32>::pending();
        let promises = vec![pending, Promise::resolve(1), Promise::resolve(2)];
        let mut gather = Gather::new(promises);
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(Some((1, Ok(1))))));
        assert!(matches!(poll_gather(&mut gather, &waker), Poll::Ready(Some((2, Ok(2))))));
        assert!(poll_gather(&mut gather, &waker).is_pending());
    }
}
