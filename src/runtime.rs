//! The runtime model defines interface to adapt various async runtimes.
//!
//! The adaptors are provided as sub-crates:
//!
//! - [pledge-tokio](https://docs.rs/pledge-tokio)
//!
//! - [pledge-smol](https://docs.rs/pledge-smol)
//!
//! Promise producers are plain blocking closures, they run through
//! [spawn_blocking](AsyncExec::spawn_blocking). Combinators only wait on other promises, they
//! run as ordinary tasks through [spawn_detach](AsyncExec::spawn_detach).

use std::future::Future;

/// Defines the execution-related interface we used from async runtime
pub trait AsyncExec: Send + Sync + 'static {
    /// Spawn a task in the background, returning a handle to await its result
    fn spawn<F, R>(&self, f: F) -> impl AsyncJoinHandle<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static;

    /// Spawn a task and detach it (no handle returned)
    fn spawn_detach<F, R>(&self, f: F)
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static;

    /// Run a blocking closure on the runtime's thread pool, off the async workers
    fn spawn_blocking<F, R>(&self, f: F) -> impl AsyncJoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static;

    /// Run a future to completion on the runtime
    fn block_on<F, R>(&self, f: F) -> R
    where
        F: Future<Output = R> + Send,
        R: Send + 'static;
}

impl<FT: std::ops::Deref<Target = T> + Send + Sync + 'static, T: AsyncExec> AsyncExec for FT {
    #[inline(always)]
    fn spawn<F, R>(&self, f: F) -> impl AsyncJoinHandle<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        T::spawn(self.deref(), f)
    }

    #[inline(always)]
    fn spawn_detach<F, R>(&self, f: F)
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        T::spawn_detach(self.deref(), f)
    }

    #[inline(always)]
    fn spawn_blocking<F, R>(&self, f: F) -> impl AsyncJoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        T::spawn_blocking(self.deref(), f)
    }

    #[inline(always)]
    fn block_on<F, R>(&self, f: F) -> R
    where
        F: Future<Output = R> + Send,
        R: Send + 'static,
    {
        T::block_on(self.deref(), f)
    }
}

/// A handle that can be used to await the result of a spawned task.
pub trait AsyncJoinHandle<T: Send + 'static>: Send + 'static {
    /// Wait for the task, Err(()) when the task was aborted or panicked inside the runtime.
    fn join(self) -> impl Future<Output = Result<T, ()>> + Send;

    /// Detaches the task, allowing it to run in the background without waiting for its result.
    fn detach(self);
}
