//! Time-related traits for async operations.
//!
//! The runtime timer drives [sleep](crate::sleep), [delay](crate::delay), the
//! [timeout](crate::timeout) combinator and [Promise::settled_timeout](crate::Promise::settled_timeout).

use crate::utils::Cancellable;
use std::future::Future;
use std::time::Duration;

/// Trait for async time-related operations.
///
/// This trait defines the interface for sleeping and applying timeouts to futures.
pub trait AsyncTime {
    /// Sleep for the specified duration.
    ///
    /// This method returns a future that completes after the specified
    /// duration has elapsed.
    fn sleep(d: Duration) -> impl Future + Send;

    /// Apply a timeout to a future.
    ///
    /// This method returns a future that completes either when the provided
    /// future completes or when the specified timeout duration elapses,
    /// whichever happens first.
    ///
    /// # Returns
    ///
    /// A future that resolves to `Ok` with the result of the original future
    /// if it completes before the timeout, or `Err(())` if the timeout elapses
    /// first.
    #[inline]
    fn timeout<F>(d: Duration, func: F) -> impl Future<Output = Result<F::Output, ()>> + Send
    where
        F: Future + Send,
    {
        async move { Cancellable::new(func, Self::sleep(d)).await.map_err(|_| ()) }
    }
}

impl<F: std::ops::Deref<Target = T>, T: AsyncTime> AsyncTime for F {
    #[inline(always)]
    fn sleep(d: Duration) -> impl Future + Send {
        T::sleep(d)
    }
}
