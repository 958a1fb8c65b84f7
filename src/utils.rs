//! Utility types and functions for async operations.
//!
//! This module provides helper types that support the other modules in the crate.

use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A cancellable future that is abandoned when another future completes.
    ///
    /// This struct allows you to race two futures and drop interest in one when the
    /// other completes. It backs every bounded wait in this crate: timeouts race against
    /// a runtime timer, cancellable waits race against a [CancelToken](crate::CancelToken).
    ///
    /// The main future is always polled first, so when both are ready on the same poll the
    /// main future wins.
    ///
    /// # Type Parameters
    ///
    /// * `F` - The main future that provides the primary result
    /// * `C` - The cancellation future, its output is returned as the error
    pub struct Cancellable<F, C> {
        #[pin]
        future: F,
        #[pin]
        cancel_future: C,
    }
}

impl<F: Future, C: Future> Cancellable<F, C> {
    /// Create a new cancellable future.
    ///
    /// # Parameters
    ///
    /// * `future` - The main future to execute
    /// * `cancel_future` - The future that, when completed, cancels the main future
    pub fn new(future: F, cancel_future: C) -> Self {
        Self { future, cancel_future }
    }
}

impl<F: Future, C: Future> Future for Cancellable<F, C> {
    type Output = Result<F::Output, C::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Poll::Ready(output) = this.future.poll(cx) {
            return Poll::Ready(Ok(output));
        }
        if let Poll::Ready(reason) = this.cancel_future.poll(cx) {
            return Poll::Ready(Err(reason));
        }
        Poll::Pending
    }
}
