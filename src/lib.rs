#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]
#![doc = include_str!("../README.md")]

//! ## Modules
//!
//! - [`runtime`] - Traits for task spawn, blocking spawn, join and block_on.
//! - [`time`] - Traits for sleeping and timeouts.
//! - [`utils`] - Utility types, the [Cancellable](utils::Cancellable) race behind bounded waits.
//!
//! The promise itself lives at the top level: [Promise], [Resolver], [CancelToken], [Error],
//! and the combinators [all], [all_settled], [race], [any], [timeout], [sleep], [delay].
//!
//! At top level [AsyncRuntime] trait will combine all the capabilities, including
//! [`AsyncExec`] and [`AsyncTime`].
//!
//! ## Runtime Varieties Note
//!
//! ### Task Detach
//!
//! Producer and combinator tasks are always detached. Dropping every [Promise] handle does not
//! stop the producer, it runs to completion and its outcome is discarded.
//!
//! ### Panic
//!
//! Panics inside producers and combinator handlers are caught in the task and turn into
//! [Error::Panic], on every runtime. There is no need for the runtime to isolate panics.
//!
//! ### Blocking waits
//!
//! [Promise::wait] and friends park the calling thread. Inside async code use
//! [Promise::settled] and friends, otherwise a runtime worker is blocked.
//!
//! ## Inherence
//!
//! There's an blanket trait to auto impl AsyncRuntime on anything that is `Deref<Target>` to an
//! AsyncRuntime, so `Arc<TokioRT>` can be passed wherever a runtime is expected.
//!
//! ```text
//! pub trait AsyncRuntime: AsyncExec + AsyncTime {}
//!
//! impl<F: std::ops::Deref<Target = T> + Send + Sync + 'static, T: AsyncRuntime> AsyncRuntime for F {}
//! ```

mod cancel;
mod cell;
mod combinator;
mod error;
mod promise;
pub mod runtime;
pub mod time;
pub mod utils;

pub use cancel::CancelToken;
pub use combinator::{SettleRecord, all, all_settled, any, delay, race, sleep, timeout};
pub use error::{BoxError, Error};
pub use promise::{Promise, Resolver, Settled, State};

/// Re-export all the traits and types you need
///
/// Importing this prelude is the recommended way to use pledge in your code.
pub mod prelude {
    pub use crate::AsyncRuntime;
    pub use crate::runtime::{AsyncExec, AsyncJoinHandle};
    pub use crate::time::AsyncTime;
    pub use crate::{CancelToken, Error, Promise, Resolver, SettleRecord, State};
}

use prelude::*;

/// A marker trait that combines all the core async runtime capabilities,
/// including [`AsyncExec`] and [`AsyncTime`]. It serves as a convenient
/// way to specify that a type provides everything promises need from a runtime.
pub trait AsyncRuntime: AsyncExec + AsyncTime {}

impl<F: std::ops::Deref<Target = T> + Send + Sync + 'static, T: AsyncRuntime> AsyncRuntime for F {}
