//! The fault type shared by every promise.
//!
//! A rejected promise hands the same [Error] to every observer, so it is cheap to clone:
//! producer errors are kept behind an `Arc`.

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The boxed form accepted by [Error::reject].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a promise (or a single wait on it) did not produce a value.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The producer returned an error.
    #[error("{0}")]
    Rejected(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The producer panicked, the payload is captured as text.
    #[error("panic: {0}")]
    Panic(String),

    /// A bounded wait expired, or the [timeout](crate::timeout) deadline won the race.
    #[error("promise timeout after {0:?}")]
    Timeout(Duration),

    /// A wait was abandoned through a [CancelToken](crate::CancelToken).
    #[error("promise cancelled: {0}")]
    Cancelled(String),

    /// Every input of [any](crate::any) rejected, faults are kept in input order.
    #[error("all promises rejected: [{}]", join_faults(.0))]
    Aggregate(Vec<Error>),

    /// The [Resolver](crate::Resolver) was dropped before settling.
    #[error("promise abandoned before settling")]
    Abandoned,
}

impl Error {
    /// Wrap an arbitrary error (or message) as a producer fault.
    #[inline]
    pub fn reject<E: Into<BoxError>>(e: E) -> Self {
        Self::Rejected(Arc::from(e.into()))
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }

    /// The per-input faults of an aggregate, or the error itself for anything else.
    pub fn faults(&self) -> &[Error] {
        match self {
            Self::Aggregate(faults) => faults,
            other => std::slice::from_ref(other),
        }
    }

    /// Convert a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&'static str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panic(msg)
    }
}

impl From<&str> for Error {
    #[inline]
    fn from(msg: &str) -> Self {
        Self::reject(msg)
    }
}

impl From<String> for Error {
    #[inline]
    fn from(msg: String) -> Self {
        Self::reject(msg)
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::reject(e)
    }
}

fn join_faults(faults: &[Error]) -> JoinFaults<'_> {
    JoinFaults(faults)
}

struct JoinFaults<'a>(&'a [Error]);

impl fmt::Display for JoinFaults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}
