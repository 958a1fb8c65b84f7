//! Runtime generic test suites, shared by the pledge runtime adaptors.
//!
//! Every `test_*` function takes the runtime under test and drives it with
//! [block_on](pledge::runtime::AsyncExec::block_on). Blocking waits are issued from
//! [spawn_blocking](pledge::runtime::AsyncExec::spawn_blocking) threads, so executors that only
//! make progress inside `block_on` keep running while they wait.

use captains_log::{recipe, ConsoleTarget, Level};
use std::time::{Duration, Instant};

pub mod combinator;
pub mod promise;
pub mod wait;

// Initialize logging in the test utility crate
pub fn init_logger() {
    recipe::console_logger(ConsoleTarget::Stdout, Level::Debug)
        .test()
        .build()
        .expect("Failed to initialize logger");
}

/// Producer body that sleeps on the current thread before returning `value`.
pub fn slow<T>(d: Duration, value: T) -> impl FnOnce() -> Result<T, pledge::Error> {
    move || {
        std::thread::sleep(d);
        Ok(value)
    }
}

#[track_caller]
pub fn assert_elapsed_between(start: Instant, min: Duration, max: Duration) {
    let elapsed = start.elapsed();
    assert!(elapsed >= min && elapsed < max, "elapsed {:?} not in [{:?}, {:?})", elapsed, min, max);
}
