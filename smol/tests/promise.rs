use async_executor::Executor;
use pledge_smol::SmolRT;
use pledge_test_utils::{combinator::*, promise::*, wait::*, *};
use rstest::*;
use std::sync::Arc;

#[fixture]
fn setup() {
    init_logger();
}

fn run_all(rt: &SmolRT) {
    test_producer_outcome(rt);
    test_producer_not_blocking(rt);
    test_producer_panic(rt);
    test_multi_observer(rt);
    test_resolver_task(rt);

    test_wait_blocking(rt);
    test_wait_timeout_independent(rt);
    test_settled_timeout_independent(rt);
    test_wait_cancel(rt);
    test_wait_cancel_blocking(rt);

    test_then(rt);
    test_then_else(rt);
    test_then_promise(rt);
    test_catch(rt);
    test_finally(rt);
    test_all(rt);
    test_all_fail_fast(rt);
    test_all_settled(rt);
    test_race(rt);
    test_any(rt);
    test_timeout(rt);
    test_sleep_delay(rt);
    test_combinator_chain(rt);
}

#[cfg(feature = "global")]
#[rstest]
fn test_smol_global(setup: ()) {
    let _ = setup; // Explicitly ignore the fixture value
    let rt = SmolRT::new_global();
    run_all(&rt);
}

#[rstest]
fn test_smol_rt_with_executor(setup: ()) {
    let _ = setup; // Explicitly ignore the fixture value
    let rt = SmolRT::new(Arc::new(Executor::new()));
    run_all(&rt);
}
