use pledge_test_utils::{combinator::*, promise::*, wait::*, *};
use pledge_tokio::TokioRT;
use rstest::*;
use std::sync::Arc;

#[fixture]
fn setup() {
    init_logger();
}

#[rstest]
#[case(TokioRT::new_multi_thread(2))]
#[case(TokioRT::new_current_thread())]
fn test_tokio_promise(setup: (), #[case] rt: TokioRT) {
    let _ = setup; // Explicitly ignore the fixture value
    test_producer_outcome(&rt);
    test_producer_not_blocking(&rt);
    test_producer_panic(&rt);
    test_multi_observer(&rt);
    test_resolver_task(&rt);
}

#[rstest]
#[case(TokioRT::new_multi_thread(2))]
#[case(TokioRT::new_current_thread())]
fn test_tokio_wait(setup: (), #[case] rt: TokioRT) {
    let _ = setup; // Explicitly ignore the fixture value
    test_wait_blocking(&rt);
    test_wait_timeout_independent(&rt);
    test_settled_timeout_independent(&rt);
    test_wait_cancel(&rt);
    test_wait_cancel_blocking(&rt);
}

#[rstest]
#[case(TokioRT::new_multi_thread(2))]
#[case(TokioRT::new_current_thread())]
fn test_tokio_combinator(setup: (), #[case] rt: TokioRT) {
    let _ = setup; // Explicitly ignore the fixture value
    test_then(&rt);
    test_then_else(&rt);
    test_then_promise(&rt);
    test_catch(&rt);
    test_finally(&rt);
    test_all(&rt);
    test_all_fail_fast(&rt);
    test_all_settled(&rt);
    test_race(&rt);
    test_any(&rt);
    test_timeout(&rt);
    test_sleep_delay(&rt);
    test_combinator_chain(&rt);
}

/// Anything that derefs to a runtime is a runtime too.
#[rstest]
fn test_tokio_arc_rt(setup: ()) {
    let _ = setup; // Explicitly ignore the fixture value
    let rt = Arc::new(TokioRT::new_multi_thread(2));
    test_producer_outcome(&rt);
    test_combinator_chain(&rt);
}

/// Blocking waits from the test thread, outside of block_on.
#[rstest]
fn test_tokio_wait_outside_runtime(setup: ()) {
    let _ = setup; // Explicitly ignore the fixture value
    use pledge::Promise;
    use std::time::Duration;

    let rt = TokioRT::new_multi_thread(2);
    let p = Promise::new(&rt, slow(Duration::from_millis(30), 6));
    let doubled = p.then(&rt, |v| Ok(v * 2));
    assert_eq!(doubled.wait().unwrap(), 12);
    assert!(pledge::timeout(&rt, &pledge::sleep(&rt, Duration::from_millis(200), 1), Duration::from_millis(10))
        .wait()
        .unwrap_err()
        .is_timeout());
}
