use crate::{assert_elapsed_between, slow};
use captains_log::logfn;
use pledge::prelude::*;
use std::time::{Duration, Instant};

/// Blocking wait from a plain thread.
#[logfn]
pub fn test_wait_blocking<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = Promise::new(rt, slow(Duration::from_millis(50), "done".to_string()));
        let _p = p.clone();
        let r = rt.spawn_blocking(move || _p.wait()).join().await.unwrap();
        assert_eq!(r.unwrap(), "done");
        // a second wait sees the same value
        assert_eq!(p.wait().unwrap(), "done");

        let bad = Promise::<i32>::new(rt, || Err("nope".into()));
        let r = rt.spawn_blocking(move || bad.wait()).join().await.unwrap();
        assert_eq!(r.unwrap_err().to_string(), "nope");
    });
}

/// A blocking wait that times out leaves the promise running for later observers.
#[logfn]
pub fn test_wait_timeout_independent<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let p = Promise::new(rt, slow(Duration::from_millis(150), 9));

        let _p = p.clone();
        let r = rt
            .spawn_blocking(move || _p.wait_timeout(Duration::from_millis(20)))
            .join()
            .await
            .unwrap();
        let e = r.unwrap_err();
        assert!(e.is_timeout());
        assert!(matches!(e, Error::Timeout(d) if d == Duration::from_millis(20)));
        assert_elapsed_between(start, Duration::from_millis(20), Duration::from_millis(140));
        assert!(p.is_pending());

        let _p = p.clone();
        let r = rt.spawn_blocking(move || _p.wait()).join().await.unwrap();
        assert_eq!(r.unwrap(), 9);
        assert_elapsed_between(start, Duration::from_millis(150), Duration::from_secs(2));

        // once settled, a bounded wait returns at once
        let _p = p.clone();
        let r = rt
            .spawn_blocking(move || _p.wait_timeout(Duration::from_millis(1)))
            .join()
            .await
            .unwrap();
        assert_eq!(r.unwrap(), 9);
    });
}

/// Async bounded wait, timed by the runtime.
#[logfn]
pub fn test_settled_timeout_independent<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let p = Promise::new(rt, slow(Duration::from_millis(150), 9));

        let e = p.settled_timeout::<RT>(Duration::from_millis(20)).await.unwrap_err();
        assert!(e.is_timeout());
        assert_elapsed_between(start, Duration::from_millis(20), Duration::from_millis(140));
        assert!(p.is_pending());

        // another observer still gets the value once it arrives
        let other = p.clone();
        let h = rt.spawn(async move { other.settled().await });
        assert_eq!(h.join().await.unwrap().unwrap(), 9);
        assert_elapsed_between(start, Duration::from_millis(150), Duration::from_secs(2));

        assert_eq!(p.settled_timeout::<RT>(Duration::from_millis(1)).await.unwrap(), 9);
    });
}

/// Cancelling a wait abandons only that wait.
#[logfn]
pub fn test_wait_cancel<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let p = Promise::new(rt, slow(Duration::from_millis(200), 3));
        let token = CancelToken::new();

        let _token = token.clone();
        rt.spawn_detach(async move {
            RT::sleep(Duration::from_millis(20)).await;
            _token.cancel("user abort");
        });
        let e = p.settled_cancel(&token).await.unwrap_err();
        assert!(e.is_cancelled());
        assert_eq!(e.to_string(), "promise cancelled: user abort");
        assert_elapsed_between(start, Duration::from_millis(20), Duration::from_millis(180));
        assert!(token.is_cancelled());
        assert!(p.is_pending());

        // a blocking wait on the cancelled token returns right away
        let (_p, _token) = (p.clone(), token.clone());
        let r = rt.spawn_blocking(move || _p.wait_cancel(&_token)).join().await.unwrap();
        assert!(matches!(r, Err(Error::Cancelled(reason)) if reason == "user abort"));

        // the promise itself carries on
        assert_eq!(p.settled().await.unwrap(), 3);
        // and a settled promise wins over a cancelled token
        assert_eq!(p.settled_cancel(&token).await.unwrap(), 3);
    });
}

/// A blocking cancellable wait is woken when the token fires from another thread.
#[logfn]
pub fn test_wait_cancel_blocking<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let (p, _resolver) = Promise::<i32>::pending();
        let token = CancelToken::new();
        let _token = token.clone();
        let h = rt.spawn_blocking(move || p.wait_cancel(&_token));
        RT::sleep(Duration::from_millis(30)).await;
        assert!(token.cancel("shutdown"));
        assert!(!token.cancel("again"));
        let r = h.join().await.unwrap();
        assert!(matches!(r, Err(Error::Cancelled(reason)) if reason == "shutdown"));
        assert_eq!(token.reason().as_deref(), Some("shutdown"));
    });
}
