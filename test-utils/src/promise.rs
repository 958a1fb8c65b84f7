use crate::{assert_elapsed_between, slow};
use captains_log::logfn;
use futures_lite::future::zip;
use pledge::prelude::*;
use rand::Rng;
use std::time::{Duration, Instant};

fn explode() -> Result<i32, Error> {
    panic!("boom")
}

fn explode_formatted() -> Result<i32, Error> {
    panic!("code {}", 7)
}

async fn explode_async() -> Result<i32, Error> {
    panic!("async boom")
}

/// Producers settle their promise with the value or the error they return.
#[logfn]
pub fn test_producer_outcome<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let ok = Promise::new(rt, || Ok(42));
        let bad = Promise::<i32>::new(rt, || Err(Error::reject("e1")));
        let from_future = Promise::from_future(rt, async {
            RT::sleep(Duration::from_millis(10)).await;
            Ok("async")
        });

        assert_eq!(ok.settled().await.unwrap(), 42);
        let e = bad.settled().await.unwrap_err();
        assert!(matches!(e, Error::Rejected(_)));
        assert_eq!(e.to_string(), "e1");
        assert_eq!(from_future.settled().await.unwrap(), "async");

        assert!(ok.is_fulfilled());
        assert!(bad.is_rejected());
        assert_eq!(ok.state(), State::Fulfilled);
        assert_eq!(bad.state(), State::Rejected);
        assert_eq!(format!("{:?}", ok), "Promise(Fulfilled)");
        log::info!("producers settled");
    });
}

/// Constructing a promise returns before its producer finishes.
#[logfn]
pub fn test_producer_not_blocking<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let p = Promise::new(rt, slow(Duration::from_millis(200), 1));
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(p.is_pending());
        assert!(p.try_get().is_none());
        assert_eq!(p.settled().await.unwrap(), 1);
        assert_elapsed_between(start, Duration::from_millis(200), Duration::from_secs(2));
        assert!(matches!(p.try_get(), Some(Ok(1))));
    });
}

/// A panicking producer rejects its promise instead of taking down the caller.
#[logfn]
pub fn test_producer_panic<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = Promise::new(rt, explode);
        let e = p.settled().await.unwrap_err();
        assert!(e.is_panic());
        assert_eq!(e.to_string(), "panic: boom");

        let p = Promise::new(rt, explode_formatted);
        assert_eq!(p.settled().await.unwrap_err().to_string(), "panic: code 7");

        let p = Promise::from_future(rt, explode_async());
        let e = p.settled().await.unwrap_err();
        assert!(e.is_panic());
        assert!(e.to_string().contains("async boom"));

        // the runtime is still usable afterwards
        let ok = Promise::new(rt, || Ok(1));
        assert_eq!(ok.settled().await.unwrap(), 1);
    });
}

/// Many observers, async and blocking, before and after settlement, all get the value.
#[logfn]
pub fn test_multi_observer<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    const EARLY: usize = 8;
    const BLOCKING: usize = 6;
    const LATE: usize = 4;
    rt.block_on(async {
        let p = Promise::new(rt, slow(Duration::from_millis(100), 7usize));

        let mut early = Vec::new();
        for _ in 0..EARLY {
            let p = p.clone();
            early.push(rt.spawn(async move { p.settled().await }));
        }
        let mut blocking = Vec::new();
        for _ in 0..BLOCKING {
            let p = p.clone();
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..200));
            blocking.push(rt.spawn_blocking(move || {
                std::thread::sleep(jitter);
                p.wait()
            }));
        }

        let (a, b) = zip(p.settled(), p.clone().settled()).await;
        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);

        let mut late = Vec::new();
        for _ in 0..LATE {
            let p = p.clone();
            late.push(rt.spawn(async move { p.settled().await }));
        }

        let mut received = 0;
        for h in early {
            assert_eq!(h.join().await.expect("observer task").unwrap(), 7);
            received += 1;
        }
        for h in blocking {
            assert_eq!(h.join().await.expect("observer thread").unwrap(), 7);
            received += 1;
        }
        for h in late {
            assert_eq!(h.join().await.expect("observer task").unwrap(), 7);
            received += 1;
        }
        assert_eq!(received, EARLY + BLOCKING + LATE);
        log::info!("{} observers received the value", received);
    });
}

/// A resolver handed to another task settles the promise, once.
#[logfn]
pub fn test_resolver_task<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let (p, resolver) = Promise::pending();
        let h = rt.spawn(async move {
            RT::sleep(Duration::from_millis(20)).await;
            let first = resolver.resolve("first".to_string());
            let second = resolver.resolve("second".to_string());
            (first, second)
        });
        assert_eq!(p.settled().await.unwrap(), "first");
        assert_eq!(h.join().await.unwrap(), (true, false));
        assert_eq!(p.settled().await.unwrap(), "first");

        // dropping an unused resolver does not leave observers hanging
        let (p, resolver) = Promise::<u8>::pending();
        rt.spawn_detach(async move {
            RT::sleep(Duration::from_millis(10)).await;
            drop(resolver);
        });
        assert!(matches!(p.settled().await, Err(Error::Abandoned)));
    });
}
