use crate::{assert_elapsed_between, slow};
use captains_log::logfn;
use pledge::prelude::*;
use pledge::{all, all_settled, any, delay, race, sleep, timeout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn fails_in_handler(_: i32) -> Result<i32, Error> {
    panic!("handler boom")
}

#[logfn]
pub fn test_then<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let doubled = Promise::resolve(5).then(rt, |x| Ok(x * 2));
        assert_eq!(doubled.settled().await.unwrap(), 10);

        let text = Promise::new(rt, slow(Duration::from_millis(20), 3)).then(rt, |x| Ok(format!("n={}", x)));
        assert_eq!(text.settled().await.unwrap(), "n=3");

        // rejection passes through, the handler is not called
        let called = Arc::new(AtomicBool::new(false));
        let _called = called.clone();
        let p = Promise::<i32>::reject("e1").then(rt, move |x| {
            _called.store(true, Ordering::SeqCst);
            Ok(x)
        });
        assert_eq!(p.settled().await.unwrap_err().to_string(), "e1");
        assert!(!called.load(Ordering::SeqCst));

        let p = Promise::resolve(1).then(rt, |_| -> Result<i32, Error> { Err("handler failed".into()) });
        assert_eq!(p.settled().await.unwrap_err().to_string(), "handler failed");

        let p = Promise::resolve(1).then(rt, fails_in_handler);
        let e = p.settled().await.unwrap_err();
        assert!(e.is_panic());
        assert!(e.to_string().contains("handler boom"));
    });
}

#[logfn]
pub fn test_then_else<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = Promise::resolve(4).then_else(rt, |v| Ok(v + 1), |_| Ok(-1));
        assert_eq!(p.settled().await.unwrap(), 5);

        let p = Promise::<i32>::reject("gone").then_else(rt, |v| Ok(v + 1), |e| Ok(e.to_string().len() as i32));
        assert_eq!(p.settled().await.unwrap(), 4);

        let p = Promise::<i32>::reject("gone").then_else(rt, Ok, |e| Err(Error::reject(format!("wrapped {}", e))));
        assert_eq!(p.settled().await.unwrap_err().to_string(), "wrapped gone");
    });
}

#[logfn]
pub fn test_then_promise<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = Promise::resolve(2).then_promise(rt, |v| Promise::resolve(v * 3));
        assert_eq!(p.settled().await.unwrap(), 6);

        // the continuation settles later, from a plain thread
        let start = Instant::now();
        let (next, resolver) = Promise::pending();
        let p = Promise::resolve(10).then_promise(rt, move |v| {
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                resolver.resolve(v + 1);
            });
            next
        });
        assert_eq!(p.settled().await.unwrap(), 11);
        assert_elapsed_between(start, Duration::from_millis(30), Duration::from_secs(2));

        let p = Promise::<i32>::reject("first").then_promise(rt, |v| Promise::resolve(v));
        assert_eq!(p.settled().await.unwrap_err().to_string(), "first");

        let p = Promise::resolve(1).then_promise(rt, |_| Promise::<i32>::reject("second"));
        assert_eq!(p.settled().await.unwrap_err().to_string(), "second");
    });
}

#[logfn]
pub fn test_catch<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = Promise::<i32>::reject("e1").catch(rt, |_| Ok(0));
        assert_eq!(p.settled().await.unwrap(), 0);

        let p = Promise::resolve(3).catch(rt, |_| Ok(0));
        assert_eq!(p.settled().await.unwrap(), 3);

        // declining keeps the original fault
        let p = Promise::<i32>::reject("e1").catch(rt, Err);
        assert_eq!(p.settled().await.unwrap_err().to_string(), "e1");

        // recovering a timeout
        let slow_one = sleep(rt, Duration::from_millis(200), 1);
        let p = timeout(rt, &slow_one, Duration::from_millis(10))
            .catch(rt, |e| if e.is_timeout() { Ok(-1) } else { Err(e) });
        assert_eq!(p.settled().await.unwrap(), -1);
    });
}

#[logfn]
pub fn test_finally<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let ran = Arc::new(AtomicBool::new(false));
        let _ran = ran.clone();
        let p = Promise::new(rt, slow(Duration::from_millis(20), 1)).finally(rt, move || {
            _ran.store(true, Ordering::SeqCst);
        });
        assert_eq!(p.settled().await.unwrap(), 1);
        assert!(ran.load(Ordering::SeqCst));

        let ran = Arc::new(AtomicBool::new(false));
        let _ran = ran.clone();
        let p = Promise::<i32>::reject("kept").finally(rt, move || {
            _ran.store(true, Ordering::SeqCst);
        });
        assert_eq!(p.settled().await.unwrap_err().to_string(), "kept");
        assert!(ran.load(Ordering::SeqCst));
    });
}

#[logfn]
pub fn test_all<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = all(
            rt,
            [
                Promise::new(rt, slow(Duration::from_millis(40), 1)),
                Promise::resolve(2),
                sleep(rt, Duration::from_millis(10), 3),
            ],
        );
        assert_eq!(p.settled().await.unwrap(), vec![1, 2, 3]);

        let empty = all::<_, i32, _>(rt, Vec::new());
        assert!(empty.settled().await.unwrap().is_empty());
    });
}

/// A rejection settles `all` without waiting for slower inputs.
#[logfn]
pub fn test_all_fail_fast<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let slow_one = sleep(rt, Duration::from_millis(300), 1);
        let p = all(rt, [slow_one.clone(), Promise::reject("fast fail")]);
        assert_eq!(p.settled().await.unwrap_err().to_string(), "fast fail");
        assert!(start.elapsed() < Duration::from_millis(200), "{:?}", start.elapsed());
        assert!(slow_one.is_pending());

        let late_fail = Promise::<i32>::new(rt, || {
            std::thread::sleep(Duration::from_millis(20));
            Err("late fail".into())
        });
        let p = all(rt, [sleep(rt, Duration::from_millis(300), 1), late_fail]);
        assert_eq!(p.settled().await.unwrap_err().to_string(), "late fail");
        assert_elapsed_between(start, Duration::from_millis(20), Duration::from_millis(250));
    });
}

#[logfn]
pub fn test_all_settled<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = all_settled(rt, [Promise::resolve(1), Promise::reject("e2")]);
        let records = p.settled().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], SettleRecord::Fulfilled(1)));
        assert_eq!(records[0].status(), State::Fulfilled);
        assert_eq!(records[0].value(), Some(&1));
        assert_eq!(records[1].status(), State::Rejected);
        assert_eq!(records[1].fault().map(|e| e.to_string()), Some("e2".to_string()));

        // input order is kept no matter which settles first
        let p = all_settled(
            rt,
            [sleep(rt, Duration::from_millis(50), "slow"), Promise::resolve("fast")],
        );
        let values: Vec<_> = p.settled().await.unwrap().iter().map(|r| r.value().copied()).collect();
        assert_eq!(values, vec![Some("slow"), Some("fast")]);

        let empty = all_settled::<_, i32, _>(rt, Vec::new());
        assert!(empty.settled().await.unwrap().is_empty());
    });
}

#[logfn]
pub fn test_race<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = race(
            rt,
            [sleep(rt, Duration::from_millis(50), "slow"), sleep(rt, Duration::from_millis(5), "fast")],
        );
        assert_eq!(p.settled().await.unwrap(), "fast");

        // the first settlement wins even when it is a rejection
        let p = race(rt, [sleep(rt, Duration::from_millis(100), 1), Promise::reject("first out")]);
        assert_eq!(p.settled().await.unwrap_err().to_string(), "first out");

        let never = race::<_, i32, _>(rt, Vec::new());
        RT::sleep(Duration::from_millis(20)).await;
        assert!(never.is_pending());
    });
}

#[logfn]
pub fn test_any<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let p = any(rt, [Promise::<i32>::reject("e1"), Promise::reject("e2")]);
        let e = p.settled().await.unwrap_err();
        assert!(matches!(e, Error::Aggregate(_)));
        let faults: Vec<String> = e.faults().iter().map(|f| f.to_string()).collect();
        assert_eq!(faults, vec!["e1".to_string(), "e2".to_string()]);
        assert_eq!(e.to_string(), "all promises rejected: [e1, e2]");

        let p = any(rt, [Promise::reject("e1"), Promise::resolve(8)]);
        assert_eq!(p.settled().await.unwrap(), 8);

        // a rejection arriving first does not settle `any`
        let p = any(rt, [Promise::reject("e1"), sleep(rt, Duration::from_millis(20), 5)]);
        assert_eq!(p.settled().await.unwrap(), 5);

        let empty = any::<_, i32, _>(rt, Vec::new());
        let e = empty.settled().await.unwrap_err();
        assert!(e.faults().is_empty());
    });
}

#[logfn]
pub fn test_timeout<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let slow_one = sleep(rt, Duration::from_millis(200), 1);
        let p = timeout(rt, &slow_one, Duration::from_millis(20));
        let e = p.settled().await.unwrap_err();
        assert!(matches!(e, Error::Timeout(d) if d == Duration::from_millis(20)));
        assert_elapsed_between(start, Duration::from_millis(20), Duration::from_millis(180));

        // the input is untouched by the deadline
        assert_eq!(slow_one.settled().await.unwrap(), 1);

        let p = Promise::resolve(2).timeout(rt, Duration::from_millis(200));
        assert_eq!(p.settled().await.unwrap(), 2);

        let p = Promise::<i32>::reject("early").timeout(rt, Duration::from_millis(200));
        assert_eq!(p.settled().await.unwrap_err().to_string(), "early");
    });
}

#[logfn]
pub fn test_sleep_delay<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let start = Instant::now();
        let p = sleep(rt, Duration::from_millis(30), "woke up");
        assert!(p.is_pending());
        assert_eq!(p.settled().await.unwrap(), "woke up");
        assert_elapsed_between(start, Duration::from_millis(30), Duration::from_secs(1));

        let start = Instant::now();
        delay(rt, Duration::from_millis(30)).settled().await.unwrap();
        assert_elapsed_between(start, Duration::from_millis(30), Duration::from_secs(1));
    });
}

/// Combinators nest, including blocking observation of a derived promise.
#[logfn]
pub fn test_combinator_chain<RT>(rt: &RT)
where
    RT: AsyncRuntime + std::fmt::Debug,
{
    rt.block_on(async {
        let a = Promise::new(rt, slow(Duration::from_millis(20), 1)).then(rt, |v| Ok(v * 10));
        let b = Promise::<i32>::reject("lost").catch(rt, |_| Ok(5));
        let c = race(rt, [sleep(rt, Duration::from_millis(10), 100), sleep(rt, Duration::from_millis(80), 0)]);
        let sum = all(rt, [a, b, c]).then(rt, |v| Ok(v.iter().sum::<i32>()));

        let _sum = sum.clone();
        let r = rt.spawn_blocking(move || _sum.wait()).join().await.unwrap();
        assert_eq!(r.unwrap(), 115);
        assert_eq!(sum.settled().await.unwrap(), 115);
        log::info!("chained sum {:?}", sum);
    });
}
