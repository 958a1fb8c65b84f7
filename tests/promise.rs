use pledge::{CancelToken, Error, Promise, SettleRecord, State};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_literal_promises() {
    let ok = Promise::resolve(5);
    assert_eq!(ok.state(), State::Fulfilled);
    assert_eq!(ok.wait().unwrap(), 5);
    assert_eq!(ok.wait().unwrap(), 5);

    let bad = Promise::<i32>::reject("e1");
    assert_eq!(bad.state(), State::Rejected);
    assert!(bad.is_rejected() && !bad.is_pending() && !bad.is_fulfilled());
    assert_eq!(bad.wait().unwrap_err().to_string(), "e1");
    assert_eq!(format!("{:?}", bad), "Promise(Rejected)");
}

#[test]
fn test_settle_once() {
    let (p, resolver) = Promise::pending();
    assert!(p.is_pending());
    assert!(resolver.resolve(1));
    assert!(!resolver.resolve(2));
    assert!(!resolver.reject("too late"));
    assert!(!resolver.settle(Ok(3)));
    for _ in 0..3 {
        assert_eq!(p.wait().unwrap(), 1);
    }
    drop(resolver);
    assert_eq!(p.wait().unwrap(), 1);

    let (p, resolver) = Promise::<i32>::pending();
    assert!(resolver.reject("first"));
    assert!(!resolver.resolve(2));
    assert_eq!(p.wait().unwrap_err().to_string(), "first");
}

#[test]
fn test_settle_once_concurrent() {
    let (p, resolver) = Promise::pending();
    let resolver = Arc::new(resolver);
    let accepted = Arc::new(AtomicUsize::new(0));
    let mut threads = Vec::new();
    for i in 0..8usize {
        let resolver = resolver.clone();
        let accepted = accepted.clone();
        threads.push(thread::spawn(move || {
            if resolver.resolve(i) {
                accepted.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    let winner = p.wait().unwrap();
    assert!(winner < 8);
    assert_eq!(p.try_get().unwrap().unwrap(), winner);
}

#[test]
fn test_abandoned_resolver() {
    let (p, resolver) = Promise::<String>::pending();
    let observer = {
        let p = p.clone();
        thread::spawn(move || p.wait())
    };
    thread::sleep(Duration::from_millis(20));
    drop(resolver);
    assert!(matches!(observer.join().unwrap(), Err(Error::Abandoned)));
    assert!(p.is_rejected());
}

#[test]
fn test_blocking_observers() {
    let (p, resolver) = Promise::pending();
    let mut observers = Vec::new();
    for _ in 0..10 {
        let p = p.clone();
        observers.push(thread::spawn(move || p.wait()));
    }
    thread::sleep(Duration::from_millis(20));
    resolver.resolve(vec![1, 2, 3]);
    for o in observers {
        assert_eq!(o.join().unwrap().unwrap(), vec![1, 2, 3]);
    }
}

#[test]
fn test_wait_timeout_without_runtime() {
    let (p, resolver) = Promise::pending();
    let start = Instant::now();
    let e = p.wait_timeout(Duration::from_millis(20)).unwrap_err();
    assert!(e.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert!(p.is_pending());

    let setter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        resolver.resolve("late");
    });
    assert_eq!(p.wait_timeout(Duration::from_secs(5)).unwrap(), "late");
    setter.join().unwrap();
}

#[test]
fn test_wait_timeout_unbounded() {
    let (p, resolver) = Promise::<i32>::pending();
    let setter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        resolver.resolve(1);
    });
    assert_eq!(p.wait_timeout(Duration::MAX).unwrap(), 1);
    setter.join().unwrap();
    // already settled
    assert_eq!(p.wait_timeout(Duration::MAX).unwrap(), 1);
    assert_eq!(Promise::<i32>::reject("e3").wait_timeout(Duration::MAX).unwrap_err().to_string(), "e3");
}

#[test]
fn test_wait_cancel_without_runtime() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());
    assert!(token.reason().is_none());

    // settled promise wins over a cancelled token
    token.cancel("stop");
    assert_eq!(Promise::resolve(1).wait_cancel(&token).unwrap(), 1);

    let (p, _resolver) = Promise::<i32>::pending();
    let e = p.wait_cancel(&token).unwrap_err();
    assert_eq!(e.to_string(), "promise cancelled: stop");
    assert!(p.is_pending());
    assert_eq!(format!("{:?}", token), "CancelToken(cancelled: stop)");
}

#[test]
fn test_settle_record() {
    let ok: SettleRecord<i32> = Ok(1).into();
    assert_eq!(ok.status(), State::Fulfilled);
    assert_eq!(ok.value(), Some(&1));
    assert!(ok.fault().is_none());

    let bad: SettleRecord<i32> = Err(Error::from("e2")).into();
    assert_eq!(bad.status(), State::Rejected);
    assert!(bad.value().is_none());
    assert_eq!(bad.fault().unwrap().to_string(), "e2");
}

#[test]
fn test_error_display() {
    assert_eq!(Error::Panic("boom".to_string()).to_string(), "panic: boom");
    assert_eq!(
        Error::Timeout(Duration::from_millis(10)).to_string(),
        "promise timeout after 10ms"
    );
    assert_eq!(Error::Cancelled("bye".to_string()).to_string(), "promise cancelled: bye");
    assert_eq!(Error::Abandoned.to_string(), "promise abandoned before settling");

    let agg = Error::Aggregate(vec!["e1".into(), Error::Timeout(Duration::from_secs(1))]);
    assert_eq!(agg.to_string(), "all promises rejected: [e1, promise timeout after 1s]");
    assert_eq!(agg.faults().len(), 2);
    assert_eq!(Error::Abandoned.faults().len(), 1);

    let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert_eq!(io.to_string(), "missing");
    assert!(!io.is_timeout() && !io.is_cancelled() && !io.is_panic());

    assert_eq!(State::Pending.to_string(), "Pending");
    assert_eq!(State::Fulfilled.to_string(), "Fulfilled");
    assert_eq!(State::Rejected.to_string(), "Rejected");
}
