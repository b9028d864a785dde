mod common;

use common::TrackingFactory;
use gompool::{CommonPool, MaxWait, PoolConfiguration, PoolError};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

fn blocking(max_size: usize, max_wait: MaxWait) -> PoolConfiguration {
    PoolConfiguration::new()
        .with_max_size(max_size)
        .with_block_when_exhausted(true)
        .with_max_wait(max_wait)
}

#[test]
fn round_trip_on_single_slot_pool_makes_once() {
    let (factory, counters, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, PoolConfiguration::new().with_max_size(1)).unwrap();

    for _ in 0..50 {
        let obj = pool.get().unwrap();
        assert_eq!(obj, 0);
        pool.put(obj).unwrap();
    }

    pool.status().unwrap();
    assert_eq!(counters.made(), 1);
    assert_eq!(counters.destroyed(), 0);
    assert_eq!(counters.activated.load(Ordering::SeqCst), 50);
    assert_eq!(counters.passivated.load(Ordering::SeqCst), 50);
}

#[test]
fn non_blocking_get_on_exhausted_pool_returns_at_once() {
    let (factory, _, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, PoolConfiguration::new().with_max_size(1)).unwrap();
    let _held = pool.get().unwrap();

    let started = Instant::now();
    assert_eq!(pool.get(), Err(PoolError::Exhausted));
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(pool.metrics().exhausted_events, 1);
}

#[test]
fn no_wait_policy_never_blocks() {
    let (factory, _, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, blocking(1, MaxWait::NoWait)).unwrap();
    let _held = pool.get().unwrap();

    assert_eq!(pool.get(), Err(PoolError::Exhausted));
}

#[test]
fn stale_idle_object_is_evicted_once() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = PoolConfiguration::new()
        .with_min_idle(0)
        .with_min_evictable_idle_time(Duration::from_millis(30))
        .with_eviction_interval(Duration::from_millis(20));
    let pool = CommonPool::new(factory, config).unwrap();

    let obj = pool.get().unwrap();
    pool.put(obj).unwrap();
    thread::sleep(Duration::from_millis(250));

    let status = pool.status().unwrap();
    assert_eq!(status.live, 0);
    assert_eq!(status.idle, 0);
    assert_eq!(counters.destroyed(), 1);
    assert_eq!(pool.metrics().total_evicted, 1);
}

#[test]
fn eviction_stops_at_min_idle() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = PoolConfiguration::new()
        .with_min_idle(2)
        .with_min_evictable_idle_time(Duration::from_millis(20))
        .with_eviction_interval(Duration::from_millis(20));
    let pool = CommonPool::new(factory, config).unwrap();

    assert_eq!(pool.warmup(5).unwrap(), 5);
    thread::sleep(Duration::from_millis(250));

    let status = pool.status().unwrap();
    assert_eq!(status.idle, 2);
    assert_eq!(status.live, 2);
    assert_eq!(counters.destroyed(), 3);
}

#[test]
fn zero_interval_disables_eviction() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = PoolConfiguration::new()
        .with_min_idle(0)
        .with_min_evictable_idle_time(Duration::from_millis(1))
        .with_eviction_interval(Duration::ZERO);
    let pool = CommonPool::new(factory, config).unwrap();

    pool.warmup(2).unwrap();
    thread::sleep(Duration::from_millis(50));

    assert_eq!(pool.status().unwrap().idle, 2);
    assert_eq!(counters.destroyed(), 0);
}

#[test]
fn third_get_waits_for_a_returned_object() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = blocking(2, MaxWait::Bounded(Duration::from_secs(10))).with_min_idle(1);
    let pool = CommonPool::new(factory, config).unwrap();

    let first = pool.get().unwrap();
    let second = pool.get().unwrap();
    assert_eq!(counters.made(), 2);

    let third = {
        let pool = pool.clone();
        thread::spawn(move || pool.get())
    };
    thread::sleep(Duration::from_millis(100));
    assert!(!third.is_finished());
    assert_eq!(pool.status().unwrap().waiting, 1);

    pool.put(first).unwrap();
    assert_eq!(third.join().unwrap(), Ok(first));
    assert_eq!(counters.made(), 2);
    assert_eq!(pool.status().unwrap().live, 2);
    pool.put(second).unwrap();
}

#[test]
fn failed_return_validation_destroys_object() {
    let (factory, counters, valid) = TrackingFactory::new();
    let config = PoolConfiguration::new().with_test_on_return(true);
    let pool = CommonPool::new(factory, config).unwrap();

    let obj = pool.get().unwrap();
    valid.store(false, Ordering::SeqCst);
    assert_eq!(pool.put(obj), Err(PoolError::ValidationFailed));

    let status = pool.status().unwrap();
    assert_eq!(status.live, 0);
    assert_eq!(status.idle, 0);
    assert_eq!(counters.destroyed(), 1);

    valid.store(true, Ordering::SeqCst);
    assert_eq!(pool.get(), Ok(1));
}

#[test]
fn failed_borrow_validation_destroys_object() {
    let (factory, counters, valid) = TrackingFactory::new();
    let config = PoolConfiguration::new().with_test_on_borrow(true);
    let pool = CommonPool::new(factory, config).unwrap();

    pool.warmup(1).unwrap();
    valid.store(false, Ordering::SeqCst);
    assert_eq!(pool.get(), Err(PoolError::ValidationFailed));

    assert_eq!(pool.status().unwrap().live, 0);
    assert_eq!(counters.destroyed(), 1);
    assert_eq!(pool.metrics().validation_failures, 1);
}

#[test]
fn failed_idle_validation_destroys_object() {
    let (factory, counters, valid) = TrackingFactory::new();
    let config = PoolConfiguration::new().with_test_while_idle(true);
    let pool = CommonPool::new(factory, config).unwrap();

    let obj = pool.get().unwrap();
    valid.store(false, Ordering::SeqCst);
    pool.put(obj).unwrap();

    let status = pool.status().unwrap();
    assert_eq!(status.live, 0);
    assert_eq!(status.idle, 0);
    assert_eq!(counters.destroyed(), 1);
    assert_eq!(counters.passivated.load(Ordering::SeqCst), 0);
}

#[test]
fn rejected_creation_is_retried_while_a_slot_is_free() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = PoolConfiguration::new().with_max_size(1).with_test_on_create(true);
    let pool = CommonPool::new(factory.rejecting_first(1), config).unwrap();

    assert_eq!(pool.get(), Ok(1));
    assert_eq!(counters.made(), 2);
    assert_eq!(counters.destroyed(), 1);
    assert_eq!(pool.status().unwrap().live, 1);
}

#[test]
fn blocked_get_is_served_after_rejected_creation() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = blocking(1, MaxWait::Bounded(Duration::from_millis(500))).with_test_on_create(true);
    let pool = CommonPool::new(factory.rejecting_first(1), config).unwrap();

    let started = Instant::now();
    assert_eq!(pool.get(), Ok(1));
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(counters.made(), 2);
    assert_eq!(pool.metrics().timeouts, 0);
}

#[test]
fn creation_that_keeps_failing_reports_validation_failure() {
    let (factory, counters, valid) = TrackingFactory::new();
    let config = blocking(2, MaxWait::Indefinite).with_test_on_create(true);
    let pool = CommonPool::new(factory, config).unwrap();
    valid.store(false, Ordering::SeqCst);

    assert_eq!(pool.get(), Err(PoolError::ValidationFailed));
    assert_eq!(pool.warmup(2), Ok(0));

    let status = pool.status().unwrap();
    assert_eq!(status.live, 0);
    assert_eq!(status.waiting, 0);
    assert_eq!(counters.made(), counters.destroyed());
    assert_eq!(pool.metrics().exhausted_events, 0);

    valid.store(true, Ordering::SeqCst);
    assert!(pool.get().is_ok());
}

#[test]
fn warmup_replaces_rejected_objects() {
    let (factory, counters, _) = TrackingFactory::new();
    let config = PoolConfiguration::new().with_test_on_create(true);
    let pool = CommonPool::new(factory.rejecting_first(2), config).unwrap();

    assert_eq!(pool.warmup(3), Ok(3));
    assert_eq!(pool.status().unwrap().idle, 3);
    assert_eq!(counters.made(), 5);
    assert_eq!(counters.destroyed(), 2);
}

#[test]
fn timed_out_get_leaves_object_for_next_caller() {
    let (factory, counters, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, blocking(1, MaxWait::Bounded(Duration::from_millis(50)))).unwrap();

    let held = pool.get().unwrap();
    assert_eq!(pool.get(), Err(PoolError::Timeout(Duration::from_millis(50))));

    pool.put(held).unwrap();
    assert_eq!(pool.get(), Ok(held));
    assert_eq!(counters.made(), 1);
    assert_eq!(pool.status().unwrap().waiting, 0);
}

#[test]
fn close_wakes_parked_callers() {
    let (factory, _, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, blocking(1, MaxWait::Indefinite)).unwrap();
    let _held = pool.get().unwrap();

    let parked = {
        let pool = pool.clone();
        thread::spawn(move || pool.get())
    };
    thread::sleep(Duration::from_millis(50));
    pool.close();

    assert_eq!(parked.join().unwrap(), Err(PoolError::Closed));
}

#[test]
fn close_destroys_idle_and_late_returns() {
    let (factory, counters, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, PoolConfiguration::default()).unwrap();

    pool.warmup(3).unwrap();
    let borrowed = pool.get().unwrap();
    pool.close();
    assert_eq!(counters.destroyed(), 2);

    assert_eq!(pool.put(borrowed), Err(PoolError::Closed));
    assert_eq!(counters.destroyed(), 3);
    assert_eq!(pool.get(), Err(PoolError::Closed));
}

#[test]
fn returns_racing_close_are_all_destroyed() {
    for _ in 0..20 {
        let (factory, counters, _) = TrackingFactory::new();
        let pool = CommonPool::new(factory, PoolConfiguration::new().with_max_size(16)).unwrap();
        let borrowed: Vec<_> = (0..16).map(|_| pool.get().unwrap()).collect();

        let returners: Vec<_> = borrowed
            .into_iter()
            .map(|obj| {
                let pool = pool.clone();
                thread::spawn(move || {
                    let _ = pool.put(obj);
                })
            })
            .collect();
        pool.close();

        for returner in returners {
            returner.join().unwrap();
        }
        assert_eq!(counters.destroyed(), 16);
    }
}

#[test]
fn live_count_stays_within_bounds_under_contention() {
    let (factory, counters, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, blocking(4, MaxWait::Indefinite)).unwrap();

    let workers: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let obj = pool.get().unwrap();
                    let status = pool.metrics();
                    assert!(status.live_objects <= 4);
                    pool.put(obj).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let status = pool.status().unwrap();
    assert!(counters.made() <= 4);
    assert_eq!(status.live, counters.made());
    assert_eq!(status.idle, status.live);
}

#[test]
fn dropping_last_handle_closes_pool() {
    let (factory, counters, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, PoolConfiguration::default()).unwrap();
    pool.warmup(2).unwrap();

    drop(pool);

    assert_eq!(counters.destroyed(), 2);
}

#[test]
fn zero_max_size_is_rejected() {
    let (factory, _, _) = TrackingFactory::new();
    let result = CommonPool::new(factory, PoolConfiguration::new().with_max_size(0));

    assert!(matches!(result, Err(PoolError::InvalidConfiguration(_))));
}

#[test]
fn builder_requires_a_factory() {
    let missing = CommonPool::<usize>::builder().build();
    assert!(matches!(missing, Err(PoolError::MissingFactory)));

    let (factory, _, _) = TrackingFactory::new();
    let pool = CommonPool::builder()
        .factory(factory)
        .config(PoolConfiguration::new().with_max_size(2))
        .build()
        .unwrap();
    assert_eq!(pool.config().max_size, 2);
}

#[tokio::test]
async fn async_waiters_are_served_in_turn() {
    let (factory, counters, _) = TrackingFactory::new();
    let pool = CommonPool::new(factory, blocking(2, MaxWait::Indefinite)).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let obj = pool.get_async().await?;
                tokio::time::sleep(Duration::from_millis(5)).await;
                pool.put_async(obj).await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Ok(()));
    }
    assert!(counters.made() <= 2);
}
