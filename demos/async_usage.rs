//! Async usage examples

use gompool::{CommonPool, DefaultPooledObjectFactory, MaxWait, PoolConfiguration, RecyclePool};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== gompool - Async Examples ===\n");

    // Example 1: Async get
    async_get().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;

    // Example 4: Recycle pool
    recycle_pool().await;
}

async fn async_get() {
    println!("1. Async Get:");
    let pool = CommonPool::new(DefaultPooledObjectFactory::new(|| 7u32), PoolConfiguration::default()).unwrap();

    let obj = pool.get_async().await.unwrap();
    println!("   Got object asynchronously: {}", obj);
    pool.put_async(obj).await.unwrap();

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");

    let config = PoolConfiguration::new()
        .with_max_size(1)
        .with_block_when_exhausted(true)
        .with_max_wait(MaxWait::Bounded(Duration::from_millis(100)));
    let pool = CommonPool::new(DefaultPooledObjectFactory::new(|| 42u32), config).unwrap();

    // Hold the only object
    let _obj = pool.get().unwrap();

    // Try to get another (should time out)
    match pool.get_async().await {
        Ok(_) => println!("   Got object"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let config = PoolConfiguration::new()
        .with_max_size(3)
        .with_block_when_exhausted(true);
    let pool = CommonPool::new(DefaultPooledObjectFactory::new(|| String::from("session")), config).unwrap();

    let mut handles = vec![];
    for i in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let obj = pool.get_async().await.unwrap();
            sleep(Duration::from_millis(10)).await;
            pool.put_async(obj).await.unwrap();
            i
        }));
    }

    for handle in handles {
        let task = handle.await.unwrap();
        println!("   Task {} completed", task);
    }

    let status = pool.status().unwrap();
    println!("   Live objects: {} (cap 3)\n", status.live);
}

async fn recycle_pool() {
    println!("4. Recycle Pool:");

    let pool = RecyclePool::builder(|| vec![0u8; 256])
        .min_evictable_idle_time(Duration::from_millis(50))
        .eviction_interval(Duration::from_millis(25))
        .build()
        .unwrap();

    let buf = pool.get_async().await.unwrap();
    pool.put_async(buf).await.unwrap();
    sleep(Duration::from_millis(150)).await;

    let metrics = pool.metrics();
    println!("   Created: {}, evicted: {}", metrics.total_created, metrics.total_evicted);
}
