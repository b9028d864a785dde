//! Basic usage examples for CommonPool

use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration, PoolError};

fn main() {
    println!("=== gompool - Basic Examples ===\n");

    // Example 1: Get and put
    simple_pool();

    // Example 2: Pool with configuration
    configured_pool();

    // Example 3: Try methods and exhaustion
    try_methods();

    // Example 4: Metrics and health
    metrics_and_health();
}

fn buffer_factory() -> DefaultPooledObjectFactory<Vec<u8>> {
    DefaultPooledObjectFactory::new(|| Vec::with_capacity(1024)).on_passivate(|buf| buf.clear())
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = CommonPool::new(buffer_factory(), PoolConfiguration::default()).unwrap();

    let mut buf = pool.get().unwrap();
    buf.extend_from_slice(b"payload");
    println!("   Got buffer holding {} bytes", buf.len());
    pool.put(buf).unwrap();

    {
        let buf = pool.checkout().unwrap();
        println!("   Guarded buffer is cleared: {}", buf.is_empty());
        // Buffer automatically returned when dropped
    }

    println!("   Idle after return: {}\n", pool.status().unwrap().idle);
}

fn configured_pool() {
    println!("2. Configured Pool:");

    let config = PoolConfiguration::new()
        .with_max_size(5)
        .with_min_idle(2)
        .with_test_on_return(true);
    let factory = buffer_factory().on_validate(|buf| buf.capacity() >= 1024);
    let pool = CommonPool::new(factory, config).unwrap();

    println!("   Warmed up: {}", pool.warmup(3).unwrap());
    {
        let _buf1 = pool.checkout().unwrap();
        let _buf2 = pool.checkout().unwrap();
        let status = pool.status().unwrap();
        println!("   Live: {}, checked out: {}", status.live, status.outstanding());
    }

    println!("   After return - Idle: {}\n", pool.status().unwrap().idle);
}

fn try_methods() {
    println!("3. Try Methods:");
    let config = PoolConfiguration::new().with_max_size(1);
    let pool = CommonPool::new(DefaultPooledObjectFactory::new(|| 42), config).unwrap();

    let obj1 = pool.try_get();
    assert!(obj1.is_some());
    println!("   First try: Success");

    match pool.get() {
        Err(PoolError::Exhausted) => println!("   Second try: exhausted"),
        other => println!("   Second try: {:?}", other),
    }

    if let Some(obj) = obj1 {
        pool.put(obj).unwrap();
    }

    let obj3 = pool.try_get();
    assert!(obj3.is_some());
    println!("   Third try: Success\n");
}

fn metrics_and_health() {
    println!("4. Metrics and Health:");
    let pool = CommonPool::new(buffer_factory(), PoolConfiguration::new().with_max_size(2)).unwrap();

    {
        let _buf1 = pool.checkout().unwrap();
        let _buf2 = pool.checkout().unwrap();

        let status = pool.status().unwrap();
        let health = pool.health();
        println!("   Health: {}", if health.is_healthy { "Healthy" } else { "Unhealthy" });
        println!("   Live: {}, Idle: {}", status.live, status.idle);
        for warning in &health.warnings {
            println!("   Warning: {}", warning);
        }
    }

    let metrics = pool.export_metrics();
    println!("\n   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
}
