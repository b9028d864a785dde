//! Advanced features: lifecycle hooks, eviction, variants, Prometheus export

use gompool::{
    BaselineConfiguration, BaselinePool, CommonPool, MaxWait, Pool, PoolConfiguration,
    PooledObjectFactory, RecyclePool,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Connection {
    id: usize,
    healthy: bool,
    requests: usize,
}

#[derive(Default)]
struct ConnectionFactory {
    next_id: AtomicUsize,
}

impl PooledObjectFactory<Connection> for ConnectionFactory {
    fn make(&self) -> Connection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("   open connection {}", id);
        Connection { id, healthy: true, requests: 0 }
    }

    fn passivate(&self, conn: &mut Connection) {
        conn.requests = 0;
    }

    fn validate(&self, conn: &Connection) -> bool {
        conn.healthy
    }

    fn destroy(&self, conn: Connection) {
        println!("   close connection {}", conn.id);
    }
}

fn main() {
    println!("=== gompool - Advanced Features ===\n");

    // Example 1: Custom factory with validation
    validated_connections();

    // Example 2: Idle eviction
    eviction();

    // Example 3: Blocking handoff between threads
    blocking_handoff();

    // Example 4: Pool variants behind one trait
    variants();

    // Example 5: Prometheus metrics
    prometheus_export();
}

fn validated_connections() {
    println!("1. Validated Connections:");

    let config = PoolConfiguration::new()
        .with_max_size(2)
        .with_test_on_return(true);
    let pool = CommonPool::new(ConnectionFactory::default(), config).unwrap();

    let mut conn = pool.get().unwrap();
    conn.requests += 1;
    println!("   connection {} served {} request", conn.id, conn.requests);
    conn.healthy = false;
    println!("   put broken connection: {:?}", pool.put(conn));
    println!("   live after rejection: {}\n", pool.status().unwrap().live);
}

fn eviction() {
    println!("2. Idle Eviction:");

    let config = PoolConfiguration::new()
        .with_min_idle(1)
        .with_min_evictable_idle_time(Duration::from_millis(100))
        .with_eviction_interval(Duration::from_millis(50));
    let pool = CommonPool::new(ConnectionFactory::default(), config).unwrap();

    pool.warmup(3).unwrap();
    println!("   idle after warmup: {}", pool.status().unwrap().idle);
    thread::sleep(Duration::from_millis(300));
    println!("   idle after eviction: {}\n", pool.status().unwrap().idle);
}

fn blocking_handoff() {
    println!("3. Blocking Handoff:");

    let config = PoolConfiguration::new()
        .with_max_size(1)
        .with_block_when_exhausted(true)
        .with_max_wait(MaxWait::Bounded(Duration::from_secs(5)));
    let pool = CommonPool::new(ConnectionFactory::default(), config).unwrap();

    let conn = pool.get().unwrap();
    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || pool.get().map(|c| c.id))
    };

    thread::sleep(Duration::from_millis(50));
    println!("   waiting callers: {}", pool.status().unwrap().waiting);
    pool.put(conn).unwrap();
    println!("   waiter received connection {:?}\n", waiter.join().unwrap());
}

fn exercise(name: &str, pool: &dyn Pool<Vec<u8>>) {
    let buf = pool.get().unwrap();
    println!("   {}: got {} bytes", name, buf.len());
    pool.put(buf).unwrap();
    pool.close();
}

fn variants() {
    println!("4. Variants:");

    let recycle = RecyclePool::builder(|| vec![0u8; 64]).build().unwrap();
    let baseline = BaselinePool::new(|| vec![0u8; 32], BaselineConfiguration::default()).unwrap();

    exercise("recycle", &recycle);
    exercise("baseline", &baseline);
    println!();
}

fn prometheus_export() {
    println!("5. Prometheus Export:");

    let pool = CommonPool::new(ConnectionFactory::default(), PoolConfiguration::default()).unwrap();
    let conn = pool.get().unwrap();
    pool.put(conn).unwrap();

    let mut tags = HashMap::new();
    tags.insert("service".to_string(), "api".to_string());
    println!("{}", pool.export_metrics_prometheus("connections", Some(&tags)));
}
