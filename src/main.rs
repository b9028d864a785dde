// gompool demo binary
// The library lives in lib.rs; run the demos with: cargo run --example basic

use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration};

fn main() {
    println!("=== gompool ===");
    println!("See demos/ for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    println!("Quick Demo:");
    let factory = DefaultPooledObjectFactory::new(|| vec![0u8; 4096]);
    let pool = match CommonPool::new(factory, PoolConfiguration::new().with_max_size(4)) {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("  Failed to start pool: {}", err);
            return;
        }
    };

    {
        match pool.checkout() {
            Ok(buf) => println!("  Got a buffer of {} bytes", buf.len()),
            Err(err) => println!("  No buffer: {}", err),
        }
    }

    if let Ok(status) = pool.status() {
        println!("  Live: {}, idle after return: {}", status.live, status.idle);
    }
    pool.close();
}
