use gompool::PooledObjectFactory;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Hook call counts observed by a [`TrackingFactory`]
#[derive(Default)]
pub struct Counters {
    pub made: AtomicUsize,
    pub activated: AtomicUsize,
    pub passivated: AtomicUsize,
    pub destroyed: AtomicUsize,
}

impl Counters {
    pub fn made(&self) -> usize {
        self.made.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Factory handing out sequential ids, with a switch to fail validation
pub struct TrackingFactory {
    pub counters: Arc<Counters>,
    pub valid: Arc<AtomicBool>,
    /// Ids below this never pass validation
    pub reject_below: usize,
}

impl TrackingFactory {
    pub fn new() -> (Self, Arc<Counters>, Arc<AtomicBool>) {
        let counters = Arc::new(Counters::default());
        let valid = Arc::new(AtomicBool::new(true));
        let factory = Self {
            counters: Arc::clone(&counters),
            valid: Arc::clone(&valid),
            reject_below: 0,
        };
        (factory, counters, valid)
    }

    pub fn rejecting_first(mut self, count: usize) -> Self {
        self.reject_below = count;
        self
    }
}

impl PooledObjectFactory<usize> for TrackingFactory {
    fn make(&self) -> usize {
        self.counters.made.fetch_add(1, Ordering::SeqCst)
    }

    fn activate(&self, _object: &mut usize) {
        self.counters.activated.fetch_add(1, Ordering::SeqCst);
    }

    fn passivate(&self, _object: &mut usize) {
        self.counters.passivated.fetch_add(1, Ordering::SeqCst);
    }

    fn validate(&self, object: &usize) -> bool {
        *object >= self.reject_below && self.valid.load(Ordering::SeqCst)
    }

    fn destroy(&self, _object: usize) {
        self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}
