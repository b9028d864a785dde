//! Per-request handoff between a waiting caller and the coordinator
//!
//! A `get` creates a [`Waiter`]/[`Ticket`] pair. The waiter travels to the
//! coordinator inside an `Acquire` command; the ticket stays with the caller.
//! Exactly one side wins the ticket state: the coordinator by claiming it
//! before handing an object over, or the caller by abandoning it after its
//! wait expired. Whoever loses backs off, so an object is never sent to a
//! caller that has already given up.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::errors::{PoolError, PoolResult};

const PENDING: u8 = 0;
const CLAIMED: u8 = 1;
const ABANDONED: u8 = 2;

/// Coordinator side of a pending acquire.
pub(crate) struct Waiter<T> {
    state: Arc<AtomicU8>,
    reply: Sender<PoolResult<T>>,
    blocking: bool,
}

/// Caller side of a pending acquire.
pub(crate) struct Ticket<T> {
    state: Arc<AtomicU8>,
    reply: Receiver<PoolResult<T>>,
}

pub(crate) fn pair<T>(blocking: bool) -> (Waiter<T>, Ticket<T>) {
    let state = Arc::new(AtomicU8::new(PENDING));
    let (tx, rx) = channel::bounded(1);
    (
        Waiter {
            state: Arc::clone(&state),
            reply: tx,
            blocking,
        },
        Ticket { state, reply: rx },
    )
}

impl<T> Waiter<T> {
    /// Whether the caller is willing to be parked until an object frees up.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == ABANDONED
    }

    /// Reserve the caller for a handoff. Fails if the caller gave up.
    pub fn claim(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Deliver an object to a claimed caller. Returns the object if the
    /// caller is gone.
    pub fn fulfil(self, object: T) -> Option<T> {
        debug_assert_eq!(self.state.load(Ordering::Acquire), CLAIMED);
        self.reply.send(Ok(object)).err().and_then(|err| err.into_inner().ok())
    }

    /// Answer the caller with `error` instead of an object.
    pub fn reject(self, error: PoolError) {
        let _ = self.reply.send(Err(error));
    }
}

impl<T> Ticket<T> {
    /// Wait for the coordinator's answer, up to `limit` if one is given.
    pub fn wait(self, limit: Option<Duration>) -> PoolResult<T> {
        let Some(limit) = limit else {
            return self.recv();
        };

        match self.reply.recv_timeout(limit) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::Closed),
            Err(RecvTimeoutError::Timeout) => {
                if self.abandon() {
                    Err(PoolError::Timeout(limit))
                } else {
                    // The coordinator claimed us right at the deadline and is
                    // about to send; take the object rather than strand it.
                    self.recv()
                }
            }
        }
    }

    fn recv(self) -> PoolResult<T> {
        self.reply.recv().unwrap_or(Err(PoolError::Closed))
    }

    fn abandon(&self) -> bool {
        self.state
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
