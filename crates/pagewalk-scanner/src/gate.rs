//! Counting permit pool bounding simultaneous page fetches.
//!
//! The gate grants at most `max_concurrency` permits at a time. Further
//! acquirers are queued and served strictly first-come-first-served as
//! permits are released. A limit of 0 disables the gate entirely: every
//! acquire resolves immediately and releasing is a no-op.
//!
//! The waiting queue is unbounded.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Process-wide limiter for in-flight page fetches.
#[derive(Debug)]
pub struct ConcurrencyGate {
    state: Mutex<GateState>,
}

#[derive(Debug)]
struct GateState {
    max_concurrency: usize,
    outstanding: usize,
    next_waiter: u64,
    waiters: VecDeque<Waiter>,
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    grant: oneshot::Sender<()>,
}

impl ConcurrencyGate {
    /// Create a gate allowing `max_concurrency` permits (0 = disabled).
    #[must_use]
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            state: Mutex::new(GateState {
                max_concurrency,
                outstanding: 0,
                next_waiter: 0,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Create a gate that never limits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Current permit limit.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.lock().max_concurrency
    }

    /// Change the permit limit.
    ///
    /// Raising the limit does not wake already queued acquirers; they are
    /// served by the next release. Setting 0 disables the gate for new
    /// acquirers.
    pub fn set_max_concurrency(&self, max_concurrency: usize) {
        let mut state = self.lock();
        if state.max_concurrency != max_concurrency {
            tracing::debug!(
                from = state.max_concurrency,
                to = max_concurrency,
                "changing concurrency limit"
            );
            state.max_concurrency = max_concurrency;
        }
    }

    /// Whether acquires are being limited.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max_concurrency() > 0
    }

    /// Number of counted permits currently held.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    /// Number of acquirers waiting for a permit.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Wait for a permit.
    ///
    /// The returned permit is released when dropped. Dropping this future
    /// while it is queued removes it from the queue without losing a slot.
    pub async fn acquire(self: &Arc<Self>) -> GatePermit {
        let pending = {
            let mut state = self.lock();
            if state.max_concurrency == 0 {
                return GatePermit { gate: None };
            }
            if state.outstanding < state.max_concurrency {
                state.outstanding += 1;
                return GatePermit {
                    gate: Some(Arc::clone(self)),
                };
            }

            let id = state.next_waiter;
            state.next_waiter = state.next_waiter.wrapping_add(1);
            let (grant, granted) = oneshot::channel();
            state.waiters.push_back(Waiter { id, grant });
            PendingAcquire {
                gate: Arc::clone(self),
                id,
                granted,
                done: false,
            }
        };

        pending.wait().await
    }

    /// Hand the slot of a finished permit to the oldest live waiter, or free it.
    fn release(&self) {
        let mut state = self.lock();
        Self::release_locked(&mut state);
    }

    fn release_locked(state: &mut GateState) {
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.grant.send(()).is_ok() {
                return;
            }
        }
        state.outstanding = state.outstanding.saturating_sub(1);
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock is still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A queued acquire. Cleans up after itself if dropped before completion.
struct PendingAcquire {
    gate: Arc<ConcurrencyGate>,
    id: u64,
    granted: oneshot::Receiver<()>,
    done: bool,
}

impl PendingAcquire {
    async fn wait(mut self) -> GatePermit {
        let outcome = (&mut self.granted).await;
        self.done = true;
        match outcome {
            Ok(()) => GatePermit {
                gate: Some(Arc::clone(&self.gate)),
            },
            // The sender is only dropped unsent when the waiter is discarded,
            // which cannot happen while we are alive. Proceed uncounted.
            Err(_) => GatePermit { gate: None },
        }
    }
}

impl Drop for PendingAcquire {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = self.gate.lock();
        if let Some(index) = state.waiters.iter().position(|w| w.id == self.id) {
            state.waiters.remove(index);
        } else if self.granted.try_recv().is_ok() {
            // A release handed us the slot just before we were dropped.
            ConcurrencyGate::release_locked(&mut state);
        }
    }
}

/// One in-flight fetch slot. Released on drop.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct GatePermit {
    gate: Option<Arc<ConcurrencyGate>>,
}

impl GatePermit {
    /// Whether this permit counts against the gate's limit.
    #[must_use]
    pub fn is_counted(&self) -> bool {
        self.gate.is_some()
    }

    /// Release the permit now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        if let Some(gate) = self.gate.take() {
            gate.release();
        }
    }
}
