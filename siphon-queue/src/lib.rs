//! A concurrent duplicate-free FIFO queue with timeout-bounded blocking pop.
//!
//! This is the synchronization core for relay-style pipelines: values arrive
//! from any number of producers, are deduplicated and queued in first-seen
//! order, and are drained by consumers that must learn (rather than block
//! forever) when no new value has appeared for longer than a configured
//! idle limit.
//!
//! # Semantics
//!
//! ```text
//! push(v):
//! ┌──────────────────────────────────────────────────────────┐
//! │ closed?        -> false (rejected, no mutation)          │
//! │ already queued -> false (duplicate dropped, no wakeup)   │
//! │ otherwise      -> enqueued, one waiter woken, true       │
//! └──────────────────────────────────────────────────────────┘
//!
//! wait_and_pop_timeout(idle_limit):
//! ┌──────────────────────────────────────────────────────────┐
//! │ value available before deadline -> Value(front)          │
//! │ deadline passes, still empty    -> Timeout               │
//! │ closed and empty at wake time   -> Closed                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A value lives in the queue at most once at a time: pushing a value that
//! is already enqueued is a silent no-op that does not move the value's
//! position. Once the value has been popped it may be pushed again.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use siphon_queue::DedupQueue;
//!
//! let queue = DedupQueue::new();
//!
//! assert!(queue.push(200));
//! assert!(queue.push(100));
//! assert!(!queue.push(200)); // duplicate, dropped
//!
//! assert_eq!(queue.try_pop(), Some(200));
//! assert_eq!(queue.try_pop(), Some(100));
//! assert_eq!(queue.try_pop(), None);
//!
//! // An empty queue reports idleness instead of blocking forever.
//! let outcome = queue.wait_and_pop_timeout(Duration::from_millis(10));
//! assert!(outcome.is_timeout());
//!
//! // close() makes shutdown well-defined for blocked consumers.
//! queue.close();
//! assert!(queue.wait_and_pop_timeout(Duration::from_secs(1)).is_closed());
//! ```
//!
//! # Sharing Across Threads
//!
//! [`DedupQueue`] is a cloneable handle; all clones observe the same queue.
//!
//! ```
//! use std::thread;
//! use siphon_queue::DedupQueue;
//!
//! let queue = DedupQueue::new();
//! let producer = queue.clone();
//!
//! let handle = thread::spawn(move || {
//!     producer.push(42);
//!     producer.close();
//! });
//!
//! handle.join().unwrap();
//! assert_eq!(queue.try_pop(), Some(42));
//! ```
//!
//! # Guarantees
//!
//! - **Uniqueness**: at any instant the queue contains no duplicates; every
//!   distinct value pushed before [`close`](DedupQueue::close) is observable
//!   exactly once.
//! - **FIFO among distinct values**: pushing `a, b, a, c` pops `a, b, c`.
//! - **No lost wakeups**: a consumer blocked in
//!   [`wait_and_pop_timeout`](DedupQueue::wait_and_pop_timeout) observes any
//!   push that completes before its deadline. The emptiness check and the
//!   suspension are atomic under the queue's monitor.
//! - **Monotonic deadline**: the timeout is anchored to a monotonic clock at
//!   call entry, so wall-clock adjustments can neither shorten nor extend
//!   the effective wait, and spurious wakeups never reset it.
//! - **Linearizability**: every operation takes effect atomically at some
//!   point between invocation and return, under a single internal lock.
//!
//! # When to Use This
//!
//! Use `siphon_queue` when:
//! - Producers may re-offer values the consumer has not drained yet and you
//!   want exactly one copy in flight
//! - Consumers must react to *absence* of data (emit a heartbeat, a
//!   sentinel, a staleness marker) rather than block indefinitely
//! - You need a well-defined shutdown: close, drain, terminate
//!
//! Consider alternatives when:
//! - Duplicates are fine → `std::sync::mpsc` or `crossbeam-channel`
//! - You need bounded capacity with producer backpressure → a bounded
//!   channel; this queue grows without limit by design
//! - Only the latest value matters → a conflating slot

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Queue contents, guarded as a single unit.
///
/// `present` is always exactly the set of values in `queue`; every mutation
/// of one side under the lock also updates the other.
struct State<T> {
    queue: VecDeque<T>,
    present: HashSet<T>,
    closed: bool,
}

impl<T: Eq + Hash> State<T> {
    /// Removes and returns the front value, keeping `present` in sync.
    fn pop_front(&mut self) -> Option<T> {
        let value = self.queue.pop_front()?;
        self.present.remove(&value);
        Some(value)
    }
}

struct Shared<T> {
    state: Mutex<State<T>>,
    /// Signaled on push (one waiter) and close (all waiters).
    available: Condvar,
}

/// A concurrent FIFO queue that holds each value at most once and supports
/// blocking consumption with an idle timeout.
///
/// Cloning the handle is cheap and produces another view of the same queue,
/// so producers and consumers on different threads can share it freely. Any
/// number of producers and consumers is supported.
///
/// See the [crate-level documentation](crate) for semantics and examples.
pub struct DedupQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> DedupQueue<T> {
    /// Creates an empty, open queue.
    ///
    /// # Example
    ///
    /// ```
    /// use siphon_queue::DedupQueue;
    ///
    /// let queue = DedupQueue::<String>::new();
    /// assert!(queue.is_empty());
    /// assert!(!queue.is_closed());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    present: HashSet::new(),
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    /// Returns `true` if the queue currently holds no values.
    ///
    /// Advisory only: another thread may push or pop between this snapshot
    /// and whatever the caller does with it.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().unwrap().queue.is_empty()
    }

    /// Returns the number of values currently queued.
    ///
    /// Advisory only, same caveat as [`is_empty`](Self::is_empty).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().queue.len()
    }

    /// Returns `true` if [`close`](Self::close) has been called.
    ///
    /// A closed queue rejects new values but remains drainable.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().unwrap().closed
    }

    /// Closes the queue and wakes every blocked consumer.
    ///
    /// After closing, [`push`](Self::push) is rejected, but values already
    /// queued remain poppable in order. Blocked consumers wake and either
    /// drain a remaining value or observe [`PopOutcome::Closed`]. Calling
    /// `close` again is a no-op.
    ///
    /// # Example
    ///
    /// ```
    /// use siphon_queue::DedupQueue;
    ///
    /// let queue = DedupQueue::new();
    /// queue.push(1);
    /// queue.close();
    ///
    /// assert!(!queue.push(2));          // rejected
    /// assert_eq!(queue.try_pop(), Some(1)); // still drainable
    /// ```
    pub fn close(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.closed = true;
        drop(state);
        // Broadcast: every waiter must re-evaluate, not just one.
        self.shared.available.notify_all();
    }
}

impl<T: Eq + Hash + Clone> DedupQueue<T> {
    /// Enqueues `value` unless it is already queued or the queue is closed.
    ///
    /// Returns `true` if the value was enqueued, waking one blocked
    /// consumer. Returns `false` if the value was dropped, either because
    /// an equal value is already in the queue (the earlier copy keeps its
    /// position) or because the queue is closed. A rejected push mutates
    /// nothing and wakes nobody.
    ///
    /// Callers need not retry on `false`: the value is either already
    /// represented or the pipe is shutting down.
    pub fn push(&self, value: T) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.closed || state.present.contains(&value) {
            return false;
        }
        state.present.insert(value.clone());
        state.queue.push_back(value);
        drop(state);
        self.shared.available.notify_one();
        true
    }

    /// Removes and returns the front value without blocking.
    ///
    /// Returns `None` when the queue is empty. Emptiness is not an error
    /// here; callers polling after [`close`](Self::close) use `None` as the
    /// drained-dry signal.
    #[must_use]
    pub fn try_pop(&self) -> Option<T> {
        self.shared.state.lock().unwrap().pop_front()
    }

    /// Blocks until a value is available, the queue closes, or `idle_limit`
    /// elapses, whichever happens first.
    ///
    /// The deadline is `Instant::now() + idle_limit`, fixed at entry against
    /// the monotonic clock. Every wakeup (including spurious ones) re-checks
    /// the queue and recomputes the remaining wait from that deadline, so
    /// the call never times out early and never overshoots by more than
    /// scheduling jitter.
    ///
    /// Outcomes:
    /// - [`PopOutcome::Value`]: the front value, removed from the queue
    /// - [`PopOutcome::Timeout`]: the deadline passed with the queue still
    ///   empty; nothing was mutated, the caller retries with a fresh limit
    ///   if it wants to keep waiting
    /// - [`PopOutcome::Closed`]: the queue is closed and empty; no further
    ///   value will ever arrive
    ///
    /// # Example
    ///
    /// ```
    /// use std::thread;
    /// use std::time::Duration;
    /// use siphon_queue::{DedupQueue, PopOutcome};
    ///
    /// let queue = DedupQueue::new();
    /// let producer = queue.clone();
    ///
    /// thread::spawn(move || {
    ///     producer.push(7);
    /// });
    ///
    /// match queue.wait_and_pop_timeout(Duration::from_secs(1)) {
    ///     PopOutcome::Value(v) => assert_eq!(v, 7),
    ///     other => panic!("expected a value, got {other:?}"),
    /// }
    /// ```
    pub fn wait_and_pop_timeout(&self, idle_limit: Duration) -> PopOutcome<T> {
        let deadline = Instant::now() + idle_limit;
        let mut state = self.shared.state.lock().unwrap();
        loop {
            if let Some(value) = state.pop_front() {
                return PopOutcome::Value(value);
            }
            if state.closed {
                return PopOutcome::Closed;
            }
            let now = Instant::now();
            if now >= deadline {
                return PopOutcome::Timeout;
            }
            // The condvar releases the lock while suspended and re-acquires
            // it on wake, so no push can slip between the emptiness check
            // above and the wait. The timed_out flag from wait_timeout is
            // ignored on purpose: the deadline re-check above is the single
            // source of truth, which also makes spurious wakeups harmless.
            let (guard, _) = self
                .shared
                .available
                .wait_timeout(state, deadline - now)
                .unwrap();
            state = guard;
        }
    }
}

impl<T> Clone for DedupQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for DedupQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DedupQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock().unwrap();
        f.debug_struct("DedupQueue")
            .field("len", &state.queue.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

/// Result of [`DedupQueue::wait_and_pop_timeout`].
///
/// `Timeout` and `Closed` are expected, recurring outcomes (the mechanism
/// by which a consumer learns about idleness and shutdown), not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome<T> {
    /// The front value, removed from the queue.
    Value(T),
    /// The idle limit elapsed with the queue still empty. Nothing was
    /// removed; retry with a fresh limit to keep waiting.
    Timeout,
    /// The queue is closed and empty. No further value will ever arrive.
    Closed,
}

impl<T> PopOutcome<T> {
    /// Returns the popped value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Timeout | Self::Closed => None,
        }
    }

    /// Returns `true` if this outcome carries a value.
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns `true` if this outcome is the `Timeout` variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this outcome is the `Closed` variant.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl<T> fmt::Display for PopOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => write!(f, "popped a value"),
            Self::Timeout => write!(f, "timed out waiting for a value"),
            Self::Closed => write!(f, "queue closed"),
        }
    }
}
