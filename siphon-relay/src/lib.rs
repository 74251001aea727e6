//! Channel-to-channel relay with an idle-timeout sentinel.
//!
//! This crate wraps [`siphon_queue`]'s dedup queue with the forwarding loop
//! it was built for: values are pumped from a source into the queue, and a
//! consumer drains them to a downstream sink. When no value arrives for
//! longer than the configured idle limit, the consumer writes an
//! [`Event::Idle`] sentinel downstream instead of blocking forever.
//!
//! ```text
//! source ──> pump ──> DedupQueue ──> forward ──> sink
//!                                       │
//!                         idle > limit ─┴─> Event::Idle ("timeout")
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use siphon_queue::DedupQueue;
//! use siphon_relay::{forward, pump, Event, RelayConfig};
//!
//! let queue = DedupQueue::new();
//!
//! // 100 and the duplicate 200 are dropped by the queue.
//! let accepted = pump(vec![200, 100, 200], &queue);
//! assert_eq!(accepted, 2);
//! queue.close();
//!
//! let mut out = Vec::new();
//! forward(&queue, &RelayConfig::default(), |event| out.push(event));
//!
//! assert_eq!(out, vec![Event::Data(200), Event::Data(100)]);
//! ```
//!
//! # Shutdown
//!
//! The owner of the queue calls [`DedupQueue::close`] exactly once when no
//! further values will be produced. [`forward`] then drains whatever is
//! still queued and returns; [`pump`] stops early when it notices the
//! close.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::fmt;
use std::hash::Hash;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, trace, warn};
use siphon_queue::{DedupQueue, PopOutcome};

/// Default idle limit: the originating requirement's 3000 ms.
pub const DEFAULT_IDLE_LIMIT: Duration = Duration::from_millis(3000);

/// What the relay writes downstream: a forwarded value or the idle marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<T> {
    /// A value drained from the queue, in FIFO order.
    Data(T),
    /// No value arrived within the idle limit.
    Idle,
}

impl<T> Event<T> {
    /// Returns the forwarded value, if any.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            Self::Idle => None,
        }
    }

    /// Returns `true` if this event is the idle sentinel.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl<T: fmt::Display> fmt::Display for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => value.fmt(f),
            Self::Idle => write!(f, "timeout"),
        }
    }
}

/// Tuning for the consuming side of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Maximum time [`forward`] waits for a value before emitting
    /// [`Event::Idle`]. Each wait gets a fresh deadline.
    pub idle_limit: Duration,
}

impl RelayConfig {
    /// Config with the given idle limit.
    #[must_use]
    pub fn with_idle_limit(idle_limit: Duration) -> Self {
        Self { idle_limit }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            idle_limit: DEFAULT_IDLE_LIMIT,
        }
    }
}

/// Drains the queue into `sink` until the queue is closed and empty.
///
/// Each drained value is delivered as [`Event::Data`], in queue order.
/// Whenever `config.idle_limit` passes without a value, one [`Event::Idle`]
/// is delivered and the wait starts over with a fresh deadline. When the
/// queue reports closed, any remaining values are drained and the call
/// returns.
pub fn forward<T, F>(queue: &DedupQueue<T>, config: &RelayConfig, mut sink: F)
where
    T: Eq + Hash + Clone,
    F: FnMut(Event<T>),
{
    loop {
        match queue.wait_and_pop_timeout(config.idle_limit) {
            PopOutcome::Value(value) => {
                trace!("forwarding value");
                sink(Event::Data(value));
            }
            PopOutcome::Timeout => {
                debug!("no value for {:?}, emitting idle sentinel", config.idle_limit);
                sink(Event::Idle);
            }
            PopOutcome::Closed => {
                // Drain anything still queued before terminating.
                let mut drained = 0usize;
                while let Some(value) = queue.try_pop() {
                    sink(Event::Data(value));
                    drained += 1;
                }
                debug!("queue closed, relay done (drained {drained} residual values)");
                return;
            }
        }
    }
}

/// Feeds every value from `source` into the queue.
///
/// Returns the number of values the queue accepted. Rejected values
/// (duplicates already in flight, or pushes against a closed queue) are
/// logged and dropped; no retry is needed, per the queue's contract. The
/// pump stops early once it observes the queue closed.
pub fn pump<T, I>(source: I, queue: &DedupQueue<T>) -> usize
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut accepted = 0;
    for value in source {
        if queue.push(value) {
            accepted += 1;
        } else if queue.is_closed() {
            warn!("queue closed mid-pump, dropping remaining source values");
            break;
        } else {
            debug!("duplicate value dropped by queue");
        }
    }
    accepted
}

/// Spawns a consumer thread running [`forward`].
///
/// The thread exits when the queue is closed and drained.
pub fn spawn_forward<T, F>(
    queue: DedupQueue<T>,
    config: RelayConfig,
    sink: F,
) -> JoinHandle<()>
where
    T: Eq + Hash + Clone + Send + 'static,
    F: FnMut(Event<T>) + Send + 'static,
{
    thread::spawn(move || forward(&queue, &config, sink))
}

/// Spawns a producer thread running [`pump`]; the handle yields the number
/// of accepted values.
pub fn spawn_pump<T, I>(source: I, queue: DedupQueue<T>) -> JoinHandle<usize>
where
    T: Eq + Hash + Clone + Send + 'static,
    I: IntoIterator<Item = T> + Send + 'static,
{
    thread::spawn(move || pump(source, &queue))
}
