//! Visit counters.
//!
//! # Responsibilities
//! - Count eligible visits with an atomic read-modify-write
//! - Hand out counters per location name (or one shared counter)
//!
//! # Design Decisions
//! - Increments are conditional so a rejected body never consumes a count
//! - Counters are keyed by location name, so a reload that keeps the name
//!   keeps the count
//! - Nothing is persisted; counts start from zero at process start

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// How locations share visit counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterScope {
    /// One counter per location name.
    #[default]
    PerRoute,
    /// One counter for every location in the process.
    Shared,
}

const SHARED_KEY: &str = "*";

/// A monotonically increasing visit count.
#[derive(Debug, Default)]
pub struct VisitCounter {
    visits: AtomicU64,
}

impl VisitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.visits.load(Ordering::Acquire)
    }

    /// Increment by one and return the new value.
    pub fn increment(&self) -> u64 {
        self.visits.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Increment by one only if `accept` approves the would-be new value.
    ///
    /// Returns the new value, or `None` when `accept` refused it. `accept`
    /// may run more than once under contention.
    pub fn increment_if<F>(&self, mut accept: F) -> Option<u64>
    where
        F: FnMut(u64) -> bool,
    {
        self.visits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(1)?;
                accept(next).then_some(next)
            })
            .ok()
            .map(|previous| previous + 1)
    }
}

/// Side table of visit counters indexed by location.
#[derive(Debug)]
pub struct VisitCounters {
    scope: CounterScope,
    counters: DashMap<String, Arc<VisitCounter>>,
}

impl VisitCounters {
    pub fn new(scope: CounterScope) -> Self {
        Self {
            scope,
            counters: DashMap::new(),
        }
    }

    pub fn scope(&self) -> CounterScope {
        self.scope
    }

    /// Counter for the given location, created on first use.
    pub fn counter_for(&self, location: &str) -> Arc<VisitCounter> {
        let key = self.key(location);

        if let Some(counter) = self.counters.get(key) {
            return counter.clone();
        }

        self.counters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(VisitCounter::new()))
            .clone()
    }

    /// Current count for a location, zero if never visited.
    pub fn visits(&self, location: &str) -> u64 {
        self.counters
            .get(self.key(location))
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    fn key<'a>(&self, location: &'a str) -> &'a str {
        match self.scope {
            CounterScope::PerRoute => location,
            CounterScope::Shared => SHARED_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_increment_returns_post_value() {
        let counter = VisitCounter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_increment_if_refused_leaves_value() {
        let counter = VisitCounter::new();
        assert_eq!(counter.increment_if(|_| false), None);
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.increment_if(|next| next == 1), Some(1));
    }

    #[test]
    fn test_concurrent_increments_are_distinct() {
        let counter = Arc::new(VisitCounter::new());
        let threads = 8;
        let per_thread = 500;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    (0..per_thread)
                        .map(|_| counter.increment_if(|_| true).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate count {value}");
            }
        }

        let total = (threads * per_thread) as u64;
        assert_eq!(seen.len() as u64, total);
        assert!((1..=total).all(|v| seen.contains(&v)));
    }

    #[test]
    fn test_per_route_scope_partitions() {
        let counters = VisitCounters::new(CounterScope::PerRoute);
        counters.counter_for("a").increment();
        counters.counter_for("a").increment();
        counters.counter_for("b").increment();

        assert_eq!(counters.visits("a"), 2);
        assert_eq!(counters.visits("b"), 1);
        assert_eq!(counters.visits("c"), 0);
    }

    #[test]
    fn test_shared_scope_is_process_wide() {
        let counters = VisitCounters::new(CounterScope::Shared);
        counters.counter_for("a").increment();
        counters.counter_for("b").increment();

        assert_eq!(counters.visits("a"), 2);
        assert!(Arc::ptr_eq(&counters.counter_for("a"), &counters.counter_for("b")));
    }
}
