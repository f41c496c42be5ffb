//! Monotonic counter for locally assigned knowledge point ids.
//!
//! Records created on the device get negative ids so they can never collide
//! with server-assigned (positive) ids. The counter only ever moves down.

use serde::{Deserialize, Serialize};

/// Counter holding the next negative id to hand out.
///
/// A value of zero or above means "uninitialised"; the first allocation
/// forces it to -1. Every allocation consumes exactly one value and the
/// counter is never reset upward, so ids are never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalIdCounter {
    next: i64,
}

impl LocalIdCounter {
    /// Create an uninitialised counter. The first id allocated will be -1.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Restore a counter from its persisted value.
    pub fn from_persisted(next: i64) -> Self {
        Self { next }
    }

    /// The persisted representation (the next id to be handed out).
    pub fn persisted(&self) -> i64 {
        self.next
    }

    /// Allocate the next negative id.
    pub fn allocate(&mut self) -> i64 {
        if self.next >= 0 {
            self.next = -1;
        }
        let id = self.next;
        self.next -= 1;
        id
    }

    /// Move the counter past an id that is already in use.
    ///
    /// Only ever moves the counter down; non-negative ids are ignored.
    pub fn reserve_below(&mut self, id: i64) {
        if id < 0 && self.peek() >= id {
            self.next = id - 1;
        }
    }

    /// Peek at the id the next call to [`allocate`](Self::allocate) returns.
    pub fn peek(&self) -> i64 {
        if self.next >= 0 {
            -1
        } else {
            self.next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_counter_starts_at_minus_one() {
        let mut counter = LocalIdCounter::new();
        assert_eq!(counter.peek(), -1);
        assert_eq!(counter.allocate(), -1);
        assert_eq!(counter.allocate(), -2);
        assert_eq!(counter.persisted(), -3);
    }

    #[test]
    fn positive_persisted_value_is_forced_negative() {
        let mut counter = LocalIdCounter::from_persisted(42);
        assert_eq!(counter.allocate(), -1);
    }

    #[test]
    fn resumes_from_persisted_value() {
        let mut counter = LocalIdCounter::from_persisted(-7);
        assert_eq!(counter.allocate(), -7);
        assert_eq!(counter.allocate(), -8);
    }

    #[test]
    fn reserve_below_never_moves_up() {
        let mut counter = LocalIdCounter::new();
        counter.reserve_below(-3);
        assert_eq!(counter.peek(), -4);

        counter.reserve_below(-1);
        counter.reserve_below(7);
        assert_eq!(counter.allocate(), -4);
    }

    #[test]
    fn serialization_is_plain_integer() {
        let counter = LocalIdCounter::from_persisted(-5);
        assert_eq!(serde_json::to_string(&counter).unwrap(), "-5");
        let parsed: LocalIdCounter = serde_json::from_str("-5").unwrap();
        assert_eq!(parsed, counter);
    }
}
