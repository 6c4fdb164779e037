//! The replicated key-value store's causality tracker.
//!
//! A `VectorClock` is a fixed-length vector of non-negative integers, one per
//! replica. It is an immutable value: every operation returns a new vector
//! rather than mutating aliasable state in place, so a clock can be safely
//! shared across update-log entries without aliasing hazards (see
//! `spec.md` §9, "VectorClock as value object").
//!
//! **Correction vs. the reference.** The Python reference's `increment`
//! builds the incremented vector into a local, then reassigns
//! `self._clock = tuple(self._clock)` instead of the new value — a no-op.
//! `VectorClock::increment` here returns the genuinely incremented clock.

use crate::error::{IndexOutOfRangeSnafu, ShapeMismatchSnafu};
use crate::happened_before::{HappenedBeforeOrd, HappenedBeforeOrdering};
use crate::Result;
use std::cmp;
use std::fmt;

/// An `n`-dimensional vector of non-negative integers, one slot per replica.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VectorClock {
    entries: Box<[u64]>,
}

impl VectorClock {
    /// A zero vector of length `n`.
    pub fn new(n: usize) -> Self {
        Self {
            entries: vec![0u64; n].into_boxed_slice(),
        }
    }

    /// Builds a clock directly from a sequence of values.
    pub fn from_iterable<I: IntoIterator<Item = u64>>(values: I) -> Self {
        Self {
            entries: values.into_iter().collect::<Vec<_>>().into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Immutable snapshot of the underlying values.
    pub fn value(&self) -> &[u64] {
        &self.entries
    }

    fn require_same_len(&self, other: &Self) -> Result<()> {
        if self.entries.len() != other.entries.len() {
            return ShapeMismatchSnafu {
                expected: self.entries.len(),
                actual: other.entries.len(),
            }
            .fail();
        }
        Ok(())
    }

    /// Returns a new clock with component `i` raised by one.
    pub fn increment(&self, i: usize) -> Result<Self> {
        if i >= self.entries.len() {
            return IndexOutOfRangeSnafu {
                index: i,
                len: self.entries.len(),
            }
            .fail();
        }
        let mut entries = self.entries.clone();
        entries[i] += 1;
        Ok(Self { entries })
    }

    /// Returns the componentwise maximum of `self` and `other`.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        self.require_same_len(other)?;
        let entries: Box<[u64]> = self
            .entries
            .iter()
            .zip(other.entries.iter())
            .map(|(a, b)| *a.max(b))
            .collect();
        Ok(Self { entries })
    }

    /// `self <= other` componentwise. Panics on length mismatch — callers in
    /// this codebase only ever compare clocks of the same replica group; use
    /// [`VectorClock::hb_cmp`] if you need the fallible form.
    pub fn le(&self, other: &Self) -> bool {
        assert_eq!(self.entries.len(), other.entries.len(), "vector clock length mismatch");
        self.entries
            .iter()
            .zip(other.entries.iter())
            .all(|(a, b)| a <= b)
    }

    pub fn lt(&self, other: &Self) -> bool {
        self.le(other) && self != other
    }

    /// Neither `self <= other` nor `other <= self`.
    pub fn concurrent(&self, other: &Self) -> bool {
        !self.le(other) && !other.le(self)
    }
}

impl HappenedBeforeOrd for VectorClock {
    fn hb_cmp(&self, other: &Self) -> HappenedBeforeOrdering {
        if self.entries.len() != other.entries.len() {
            return HappenedBeforeOrdering::Incomparable;
        }
        let mut has_less = false;
        let mut has_greater = false;
        for (a, b) in self.entries.iter().zip(other.entries.iter()) {
            match a.cmp(b) {
                cmp::Ordering::Less => has_less = true,
                cmp::Ordering::Greater => has_greater = true,
                cmp::Ordering::Equal => {}
            }
            if has_less && has_greater {
                return HappenedBeforeOrdering::Concurrent;
            }
        }
        match (has_less, has_greater) {
            (false, false) => HappenedBeforeOrdering::Equal,
            (true, false) => HappenedBeforeOrdering::Before,
            (false, true) => HappenedBeforeOrdering::After,
            (true, true) => unreachable!("short-circuited above"),
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clock(values: &[u64]) -> VectorClock {
        VectorClock::from_iterable(values.iter().copied())
    }

    #[test]
    fn increment_replaces_the_stored_vector() {
        let a = VectorClock::new(3);
        let b = a.increment(1).unwrap();
        assert_eq!(b.value(), &[0, 1, 0]);
        // `a` itself is untouched: VectorClock is a value type.
        assert_eq!(a.value(), &[0, 0, 0]);
    }

    #[test]
    fn increment_out_of_range_is_an_error() {
        let a = VectorClock::new(2);
        assert!(a.increment(5).is_err());
    }

    #[test]
    fn merge_is_componentwise_max() {
        let a = clock(&[1, 0, 3]);
        let b = clock(&[0, 2, 3]);
        assert_eq!(a.merge(&b).unwrap().value(), &[1, 2, 3]);
    }

    #[test]
    fn merge_rejects_mismatched_length() {
        let a = VectorClock::new(2);
        let b = VectorClock::new(3);
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn le_and_concurrent() {
        let a = clock(&[1, 0, 0]);
        let b = clock(&[1, 1, 0]);
        let c = clock(&[0, 1, 0]);
        assert!(a.le(&b));
        assert!(!b.le(&a));
        assert!(a.concurrent(&c));
        assert!(!a.concurrent(&b));
    }

    fn arb_clock(n: usize) -> impl Strategy<Value = VectorClock> {
        prop::collection::vec(0u64..100, n).prop_map(VectorClock::from_iterable)
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in arb_clock(4), b in arb_clock(4)) {
            prop_assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
        }

        #[test]
        fn merge_is_idempotent(a in arb_clock(4)) {
            prop_assert_eq!(a.merge(&a).unwrap(), a.clone());
        }

        #[test]
        fn merge_is_associative(a in arb_clock(3), b in arb_clock(3), c in arb_clock(3)) {
            let lhs = a.merge(&b).unwrap().merge(&c).unwrap();
            let rhs = a.merge(&(b.merge(&c).unwrap())).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn le_is_a_partial_order(a in arb_clock(3), b in arb_clock(3), c in arb_clock(3)) {
            // Reflexivity.
            prop_assert!(a.le(&a));
            // Antisymmetry.
            if a.le(&b) && b.le(&a) {
                prop_assert_eq!(a.clone(), b.clone());
            }
            // Transitivity.
            if a.le(&b) && b.le(&c) {
                prop_assert!(a.le(&c));
            }
        }

        #[test]
        fn lt_implies_le_and_ne(a in arb_clock(3), b in arb_clock(3)) {
            if a.lt(&b) {
                prop_assert!(a.le(&b));
                prop_assert_ne!(a, b);
            }
        }
    }
}
