//! Two-phase index reservation.
//!
//! Every facet (states, controls, constraints, switches) owns a half-open
//! range `[start, after)` of a global vector. Components are constructed
//! first and reserve their ranges afterwards, in one sweep over the network,
//! so reading a range before that sweep is a bug in the caller and panics.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    facet: &'static str,
    bounds: Option<(usize, usize)>,
}

impl IndexRange {
    /// An unreserved range. `facet` names it in contract violations.
    pub const fn new(facet: &'static str) -> Self {
        Self {
            facet,
            bounds: None,
        }
    }

    /// Claim `count` indices starting at `next_free` and return the next free index.
    pub fn reserve(&mut self, next_free: usize, count: usize) -> usize {
        let after = next_free + count;
        self.bounds = Some((next_free, after));
        after
    }

    pub fn is_reserved(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn start(&self) -> usize {
        self.bounds().0
    }

    pub fn after(&self) -> usize {
        self.bounds().1
    }

    pub fn len(&self) -> usize {
        let (start, after) = self.bounds();
        after - start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        let (start, after) = self.bounds();
        start..after
    }

    fn bounds(&self) -> (usize, usize) {
        match self.bounds {
            Some(bounds) => bounds,
            None => panic!(
                "{} indices were read before they were reserved; call set_{}_indices first",
                self.facet, self.facet
            ),
        }
    }
}
