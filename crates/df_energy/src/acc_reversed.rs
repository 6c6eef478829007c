use std::sync::Arc;

use df_structure::AccessibilityConstraint;
use df_structure::IndexRange;
use df_structure::RnaSequence;
use df_structure::Energy;

use crate::Accessibility;
use crate::accessibility::check_indices;

/// Read-only reversed view onto another accessibility, presenting the
/// reversed sequence and the mirrored constraint. ED values are looked up
/// in the source, never copied.
///
/// Wrapping the second strand in this view lets the prediction engines
/// index both strands 5'->3'.
pub struct ReverseAccessibility<'a> {
    origin: &'a dyn Accessibility,
    sequence_reversed: Arc<RnaSequence>,
    constraint_reversed: AccessibilityConstraint,
}

impl<'a> ReverseAccessibility<'a> {
    pub fn new(origin: &'a dyn Accessibility) -> Self {
        ReverseAccessibility {
            sequence_reversed: Arc::new(origin.sequence().reversed()),
            constraint_reversed: origin.constraint().reversed(),
            origin,
        }
    }

    /// The wrapped not-reversed accessibility.
    pub fn origin(&self) -> &'a dyn Accessibility {
        self.origin
    }

    /// Mirror index: i -> len-1-i.
    pub fn reversed_index(&self, i: usize) -> usize {
        self.sequence_reversed.reversed_index(i)
    }

    /// Mirrors a range, keeping ascending ranges ascending.
    pub fn reversed_range(&self, r: &IndexRange) -> IndexRange {
        IndexRange::new(self.reversed_index(r.to), self.reversed_index(r.from))
    }
}

impl Accessibility for ReverseAccessibility<'_> {
    fn sequence(&self) -> &Arc<RnaSequence> {
        &self.sequence_reversed
    }

    fn max_length(&self) -> usize {
        self.origin.max_length()
    }

    fn constraint(&self) -> &AccessibilityConstraint {
        &self.constraint_reversed
    }

    fn get_ed(&self, from: usize, to: usize) -> Energy {
        let n = self.sequence_reversed.len();
        check_indices(n, from, to);
        self.origin.get_ed(n - to - 1, n - from - 1)
    }
}
