use std::fmt;
use std::str::FromStr;

use crate::IndexRange;
use crate::RangeError;

/// A list of ascending index ranges, strictly sorted by `from` and pairwise
/// non-overlapping: for neighbors a, b it holds a.to < b.from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRangeList {
    list: Vec<IndexRange>,
}

impl IndexRangeList {
    pub fn new() -> Self {
        IndexRangeList { list: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexRange> {
        self.list.iter()
    }

    pub fn get(&self, idx: usize) -> IndexRange {
        self.list[idx]
    }

    /// Position of the first range with from > the given value.
    fn upper_bound(&self, from: usize) -> usize {
        self.list.partition_point(|r| r.from <= from)
    }

    /// Whether the given position is covered by one of the ranges.
    pub fn covers(&self, index: usize) -> bool {
        let pos = self.upper_bound(index);
        pos > 0 && index <= self.list[pos - 1].to
    }

    /// Whether the given range is fully covered by one of the ranges.
    pub fn covers_range(&self, range: &IndexRange) -> bool {
        let pos = self.upper_bound(range.from);
        pos > 0 && range.from >= self.list[pos - 1].from && range.to <= self.list[pos - 1].to
    }

    /// Whether the given ascending range shares at least one position with
    /// one of the ranges.
    pub fn overlaps(&self, range: &IndexRange) -> bool {
        assert!(range.is_ascending(), "overlaps({}) range is not ascending", range);
        if self.list.is_empty() {
            return false;
        }
        let pos = self.upper_bound(range.from);
        if pos < self.list.len() && self.list[pos].from <= range.to {
            return true;
        }
        pos > 0 && self.list[pos - 1].to >= range.from
    }

    /// Inserts an ascending range, keeping the list sorted.
    ///
    /// Inserting a range that overlaps an existing one violates the list
    /// invariant and panics; check with [`IndexRangeList::overlaps`] first
    /// when the input is not known to be disjoint.
    pub fn insert(&mut self, range: IndexRange) {
        assert!(range.is_ascending(), "insert({}) range is not ascending", range);
        let pos = self.upper_bound(range.from);
        if pos < self.list.len() {
            assert!(range.to < self.list[pos].from,
                "insert({}) overlaps {}", range, self.list[pos]);
        }
        if pos > 0 {
            let pred = &self.list[pos - 1];
            if *pred == range {
                return;
            }
            assert!(pred.to < range.from,
                "insert({}) overlaps {}", range, pred);
        }
        self.list.insert(pos, range);
    }

    /// Appends a range at the end of the list; same invariants as insert.
    pub fn push_back(&mut self, range: IndexRange) {
        assert!(range.is_ascending(), "push_back({}) range is not ascending", range);
        if let Some(last) = self.list.last() {
            assert!(last.to < range.from,
                "push_back({}) violates order given last range {}", range, last);
        }
        self.list.push(range);
    }

    pub fn remove(&mut self, idx: usize) -> IndexRange {
        self.list.remove(idx)
    }

    /// A new list with every range shifted and clamped into [0, max_idx].
    /// Ranges leaving the valid interval entirely are dropped.
    pub fn shift(&self, offset: isize, max_idx: usize) -> IndexRangeList {
        let mut shifted = IndexRangeList::new();
        for r in &self.list {
            let s = r.shift(offset, max_idx);
            if !s.is_na() {
                shifted.push_back(s);
            }
        }
        shifted
    }

    /// Mirrors all ranges within a sequence of the given length, in place.
    pub fn reverse(&mut self, seq_len: usize) -> Result<(), RangeError> {
        for r in &self.list {
            if r.from >= seq_len || r.to >= seq_len {
                return Err(RangeError::ExceedsLength(*r, seq_len));
            }
        }
        for r in &mut self.list {
            let from = r.from;
            r.from = seq_len - 1 - r.to;
            r.to = seq_len - 1 - from;
        }
        self.list.reverse();
        Ok(())
    }
}

impl fmt::Display for IndexRangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.list.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", r)?;
        }
        Ok(())
    }
}

impl FromStr for IndexRangeList {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut list = IndexRangeList::new();
        if s.trim().is_empty() {
            return Ok(list);
        }
        for token in s.split(',') {
            let range: IndexRange = token.trim().parse()?;
            if !range.is_ascending() {
                return Err(RangeError::NotAscending(range));
            }
            if list.overlaps(&range) {
                let pos = list.upper_bound(range.from);
                let other = if pos < list.len() && list.get(pos).from <= range.to {
                    list.get(pos)
                } else {
                    list.get(pos - 1)
                };
                return Err(RangeError::Overlap(range, other));
            }
            list.insert(range);
        }
        Ok(list)
    }
}

impl FromIterator<IndexRange> for IndexRangeList {
    fn from_iter<I: IntoIterator<Item = IndexRange>>(iter: I) -> Self {
        let mut list = IndexRangeList::new();
        for r in iter {
            list.insert(r);
        }
        list
    }
}
