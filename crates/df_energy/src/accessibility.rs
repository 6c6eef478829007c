use std::io;
use std::sync::Arc;

use df_structure::AccessibilityConstraint;
use df_structure::IndexRange;
use df_structure::IndexRangeList;
use df_structure::RnaSequence;
use df_structure::{Energy, E_INF, e_is_inf, e_to_kcal};

/// ED queries outside the band or at constrained ends return this bound.
pub const ED_UPPER_BOUND: Energy = E_INF;

/// Banded upper-triangular storage for ED(i,j) with j-i < band, O(N*band)
/// memory. Out-of-band cells are not stored.
#[derive(Debug, Clone)]
pub(crate) struct EdMatrix {
    n: usize,
    band: usize,
    data: Vec<Energy>,
}

impl EdMatrix {
    pub(crate) fn new(n: usize, band: usize) -> Self {
        assert!(band >= 1 && band <= n, "band {} out of range for length {}", band, n);
        EdMatrix { n, band, data: vec![0; n * band] }
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.n && j - i < self.band);
        i * self.band + (j - i)
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> Energy {
        self.data[self.index(i, j)]
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, value: Energy) {
        let idx = self.index(i, j);
        self.data[idx] = value;
    }
}


/// Access to the energetic cost ED(i,j) of keeping the subsequence [i,j]
/// unpaired within its own molecule. Once filled, accessibilities are
/// shared across prediction threads and must support concurrent reads.
pub trait Accessibility: Sync {
    /// The sequence the accessibilities are about.
    fn sequence(&self) -> &Arc<RnaSequence>;

    /// Maximal length of ranges with stored ED values; longer queries
    /// yield ED_UPPER_BOUND.
    fn max_length(&self) -> usize;

    /// The structural constraint the accessibilities respect.
    fn constraint(&self) -> &AccessibilityConstraint;

    /// ED value for the range [from,to]; requires from <= to < N.
    /// ED_UPPER_BOUND when the range exceeds the band or an end position
    /// cannot take part in an interaction.
    fn get_ed(&self, from: usize, to: usize) -> Energy;

    /// Writes the values in the RNAplfold text layout, either as unpaired
    /// probabilities (`exp(-ED/RT)`) or as ED values in kcal/mol.
    fn write_plfold_text(
        &self,
        out: &mut dyn io::Write,
        rt: f64,
        write_probs: bool,
    ) -> io::Result<()> {
        let n = self.sequence().len();
        let max_len = self.max_length().min(n);

        if write_probs {
            writeln!(out, "#unpaired probabilities")?;
        } else {
            writeln!(out, "#ensemble delta energy to unpair a region ED")?;
        }
        write!(out, " #i$\tl=")?;
        for l in 1..=max_len {
            write!(out, "{}\t", l)?;
        }
        writeln!(out)?;

        for j in 0..n {
            write!(out, "{}\t", j + 1)?;
            let cols = max_len.min(j + 1);
            for l in 1..=cols {
                let ed = self.get_ed(j + 1 - l, j);
                if write_probs {
                    let pu = if e_is_inf(ed) {
                        0.0
                    } else {
                        (-e_to_kcal(ed) / rt).exp()
                    };
                    write!(out, "{:.7e}\t", pu)?;
                } else {
                    write!(out, "{:.6}\t", e_to_kcal(ed.min(E_INF)))?;
                }
            }
            for _ in cols..max_len {
                write!(out, "NA\t")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Splits the full sequence range into accessible ranges of length
    /// within [min_len, max_len] by iteratively cutting out the window of
    /// width win_size with the highest ED. Windows cutting at a range
    /// boundary prune the range instead of splitting it, so the result is
    /// not symmetric under sequence reversal.
    fn decompose_by_max_ed(
        &self,
        max_len: usize,
        win_size: usize,
        min_len: usize,
    ) -> IndexRangeList {
        assert!(win_size > 0, "decompose_by_max_ed() : win_size == 0");
        assert!(win_size < max_len, "decompose_by_max_ed() : win_size >= max_len");

        let n = self.sequence().len();
        let mut ranges = vec![IndexRange::new(0, n - 1)];

        let mut idx = 0;
        while idx < ranges.len() {
            let cur = ranges[idx];
            if cur.len() < min_len {
                ranges.remove(idx);
                continue;
            }
            if cur.to - cur.from < max_len {
                idx += 1;
                continue;
            }

            // find the window with the highest ED
            let max_start = cur.to - win_size + 1;
            let mut cut = cur.from;
            let mut cut_ed = self.get_ed(cut, cut + win_size - 1);
            for i in cur.from..=max_start {
                let ed = self.get_ed(i, i + win_size - 1);
                if ed > cut_ed {
                    cut = i;
                    cut_ed = ed;
                }
            }

            if cut == cur.from {
                // prune the start window
                ranges[idx].from = (cut + win_size).min(cur.to);
            } else if cut >= max_start {
                // prune the end window
                ranges[idx].to = (cut - 1).max(cur.from);
            } else if cut - cur.from < min_len {
                // leading remainder too short, prune it together with the cut
                ranges[idx].from = (cut + win_size).min(cur.to);
            } else {
                let tail = IndexRange::new((cut + win_size).min(cur.to), cur.to);
                ranges[idx].to = (cut - 1).max(cur.from);
                if tail.len() >= min_len {
                    ranges.insert(idx + 1, tail);
                }
            }
        }

        ranges.into_iter().collect()
    }

    /// Breaks every range at positions whose single-position ED exceeds
    /// max_ed, dropping those positions.
    fn decompose_by_threshold(&self, ranges: &mut IndexRangeList, max_ed: Energy) {
        if max_ed >= ED_UPPER_BOUND {
            return;
        }
        let mut out = IndexRangeList::new();
        for range in ranges.iter() {
            let mut start: Option<usize> = None;
            for i in range.from..=range.to {
                if self.get_ed(i, i) > max_ed {
                    if let Some(s) = start.take() {
                        out.push_back(IndexRange::new(s, i - 1));
                    }
                } else {
                    start.get_or_insert(i);
                }
            }
            if let Some(s) = start {
                out.push_back(IndexRange::new(s, range.to));
            }
        }
        *ranges = out;
    }
}

/// Range precondition shared by all accessibility implementations.
pub(crate) fn check_indices(n: usize, from: usize, to: usize) {
    assert!(from <= to, "getED({},{}) with from > to", from, to);
    assert!(to < n, "getED({},{}) beyond sequence length {}", from, to, n);
}


/// Accessibility turned off: every in-band range of interactable
/// positions costs nothing.
pub struct AccessibilityDisabled {
    sequence: Arc<RnaSequence>,
    max_length: usize,
    constraint: AccessibilityConstraint,
}

impl AccessibilityDisabled {
    /// A max_length of 0 defaults to the sequence length.
    pub fn new(
        sequence: Arc<RnaSequence>,
        max_length: usize,
        constraint: AccessibilityConstraint,
    ) -> Self {
        let n = sequence.len();
        let max_length = if max_length == 0 { n } else { max_length.min(n) };
        AccessibilityDisabled { sequence, max_length, constraint }
    }
}

impl Accessibility for AccessibilityDisabled {
    fn sequence(&self) -> &Arc<RnaSequence> {
        &self.sequence
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn constraint(&self) -> &AccessibilityConstraint {
        &self.constraint
    }

    fn get_ed(&self, from: usize, to: usize) -> Energy {
        check_indices(self.sequence.len(), from, to);
        if to - from + 1 > self.max_length {
            return ED_UPPER_BOUND;
        }
        if !self.constraint.is_accessible(from) || !self.constraint.is_accessible(to) {
            return ED_UPPER_BOUND;
        }
        0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn disabled(seq: &str, max_length: usize) -> AccessibilityDisabled {
        let rna = Arc::new(RnaSequence::new("test", seq).unwrap());
        let constraint = AccessibilityConstraint::empty(rna.len());
        AccessibilityDisabled::new(rna, max_length, constraint)
    }

    #[test]
    fn test_disabled_inside_band() {
        let acc = disabled("ACGUACGU", 4);
        assert_eq!(acc.get_ed(0, 0), 0);
        assert_eq!(acc.get_ed(2, 5), 0);
        assert_eq!(acc.get_ed(2, 6), ED_UPPER_BOUND);
        assert_eq!(acc.max_length(), 4);
    }

    #[test]
    fn test_disabled_default_band() {
        let acc = disabled("ACGUACGU", 0);
        assert_eq!(acc.max_length(), 8);
        assert_eq!(acc.get_ed(0, 7), 0);
    }

    #[test]
    #[should_panic]
    fn test_bad_indices() {
        let acc = disabled("ACGU", 0);
        acc.get_ed(2, 1);
    }

    #[test]
    fn test_blocked_ends() {
        let rna = Arc::new(RnaSequence::new("test", "ACGUACGU").unwrap());
        let constraint = AccessibilityConstraint::from_string(8, "..bb....", 0).unwrap();
        let acc = AccessibilityDisabled::new(rna, 0, constraint);
        assert_eq!(acc.get_ed(0, 1), 0);
        assert_eq!(acc.get_ed(0, 2), ED_UPPER_BOUND);
        assert_eq!(acc.get_ed(3, 5), ED_UPPER_BOUND);
        assert_eq!(acc.get_ed(4, 7), 0);
    }

    #[test]
    fn test_ed_matrix_band() {
        let mut m = EdMatrix::new(5, 3);
        m.set(1, 3, 42);
        m.set(4, 4, 7);
        assert_eq!(m.get(1, 3), 42);
        assert_eq!(m.get(4, 4), 7);
        assert_eq!(m.get(0, 0), 0);
    }
}
