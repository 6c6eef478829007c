use std::fmt;
use std::sync::Arc;

use crate::Energy;
use crate::IndexRange;
use crate::RnaSequence;

/// An intermolecular base pair (index in S1, index in S2), both 5'->3' in
/// the original sequence orientations.
pub type BasePair = (usize, usize);

/// The seed fragment contained in an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRange {
    pub bp_left: BasePair,
    pub bp_right: BasePair,
    pub energy: Energy,
}

/// An RNA-RNA interaction: a set of intermolecular base pairs between two
/// sequences plus its overall energy.
///
/// A valid non-empty interaction has its pairs ascending in the first and
/// descending in the second index.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub s1: Arc<RnaSequence>,
    pub s2: Arc<RnaSequence>,
    pub base_pairs: Vec<BasePair>,
    pub energy: Energy,
    pub seed: Option<SeedRange>,
}

impl Interaction {
    pub fn new(s1: Arc<RnaSequence>, s2: Arc<RnaSequence>) -> Self {
        Interaction {
            s1,
            s2,
            base_pairs: Vec::new(),
            energy: 0,
            seed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base_pairs.is_empty()
    }

    /// Checks the base pair ordering: strictly ascending in index1 and
    /// strictly descending in index2, without duplicates.
    pub fn is_valid(&self) -> bool {
        if self.base_pairs.len() < 2 {
            return !self.is_empty();
        }
        self.base_pairs
            .windows(2)
            .all(|w| w[0].0 < w[1].0 && w[0].1 > w[1].1)
    }

    /// Sorts base pairs by index1; a valid interaction is then descending
    /// in index2 as well.
    pub fn sort(&mut self) {
        self.base_pairs.sort_unstable_by_key(|bp| bp.0);
    }

    pub fn clear(&mut self) {
        self.base_pairs.clear();
        self.energy = 0;
        self.seed = None;
    }

    pub fn set_seed(&mut self, bp_left: BasePair, bp_right: BasePair, energy: Energy) {
        self.seed = Some(SeedRange { bp_left, bp_right, energy });
    }

    /// The covered index range on S1 (ascending). Empty interactions have
    /// no range.
    pub fn range1(&self) -> Option<IndexRange> {
        let first = self.base_pairs.first()?;
        let last = self.base_pairs.last()?;
        Some(IndexRange::new(first.0, last.0))
    }

    /// The covered index range on S2 (descending).
    pub fn range2(&self) -> Option<IndexRange> {
        let first = self.base_pairs.first()?;
        let last = self.base_pairs.last()?;
        Some(IndexRange::new(first.1, last.1))
    }

    /// Hybrid notation over the interacting subsequences, e.g.
    /// `5||.|&2|.||` (1-based start positions, `|` paired, `.` unpaired).
    pub fn dot_bar(&self) -> String {
        assert!(self.is_valid(), "dot_bar() of invalid interaction");
        let mut s = String::new();
        s.push_str(&format!("{}", self.base_pairs[0].0 + 1));
        for w in self.base_pairs.windows(2) {
            s.push('|');
            s.push_str(&".".repeat(w[1].0 - w[0].0 - 1));
        }
        s.push('|');
        s.push('&');
        s.push_str(&format!("{}", self.base_pairs.last().unwrap().1 + 1));
        for w in self.base_pairs.windows(2).rev() {
            s.push('|');
            s.push_str(&".".repeat(w[0].1 - w[1].1 - 1));
        }
        s.push('|');
        s
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no interaction");
        }
        let pairs: Vec<String> = self.base_pairs.iter()
            .map(|(i, j)| format!("({},{})", i, j))
            .collect();
        write!(f, "{} : E = {:.2}", pairs.join(","), self.energy as f64 / 100.0)
    }
}

impl PartialEq for Interaction {
    fn eq(&self, other: &Self) -> bool {
        self.energy == other.energy && self.base_pairs == other.base_pairs
    }
}


/// The lossy boundary summary of an interaction: covered ranges and energy,
/// with the base pair list discarded. `r1` is ascending, `r2` descending.
#[derive(Debug, Clone)]
pub struct InteractionRange {
    pub s1: Arc<RnaSequence>,
    pub s2: Arc<RnaSequence>,
    pub r1: IndexRange,
    pub r2: IndexRange,
    pub energy: Energy,
}

impl InteractionRange {
    pub fn new(s1: Arc<RnaSequence>, s2: Arc<RnaSequence>) -> Self {
        InteractionRange {
            s1,
            s2,
            r1: IndexRange::na(),
            r2: IndexRange::na(),
            energy: 0,
        }
    }

    pub fn is_sane(&self) -> bool {
        !self.r1.is_na() && !self.r2.is_na() && self.r1.is_ascending() && self.r2.is_descending()
    }
}

impl fmt::Display for InteractionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {} : E = {:.2}", self.r1, self.r2, self.energy as f64 / 100.0)
    }
}

impl From<&Interaction> for InteractionRange {
    fn from(interaction: &Interaction) -> Self {
        assert!(!interaction.is_empty(), "range of an empty interaction");
        InteractionRange {
            s1: Arc::clone(&interaction.s1),
            s2: Arc::clone(&interaction.s2),
            r1: interaction.range1().unwrap_or_else(IndexRange::na),
            r2: interaction.range2().unwrap_or_else(IndexRange::na),
            energy: interaction.energy,
        }
    }
}

impl From<&InteractionRange> for Interaction {
    /// Keeps the boundary base pairs only.
    fn from(range: &InteractionRange) -> Self {
        assert!(range.is_sane(), "interaction from non-sane range");
        let mut interaction = Interaction::new(Arc::clone(&range.s1), Arc::clone(&range.s2));
        interaction.base_pairs.push((range.r1.from, range.r2.from));
        if range.r1.from != range.r1.to || range.r2.from != range.r2.to {
            interaction.base_pairs.push((range.r1.to, range.r2.to));
        }
        interaction.energy = range.energy;
        interaction
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn seqs() -> (Arc<RnaSequence>, Arc<RnaSequence>) {
        (
            Arc::new(RnaSequence::new("s1", "ACCGUAGGUU").unwrap()),
            Arc::new(RnaSequence::new("s2", "CCAUUCGGUA").unwrap()),
        )
    }

    #[test]
    fn test_validity() {
        let (s1, s2) = seqs();
        let mut interaction = Interaction::new(s1, s2);
        assert!(!interaction.is_valid());

        interaction.base_pairs.push((2, 7));
        assert!(interaction.is_valid());

        interaction.base_pairs.push((3, 6));
        interaction.base_pairs.push((5, 4));
        assert!(interaction.is_valid());

        // duplicated pair
        interaction.base_pairs.push((5, 4));
        assert!(!interaction.is_valid());
        interaction.base_pairs.pop();

        // index2 not descending
        interaction.base_pairs.push((6, 5));
        assert!(!interaction.is_valid());
    }

    #[test]
    fn test_sort() {
        let (s1, s2) = seqs();
        let mut interaction = Interaction::new(s1, s2);
        interaction.base_pairs.push((5, 4));
        interaction.base_pairs.push((2, 7));
        interaction.base_pairs.push((3, 6));
        assert!(!interaction.is_valid());
        interaction.sort();
        assert!(interaction.is_valid());
        assert_eq!(interaction.base_pairs, vec![(2, 7), (3, 6), (5, 4)]);
    }

    #[test]
    fn test_ranges() {
        let (s1, s2) = seqs();
        let mut interaction = Interaction::new(s1, s2);
        interaction.base_pairs.push((2, 7));
        interaction.base_pairs.push((5, 4));
        interaction.energy = -320;

        let range = InteractionRange::from(&interaction);
        assert!(range.is_sane());
        assert_eq!(range.r1, IndexRange::new(2, 5));
        assert_eq!(range.r2, IndexRange::new(7, 4));
        assert_eq!(range.energy, -320);

        let back = Interaction::from(&range);
        assert_eq!(back.base_pairs, vec![(2, 7), (5, 4)]);
        assert_eq!(back.energy, -320);
    }

    #[test]
    fn test_dot_bar() {
        let (s1, s2) = seqs();
        let mut interaction = Interaction::new(s1, s2);
        interaction.base_pairs.push((2, 7));
        interaction.base_pairs.push((3, 6));
        interaction.base_pairs.push((5, 4));
        assert_eq!(interaction.dot_bar(), "3||.|&5|.||");
    }
}
