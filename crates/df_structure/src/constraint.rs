use std::fmt;

use crate::IndexRange;
use crate::IndexRangeList;

// Dot-bracket markers of the constraint encoding.
const MARK_UNCONSTRAINED: char = '.';
const MARK_BLOCKED: char = 'b';
const MARK_ACCESSIBLE: char = 'x';
const MARK_PAIRED: char = 'p';

#[derive(Debug)]
pub enum ConstraintError {
    InvalidChar(char, usize),
    LengthMismatch(usize, usize),
    InvalidRegionEncoding(String),
    RegionOutOfBounds(IndexRange, usize),
    ConflictingMarks(usize),
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintError::InvalidChar(c, i) => {
                write!(f, "Invalid constraint character '{}' at position {}", c, i)
            }
            ConstraintError::LengthMismatch(got, expected) => {
                write!(f, "Constraint length {} does not match sequence length {}", got, expected)
            }
            ConstraintError::InvalidRegionEncoding(s) => {
                write!(f, "'{}' is no valid constraint region encoding", s)
            }
            ConstraintError::RegionOutOfBounds(r, n) => {
                write!(f, "Constraint region {} outside 1-{}", r, n)
            }
            ConstraintError::ConflictingMarks(i) => {
                write!(f, "Position {} carries more than one constraint mark", i)
            }
        }
    }
}

impl std::error::Error for ConstraintError {}


/// Per-position structural constraints for accessibility computation.
///
/// A position is either unconstrained, `blocked` (excluded from any
/// interaction), `accessible` (enforced intramolecularly unpaired), or
/// `paired` (enforced intramolecularly paired). The three mark lists are
/// disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityConstraint {
    length: usize,
    max_bp_span: usize,
    blocked: IndexRangeList,
    accessible: IndexRangeList,
    paired: IndexRangeList,
}

impl AccessibilityConstraint {
    /// The all-unconstrained constraint.
    pub fn empty(length: usize) -> Self {
        AccessibilityConstraint {
            length,
            max_bp_span: length,
            blocked: IndexRangeList::new(),
            accessible: IndexRangeList::new(),
            paired: IndexRangeList::new(),
        }
    }

    /// Parses either a length-N string over `. b x p` or a 1-based region
    /// list like `b:3-4,x:7-8`. A `max_bp_span` of 0 defaults to the
    /// sequence length.
    pub fn from_string(
        length: usize,
        encoding: &str,
        max_bp_span: usize,
    ) -> Result<Self, ConstraintError> {
        let mut constraint = AccessibilityConstraint::empty(length);
        constraint.max_bp_span = if max_bp_span == 0 {
            length
        } else {
            max_bp_span.min(length)
        };

        let encoding = encoding.trim();
        if encoding.is_empty() {
            return Ok(constraint);
        }

        if encoding.contains(':') {
            constraint.parse_region_list(encoding)?;
        } else {
            constraint.parse_dot_bracket(encoding)?;
        }
        Ok(constraint)
    }

    fn parse_dot_bracket(&mut self, encoding: &str) -> Result<(), ConstraintError> {
        if encoding.chars().count() != self.length {
            return Err(ConstraintError::LengthMismatch(encoding.chars().count(), self.length));
        }
        for marker in [MARK_BLOCKED, MARK_ACCESSIBLE, MARK_PAIRED] {
            let mut region_start: Option<usize> = None;
            for (i, c) in encoding.chars().enumerate() {
                if !matches!(c, MARK_UNCONSTRAINED | MARK_BLOCKED | MARK_ACCESSIBLE | MARK_PAIRED) {
                    return Err(ConstraintError::InvalidChar(c, i));
                }
                if c == marker {
                    region_start.get_or_insert(i);
                } else if let Some(start) = region_start.take() {
                    self.storage_mut(marker).push_back(IndexRange::new(start, i - 1));
                }
            }
            if let Some(start) = region_start {
                let end = self.length - 1;
                self.storage_mut(marker).push_back(IndexRange::new(start, end));
            }
        }
        Ok(())
    }

    fn parse_region_list(&mut self, encoding: &str) -> Result<(), ConstraintError> {
        let mut marker: Option<char> = None;
        for token in encoding.split(',') {
            let token = token.trim();
            let range_str = match token.split_once(':') {
                Some((m, rest)) => {
                    let m: char = m.trim().parse()
                        .map_err(|_| ConstraintError::InvalidRegionEncoding(token.to_string()))?;
                    if !matches!(m, MARK_BLOCKED | MARK_ACCESSIBLE | MARK_PAIRED) {
                        return Err(ConstraintError::InvalidRegionEncoding(token.to_string()));
                    }
                    marker = Some(m);
                    rest
                }
                None => token,
            };
            let marker = marker
                .ok_or_else(|| ConstraintError::InvalidRegionEncoding(encoding.to_string()))?;
            let range: IndexRange = range_str.parse()
                .map_err(|_| ConstraintError::InvalidRegionEncoding(range_str.to_string()))?;
            // input regions are 1-based inclusive
            if range.from == 0 || range.to > self.length || !range.is_ascending() {
                return Err(ConstraintError::RegionOutOfBounds(range, self.length));
            }
            let range = IndexRange::new(range.from - 1, range.to - 1);
            if self.blocked.overlaps(&range)
                || self.accessible.overlaps(&range)
                || self.paired.overlaps(&range)
            {
                return Err(ConstraintError::ConflictingMarks(range.from));
            }
            self.storage_mut(marker).insert(range);
        }
        Ok(())
    }

    fn storage_mut(&mut self, marker: char) -> &mut IndexRangeList {
        match marker {
            MARK_BLOCKED => &mut self.blocked,
            MARK_ACCESSIBLE => &mut self.accessible,
            MARK_PAIRED => &mut self.paired,
            _ => unreachable!("no storage for marker '{}'", marker),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty() && self.accessible.is_empty() && self.paired.is_empty()
    }

    /// Maximal intramolecular base pair span to be considered when
    /// computing accessibilities.
    pub fn max_bp_span(&self) -> usize {
        self.max_bp_span
    }

    pub fn is_unconstrained(&self, i: usize) -> bool {
        !self.blocked.covers(i) && !self.accessible.covers(i) && !self.paired.covers(i)
    }

    /// Whether the position may take part in an interaction, i.e. is
    /// neither blocked nor enforced to pair intramolecularly.
    pub fn is_accessible(&self, i: usize) -> bool {
        !self.blocked.covers(i) && !self.paired.covers(i)
    }

    pub fn is_blocked(&self, i: usize) -> bool {
        self.blocked.covers(i)
    }

    pub fn is_marked_accessible(&self, i: usize) -> bool {
        self.accessible.covers(i)
    }

    pub fn is_marked_paired(&self, i: usize) -> bool {
        self.paired.covers(i)
    }

    pub fn blocked_ranges(&self) -> &IndexRangeList {
        &self.blocked
    }

    pub fn accessible_ranges(&self) -> &IndexRangeList {
        &self.accessible
    }

    pub fn paired_ranges(&self) -> &IndexRangeList {
        &self.paired
    }

    /// The mirror constraint for the reversed sequence.
    pub fn reversed(&self) -> AccessibilityConstraint {
        let mut rev = self.clone();
        rev.blocked.reverse(self.length).expect("constraint ranges are within the sequence");
        rev.accessible.reverse(self.length).expect("constraint ranges are within the sequence");
        rev.paired.reverse(self.length).expect("constraint ranges are within the sequence");
        rev
    }
}
