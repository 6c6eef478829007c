use df_structure::Base;
use df_structure::PairTypeRNA;

use ndarray::Array2;

/// Constraints on the intramolecular pairing ensemble.
pub(crate) struct EnsembleConstraint {
    /// Boltzmann weight of a single pair.
    pub pair_weight: f64,
    /// Minimal number of unpaired positions enclosed by a pair.
    pub min_hairpin: usize,
    /// Maximal span j-i+1 of a pair.
    pub max_span: usize,
    /// Positions that must stay unpaired.
    pub forced_unpaired: Vec<bool>,
    /// Positions that must pair.
    pub forced_paired: Vec<bool>,
}

impl EnsembleConstraint {
    fn may_pair(&self, bases: &[Base], i: usize, j: usize) -> bool {
        j > i
            && j - i > self.min_hairpin
            && j - i + 1 <= self.max_span
            && !self.forced_unpaired[i]
            && !self.forced_unpaired[j]
            && PairTypeRNA::from((bases[i], bases[j])).can_pair()
    }
}

/// Partition function Q(i,j) over all admissible pairing configurations of
/// the subsequence [i,j], including the empty one. Structures are counted
/// by the pairing status of j: either j is unpaired, or it pairs some k
/// with everything left of k independent.
pub(crate) fn partition_matrix(bases: &[Base], constraint: &EnsembleConstraint) -> Array2<f64> {
    let n = bases.len();
    let mut q = Array2::<f64>::ones((n + 1, n + 1));

    // q is addressed with an inclusive window [i,j] mapped to (i, j+1);
    // empty windows (j < i) keep the init value 1.
    for span in 1..=n {
        for i in 0..=(n - span) {
            let j = i + span - 1;
            let mut val = 0.0;
            if !constraint.forced_paired[j] {
                val += q[(i, j)]; // j unpaired: q(i, j-1)
            }
            for k in i..j {
                if constraint.may_pair(bases, k, j) {
                    let outside = q[(i, k)]; // q(i, k-1)
                    let inside = q[(k + 1, j)]; // q(k+1, j-1)
                    val += outside * constraint.pair_weight * inside;
                }
            }
            q[(i, j + 1)] = val;
        }
    }
    q
}

/// Q(0, n-1) of the full sequence under the given constraint.
pub(crate) fn partition_function(bases: &[Base], constraint: &EnsembleConstraint) -> f64 {
    if bases.is_empty() {
        return 1.0;
    }
    let q = partition_matrix(bases, constraint);
    q[(0, bases.len())]
}
