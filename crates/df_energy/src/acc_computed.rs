use std::sync::Arc;

use log::debug;

use df_structure::AccessibilityConstraint;
use df_structure::RnaSequence;
use df_structure::{Energy, kcal_to_e};

use crate::Accessibility;
use crate::ED_UPPER_BOUND;
use crate::EnergyModel;
use crate::accessibility::EdMatrix;
use crate::accessibility::check_indices;
use crate::nussinov::EnsembleConstraint;
use crate::nussinov::partition_function;

/// Accessibility computed from the intramolecular pairing ensemble:
/// ED(i,j) = -RT ln( Z with [i,j] unpaired / Z ), with base pair spans
/// bounded by the constraint's max_bp_span.
///
/// Positions marked blocked or accessible are forced unpaired, paired
/// positions are forced to pair. The whole table is filled at
/// construction; queries are table lookups.
pub struct AccessibilityComputed {
    sequence: Arc<RnaSequence>,
    max_length: usize,
    constraint: AccessibilityConstraint,
    ed: EdMatrix,
}

impl AccessibilityComputed {
    /// A max_length of 0 defaults to the sequence length.
    pub fn new(
        sequence: Arc<RnaSequence>,
        max_length: usize,
        constraint: AccessibilityConstraint,
        model: &dyn EnergyModel,
    ) -> Self {
        let n = sequence.len();
        let max_length = if max_length == 0 { n } else { max_length.min(n) };
        let rt = model.rt();

        let mut ensemble = EnsembleConstraint {
            pair_weight: (-df_structure::e_to_kcal(model.es_pair_energy()) / rt).exp(),
            min_hairpin: model.min_hairpin_size(),
            max_span: constraint.max_bp_span(),
            forced_unpaired: (0..n)
                .map(|i| constraint.is_blocked(i) || constraint.is_marked_accessible(i))
                .collect(),
            forced_paired: (0..n).map(|i| constraint.is_marked_paired(i)).collect(),
        };

        let z = partition_function(sequence.bases(), &ensemble);
        debug!("ensemble partition function of '{}': {:e}", sequence.id(), z);

        let mut ed = EdMatrix::new(n, max_length);
        let base_unpaired = ensemble.forced_unpaired.clone();
        for j in 0..n {
            for i in j.saturating_sub(max_length - 1)..=j {
                ed.set(i, j, ed_value(&sequence, &mut ensemble, &base_unpaired, i, j, z, rt));
            }
        }

        AccessibilityComputed { sequence, max_length, constraint, ed }
    }
}

fn ed_value(
    sequence: &RnaSequence,
    ensemble: &mut EnsembleConstraint,
    base_unpaired: &[bool],
    i: usize,
    j: usize,
    z: f64,
    rt: f64,
) -> Energy {
    // a position that must pair can never be part of an unpaired region
    if (i..=j).any(|p| ensemble.forced_paired[p]) {
        return ED_UPPER_BOUND;
    }
    ensemble.forced_unpaired[i..=j].fill(true);
    let z_unpaired = partition_function(sequence.bases(), ensemble);
    ensemble.forced_unpaired[i..=j].copy_from_slice(&base_unpaired[i..=j]);

    if z_unpaired <= 0.0 {
        return ED_UPPER_BOUND;
    }
    kcal_to_e(-rt * (z_unpaired / z).ln()).max(0)
}

impl Accessibility for AccessibilityComputed {
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
        self.ed.get(from, to)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::BasePairModel;
    use df_structure::e_is_inf;

    fn computed(seq: &str, encoding: &str) -> AccessibilityComputed {
        let rna = Arc::new(RnaSequence::new("test", seq).unwrap());
        let constraint = AccessibilityConstraint::from_string(rna.len(), encoding, 0).unwrap();
        AccessibilityComputed::new(rna, 0, constraint, &BasePairModel::default())
    }

    #[test]
    fn test_unstructured_sequence_is_free() {
        // no intramolecular pairs possible, so nothing costs energy
        let acc = computed("AAAAAA", "");
        for i in 0..6 {
            for j in i..6 {
                assert_eq!(acc.get_ed(i, j), 0);
            }
        }
    }

    #[test]
    fn test_structured_region_costs_energy() {
        // GGGGAAAACCCC folds into a hairpin; opening it costs energy
        let acc = computed("GGGGAAAACCCC", "");
        assert!(acc.get_ed(0, 11) > 0);
        assert!(acc.get_ed(0, 3) > 0);
        // the hairpin loop itself is mostly unpaired already
        assert!(acc.get_ed(5, 6) <= acc.get_ed(0, 3));
    }

    #[test]
    fn test_ed_monotone_in_range_width() {
        let acc = computed("GGGGAAAACCCC", "");
        // wider ranges can only be harder to open
        assert!(acc.get_ed(0, 5) >= acc.get_ed(1, 5));
        assert!(acc.get_ed(1, 5) >= acc.get_ed(2, 5));
    }

    #[test]
    fn test_forced_accessible_is_free() {
        // everything forced unpaired: the ensemble holds only the open chain
        let acc = computed("GGGGAAAACCCC", "xxxxxxxxxxxx");
        for i in 0..12 {
            assert_eq!(acc.get_ed(i, i), 0);
        }
    }

    #[test]
    fn test_paired_region_not_openable() {
        let acc = computed("GGGGAAAACCCC", "p:1-2");
        assert!(e_is_inf(acc.get_ed(0, 2)));
        assert!(!e_is_inf(acc.get_ed(4, 7)));
    }

    #[test]
    fn test_blocked_ends() {
        let acc = computed("GGGGAAAACCCC", "b:1-2");
        assert!(e_is_inf(acc.get_ed(0, 2)));
        assert!(e_is_inf(acc.get_ed(1, 4)));
        assert!(!e_is_inf(acc.get_ed(2, 4)));
    }
}
