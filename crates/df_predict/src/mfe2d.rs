use log::debug;

use df_structure::IndexRange;
use df_structure::{Energy, E_INF, e_is_inf, e_sum};

use df_energy::EnergyWindow;
use df_energy::InteractionEnergy;

use ndarray::Array2;

use crate::OutputConstraint;
use crate::OutputHandler;
use crate::PredictError;
use crate::Predictor;
use crate::PredictionTracker;
use crate::ReportOverlap;
use crate::optima::OptimaList;
use crate::optima::report_candidates;
use crate::predictor::check_range;

/// Exact predictor: for every right boundary (j1,j2) a fresh 2D matrix of
/// left anchors holds the minimal hybridization energy of interactions
/// spanning (i1,i2)..(j1,j2). Quadratic space, full recursion.
///
/// Suboptimal candidates are collected during the fill; trace backs refill
/// the matrix of the traced boundary.
pub struct PredictorMfe2d<'a> {
    energy: &'a InteractionEnergy<'a>,
    tracker: Option<&'a mut dyn PredictionTracker>,
}

impl<'a> PredictorMfe2d<'a> {
    pub fn new(
        energy: &'a InteractionEnergy<'a>,
        tracker: Option<&'a mut dyn PredictionTracker>,
    ) -> Self {
        PredictorMfe2d { energy, tracker }
    }
}

/// Candidate pool size: overlap filtering may discard candidates, so
/// non-overlapping policies keep spares.
pub(crate) fn pool_size(ocon: &OutputConstraint) -> usize {
    match ocon.report_overlap {
        ReportOverlap::Both => ocon.report_max,
        _ => ocon.report_max.saturating_mul(4),
    }
}

/// Fills `hybrid` for the fixed right boundary (j1,j2): every cell in the
/// accessibility band gets the minimal hybridization energy or E_INF.
/// Requires (j1,j2) to be a valid pair.
pub(crate) fn fill_hybrid(
    window: &EnergyWindow,
    j1: usize,
    j2: usize,
    hybrid: &mut Array2<Energy>,
    mut on_cell: impl FnMut(usize, usize, Energy),
) {
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();
    let i1_min = (j1 + 1).saturating_sub(window.max_length1());
    let i2_min = (j2 + 1).saturating_sub(window.max_length2());

    for i1 in (i1_min..=j1).rev() {
        for i2 in (i2_min..=j2).rev() {
            let mut e = E_INF;
            if i1 == j1 && i2 == j2 {
                e = window.e_init();
            } else if window.are_complementary(i1, i2)
                && window.is_accessible1(i1)
                && window.is_accessible2(i2)
            {
                for w1 in 1..=max_loop1 + 1 {
                    let k1 = i1 + w1;
                    if k1 > j1 {
                        break;
                    }
                    for w2 in 1..=max_loop2 + 1 {
                        let k2 = i2 + w2;
                        if k2 > j2 {
                            break;
                        }
                        let right = hybrid[(k1, k2)];
                        if e_is_inf(right) {
                            continue;
                        }
                        let step = e_sum(window.e_inter_left(i1, k1, i2, k2), right);
                        if step < e {
                            e = step;
                        }
                    }
                }
            }
            hybrid[(i1, i2)] = e;
            if !e_is_inf(e) {
                on_cell(i1, i2, e);
            }
        }
    }
}

/// Walks the filled matrix from (i1,i2) to (j1,j2), appending every base
/// pair right of the anchor.
pub(crate) fn trace_hybrid(
    window: &EnergyWindow,
    hybrid: &Array2<Energy>,
    i1: usize,
    j1: usize,
    i2: usize,
    j2: usize,
    interaction: &mut df_structure::Interaction,
) -> Result<(), PredictError> {
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();
    let (mut i1, mut i2) = (i1, i2);
    let mut cur = hybrid[(i1, i2)];

    while i1 != j1 || i2 != j2 {
        let mut advanced = false;
        'search: for w1 in 1..=max_loop1 + 1 {
            let k1 = i1 + w1;
            if k1 > j1 {
                break;
            }
            for w2 in 1..=max_loop2 + 1 {
                let k2 = i2 + w2;
                if k2 > j2 {
                    break;
                }
                let right = hybrid[(k1, k2)];
                if e_is_inf(right) {
                    continue;
                }
                if cur == e_sum(window.e_inter_left(i1, k1, i2, k2), right) {
                    interaction.base_pairs.push(window.base_pair(k1, k2));
                    i1 = k1;
                    i2 = k2;
                    cur = right;
                    advanced = true;
                    break 'search;
                }
            }
        }
        if !advanced {
            return Err(PredictError::TraceFailure(format!(
                "no recursion source at ({},{}) towards ({},{})",
                i1, i2, j1, j2
            )));
        }
    }
    Ok(())
}

impl Predictor for PredictorMfe2d<'_> {
    fn predict(
        &mut self,
        r1: &IndexRange,
        r2: &IndexRange,
        ocon: &OutputConstraint,
        out: &mut dyn OutputHandler,
    ) -> Result<(), PredictError> {
        check_range(r1, self.energy.size1())?;
        check_range(r2, self.energy.size2())?;
        debug!("predicting mfe interactions in O(n^2) space");

        let window = EnergyWindow::new(self.energy, r1, r2);
        let n1 = window.size1();
        let n2 = window.size2();

        let mut optima = OptimaList::new(ocon.max_e, pool_size(ocon));
        let mut hybrid = Array2::from_elem((n1, n2), E_INF);

        for j1 in 0..n1 {
            for j2 in 0..n2 {
                if !window.are_complementary(j1, j2)
                    || !window.is_accessible1(j1)
                    || !window.is_accessible2(j2)
                {
                    continue;
                }
                let tracker = &mut self.tracker;
                fill_hybrid(&window, j1, j2, &mut hybrid, |i1, i2, e| {
                    let total = window.e_total(i1, j1, i2, j2, e);
                    if let Some(tracker) = tracker {
                        tracker.update_optimum_called(
                            i1 + window.offset1(),
                            j1 + window.offset1(),
                            i2 + window.offset2(),
                            j2 + window.offset2(),
                            total,
                        );
                    }
                    optima.update(i1, j1, i2, j2, total);
                });
            }
        }

        report_candidates(&optima, &window, ocon, out, |candidate, interaction| {
            // refill the matrix of this right boundary, then walk it
            fill_hybrid(&window, candidate.j1, candidate.j2, &mut hybrid, |_, _, _| {});
            trace_hybrid(
                &window,
                &hybrid,
                candidate.i1,
                candidate.j1,
                candidate.i2,
                candidate.j2,
                interaction,
            )
        })
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use df_structure::AccessibilityConstraint;
    use df_structure::RnaSequence;
    use df_energy::{
        AccessibilityDisabled, BasePairModel, EsInit, InteractionEnergy, ReverseAccessibility,
    };

    use crate::InteractionCollector;

    pub(crate) fn accessibilities(
        s1: &str,
        s2: &str,
    ) -> (AccessibilityDisabled, AccessibilityDisabled) {
        let rna1 = Arc::new(RnaSequence::new("s1", s1).unwrap());
        let rna2 = Arc::new(RnaSequence::new("s2", s2).unwrap());
        let c1 = AccessibilityConstraint::empty(rna1.len());
        let c2 = AccessibilityConstraint::empty(rna2.len());
        (
            AccessibilityDisabled::new(rna1, 0, c1),
            AccessibilityDisabled::new(rna2, 0, c2),
        )
    }

    fn predict_one(s1: &str, s2: &str) -> df_structure::Interaction {
        let (acc1, acc2) = accessibilities(s1, s2);
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        predictor
            .predict(
                &IndexRange::default(),
                &IndexRange::default(),
                &OutputConstraint::default(),
                &mut collector,
            )
            .unwrap();
        collector.interactions.into_iter().next().unwrap()
    }

    #[test]
    fn test_self_complementary_duplex() {
        // ACGU against itself forms the full four-pair duplex
        let interaction = predict_one("ACGU", "ACGU");
        assert_eq!(interaction.energy, -400);
        assert_eq!(interaction.base_pairs, vec![(0, 3), (1, 2), (2, 1), (3, 0)]);
        assert!(interaction.is_valid());
    }

    #[test]
    fn test_full_duplex() {
        let interaction = predict_one("AAAA", "UUUU");
        assert_eq!(interaction.energy, -400);
        assert_eq!(interaction.base_pairs, vec![(0, 3), (1, 2), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_partial_complementarity() {
        // S2 = ACGG has no U, so the A of S1 stays unpaired
        let interaction = predict_one("ACGU", "ACGG");
        assert_eq!(interaction.energy, -300);
        assert_eq!(interaction.base_pairs, vec![(1, 2), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_single_pair() {
        // exactly one U in S2: interactions cannot exceed one pair
        let interaction = predict_one("AAAA", "AAAU");
        assert_eq!(interaction.energy, -100);
        assert_eq!(interaction.base_pairs, vec![(0, 3)]);
    }

    #[test]
    fn test_no_interaction_report() {
        let (acc1, acc2) = accessibilities("AAAA", "AAAA");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        predictor
            .predict(
                &IndexRange::default(),
                &IndexRange::default(),
                &OutputConstraint::default(),
                &mut collector,
            )
            .unwrap();
        assert_eq!(collector.interactions.len(), 1);
        assert!(collector.interactions[0].is_empty());
        assert_eq!(collector.found().count(), 0);
    }

    #[test]
    fn test_suboptimals_overlapping() {
        let (acc1, acc2) = accessibilities("AAAA", "UUUU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        let ocon = OutputConstraint { report_max: 3, ..OutputConstraint::default() };
        predictor
            .predict(&IndexRange::default(), &IndexRange::default(), &ocon, &mut collector)
            .unwrap();
        assert_eq!(collector.interactions.len(), 3);
        // sorted by energy, mfe first
        assert_eq!(collector.interactions[0].energy, -400);
        assert!(collector.interactions[1].energy >= collector.interactions[0].energy);
        assert!(collector.interactions[2].energy >= collector.interactions[1].energy);
        for interaction in collector.found() {
            assert!(interaction.is_valid());
        }
    }

    #[test]
    fn test_non_overlapping_suboptimals() {
        // two separated A-blocks on S1 can each bind the U-block; small
        // loop bounds keep the blocks from bridging the Cs
        let (acc1, acc2) = accessibilities("AACCCAA", "UUUUUUU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 1, 1, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        let ocon = OutputConstraint {
            report_max: 2,
            report_overlap: ReportOverlap::None,
            ..OutputConstraint::default()
        };
        predictor
            .predict(&IndexRange::default(), &IndexRange::default(), &ocon, &mut collector)
            .unwrap();
        let found: Vec<_> = collector.found().collect();
        assert_eq!(found.len(), 2);
        let r1a = found[0].range1().unwrap();
        let r1b = found[1].range1().unwrap();
        assert!(r1a.to < r1b.from || r1b.to < r1a.from, "S1 ranges overlap");
    }

    #[test]
    fn test_range_restriction() {
        let (acc1, acc2) = accessibilities("UUAAAA", "UUUUUU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        predictor
            .predict(
                &IndexRange::new(2, 3),
                &IndexRange::default(),
                &OutputConstraint::default(),
                &mut collector,
            )
            .unwrap();
        let interaction = &collector.interactions[0];
        assert_eq!(interaction.energy, -200);
        assert!(interaction.base_pairs.iter().all(|bp| (2..=3).contains(&bp.0)));
    }

    #[test]
    fn test_energy_recomposition() {
        use df_energy::NearestNeighborModel;
        use df_structure::PairTypeRNA;

        let (acc1, acc2) = accessibilities("GGGAAACCCUU", "GGGAAACCC");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = NearestNeighborModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, true, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        predictor
            .predict(
                &IndexRange::default(),
                &IndexRange::default(),
                &OutputConstraint::default(),
                &mut collector,
            )
            .unwrap();
        let interaction = collector.found().next().expect("no interaction found");
        assert!(interaction.is_valid());

        // every reported pair is complementary
        let s1 = interaction.s1.bases();
        let s2 = interaction.s2.bases();
        for bp in &interaction.base_pairs {
            assert!(PairTypeRNA::from((s1[bp.0], s2[bp.1])).can_pair());
        }

        // the total recomposes from init, the internal loop steps, and
        // the site terms
        let window = EnergyWindow::new(&energy, &IndexRange::default(), &IndexRange::default());
        let local: Vec<_> = interaction
            .base_pairs
            .iter()
            .map(|bp| (window.index1(bp), window.index2(bp)))
            .collect();
        let mut hybrid = window.e_init();
        for w in local.windows(2) {
            let step = window.e_inter_left(w[0].0, w[1].0, w[0].1, w[1].1);
            assert!(!e_is_inf(step));
            hybrid = e_sum(hybrid, step);
        }
        let first = local.first().unwrap();
        let last = local.last().unwrap();
        let total = window.e_total(first.0, last.0, first.1, last.1, hybrid);
        assert_eq!(total, interaction.energy);

        // and the per-term breakdown sums to the stored energy
        let c = energy.e_contributions(interaction);
        let sum = c.init
            + c.loops
            + c.ed1
            + c.ed2
            + c.dangle_left
            + c.dangle_right
            + c.end_left
            + c.end_right
            + c.energy_add;
        assert_eq!(sum, interaction.energy);
    }

    #[test]
    fn test_invalid_range() {
        let (acc1, acc2) = accessibilities("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2d::new(&energy, None);
        let mut collector = InteractionCollector::new();
        let result = predictor.predict(
            &IndexRange::new(3, 1),
            &IndexRange::default(),
            &OutputConstraint::default(),
            &mut collector,
        );
        assert!(matches!(result, Err(PredictError::InvalidRange(_))));
    }
}
