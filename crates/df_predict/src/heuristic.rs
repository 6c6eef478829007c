use log::debug;

use df_structure::IndexRange;
use df_structure::Interaction;
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
use crate::optima::ReportedRanges;
use crate::optima::SiteCandidate;
use crate::optima::boundary_interaction;
use crate::optima::candidate_site;
use crate::optima::report_bound;
use crate::optima::report_candidates;
use crate::optima::report_none;
use crate::predictor::check_range;

/// One DP cell: the best interaction starting at this left anchor, held
/// as its hybridization energy and right boundary.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BestInteraction {
    pub e: Energy,
    pub j1: usize,
    pub j2: usize,
}

pub(crate) const NO_INTERACTION: BestInteraction =
    BestInteraction { e: E_INF, j1: usize::MAX, j2: usize::MAX };

/// Heuristic predictor in quadratic time and space: one cell per left
/// anchor keeps only the single best right extension, filled in
/// decreasing anchor order over the internal-loop neighborhood.
pub struct PredictorMfe2dHeuristic<'a> {
    energy: &'a InteractionEnergy<'a>,
    tracker: Option<&'a mut dyn PredictionTracker>,
}

impl<'a> PredictorMfe2dHeuristic<'a> {
    pub fn new(
        energy: &'a InteractionEnergy<'a>,
        tracker: Option<&'a mut dyn PredictionTracker>,
    ) -> Self {
        PredictorMfe2dHeuristic { energy, tracker }
    }
}

/// Initializes every cell with interaction initiation or E_INF.
pub(crate) fn init_cells(window: &EnergyWindow) -> Array2<BestInteraction> {
    let n1 = window.size1();
    let n2 = window.size2();
    let mut cells = Array2::from_elem((n1, n2), NO_INTERACTION);
    for i1 in 0..n1 {
        for i2 in 0..n2 {
            if window.is_accessible1(i1)
                && window.is_accessible2(i2)
                && window.are_complementary(i1, i2)
            {
                cells[(i1, i2)] = BestInteraction { e: window.e_init(), j1: i1, j2: i2 };
            }
        }
    }
    cells
}

/// Fills the cells in decreasing anchor order; for each cell, reports the
/// best total energy through `on_cell`.
pub(crate) fn fill_cells(
    window: &EnergyWindow,
    cells: &mut Array2<BestInteraction>,
    mut on_cell: impl FnMut(usize, usize, &BestInteraction, Energy),
) {
    let n1 = window.size1();
    let n2 = window.size2();
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();

    for i1 in (0..n1).rev() {
        for i2 in (0..n2).rev() {
            let cur = cells[(i1, i2)];
            if e_is_inf(cur.e) {
                continue;
            }
            let mut best = cur;
            let mut best_total = window.e_total(i1, cur.j1, i2, cur.j2, cur.e);

            for w1 in 1..=max_loop1 + 1 {
                let k1 = i1 + w1;
                if k1 >= n1 {
                    break;
                }
                for w2 in 1..=max_loop2 + 1 {
                    let k2 = i2 + w2;
                    if k2 >= n2 {
                        break;
                    }
                    let right = cells[(k1, k2)];
                    if e_is_inf(right.e) {
                        continue;
                    }
                    // interaction length within the accessibility bands
                    if right.j1 + 1 - i1 > window.max_length1()
                        || right.j2 + 1 - i2 > window.max_length2()
                    {
                        continue;
                    }
                    let e = e_sum(window.e_inter_left(i1, k1, i2, k2), right.e);
                    let total = window.e_total(i1, right.j1, i2, right.j2, e);
                    if total < best_total {
                        best = BestInteraction { e, j1: right.j1, j2: right.j2 };
                        best_total = total;
                    }
                }
            }

            cells[(i1, i2)] = best;
            on_cell(i1, i2, &best, best_total);
        }
    }
}

/// Walks the cell table from (i1,i2), restricted to cells carrying the
/// same stored right boundary, appending every base pair right of the
/// anchor.
pub(crate) fn trace_cells(
    window: &EnergyWindow,
    cells: &Array2<BestInteraction>,
    i1: usize,
    j1: usize,
    i2: usize,
    j2: usize,
    interaction: &mut Interaction,
) -> Result<(), PredictError> {
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();
    let (mut i1, mut i2) = (i1, i2);
    let mut cur = cells[(i1, i2)].e;

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
                let right = cells[(k1, k2)];
                if e_is_inf(right.e) || right.j1 != j1 || right.j2 != j2 {
                    continue;
                }
                if cur == e_sum(window.e_inter_left(i1, k1, i2, k2), right.e) {
                    interaction.base_pairs.push(window.base_pair(k1, k2));
                    i1 = k1;
                    i2 = k2;
                    cur = right.e;
                    advanced = true;
                    break 'search;
                }
            }
        }
        if !advanced {
            return Err(PredictError::TraceFailure(format!(
                "no heuristic recursion source at ({},{}) towards ({},{})",
                i1, i2, j1, j2
            )));
        }
    }
    Ok(())
}

/// Rescans the cell table for the best site with energy in
/// [current_best, bound) whose anchor and span clear the reported ranges.
pub(crate) fn next_best(
    window: &EnergyWindow,
    cells: &Array2<BestInteraction>,
    reported: &ReportedRanges,
    current_best: Energy,
) -> Option<SiteCandidate> {
    let n1 = window.size1();
    let n2 = window.size2();
    let mut best: Option<SiteCandidate> = None;
    let mut best_e = E_INF;

    for i1 in (0..n1).rev() {
        if reported.r1.covers(i1) {
            continue;
        }
        for i2 in (0..n2).rev() {
            if reported.r2.covers(i2) {
                continue;
            }
            let cell = cells[(i1, i2)];
            if e_is_inf(cell.e) {
                continue;
            }
            let total = window.e_total(i1, cell.j1, i2, cell.j2, cell.e);
            if total < current_best || total >= best_e {
                continue;
            }
            let site1 = IndexRange::new(i1, cell.j1);
            let site2 = IndexRange::new(i2, cell.j2);
            if !reported.admits(&site1, &site2) {
                continue;
            }
            best = Some(SiteCandidate { i1, j1: cell.j1, i2, j2: cell.j2, energy: total });
            best_e = total;
        }
    }
    best
}

/// Report loop for the rescan-based engines: trace and emit the current
/// best, then rescan for the next best non-overlapping site.
pub(crate) fn report_with_rescan<T>(
    window: &EnergyWindow,
    cells: &Array2<BestInteraction>,
    optima: &OptimaList,
    ocon: &OutputConstraint,
    out: &mut dyn OutputHandler,
    mut trace: T,
) -> Result<(), PredictError>
where
    T: FnMut(&SiteCandidate, &mut Interaction) -> Result<(), PredictError>,
{
    if ocon.report_max == 0 {
        return Ok(());
    }
    let mut current = match optima.best() {
        Some(best) => *best,
        None => {
            report_none(window, out);
            return Ok(());
        }
    };
    let bound = report_bound(ocon, current.energy);

    let mut reported = ReportedRanges::new();
    let mut count = 0;
    while current.energy <= bound && current.energy < ocon.max_e && count < ocon.report_max {
        let mut interaction = boundary_interaction(window, &current);
        trace(&current, &mut interaction)?;
        if !interaction.is_valid() {
            return Err(PredictError::TraceFailure(format!(
                "invalid interaction for candidate {}-{} x {}-{}",
                current.i1, current.j1, current.i2, current.j2
            )));
        }
        out.add_interaction(&interaction);
        let (site1, site2) = candidate_site(&current);
        reported.record(ocon.report_overlap, site1, site2);
        count += 1;

        if count < ocon.report_max {
            match next_best(window, cells, &reported, current.energy) {
                Some(next) => current = next,
                None => break,
            }
        }
    }

    if count == 0 {
        report_none(window, out);
    }
    Ok(())
}

impl Predictor for PredictorMfe2dHeuristic<'_> {
    fn predict(
        &mut self,
        r1: &IndexRange,
        r2: &IndexRange,
        ocon: &OutputConstraint,
        out: &mut dyn OutputHandler,
    ) -> Result<(), PredictError> {
        check_range(r1, self.energy.size1())?;
        check_range(r2, self.energy.size2())?;
        debug!("predicting mfe interactions heuristically in O(n^2) space and time");

        let window = EnergyWindow::new(self.energy, r1, r2);
        let mut cells = init_cells(&window);

        // overlapping suboptimals come from the fill pass, non-overlapping
        // ones from rescans of the cell table
        let capacity = match ocon.report_overlap {
            ReportOverlap::Both => ocon.report_max,
            _ => 1,
        };
        let mut optima = OptimaList::new(ocon.max_e, capacity);

        let tracker = &mut self.tracker;
        fill_cells(&window, &mut cells, |i1, i2, cell, total| {
            if let Some(tracker) = tracker {
                tracker.update_optimum_called(
                    i1 + window.offset1(),
                    cell.j1 + window.offset1(),
                    i2 + window.offset2(),
                    cell.j2 + window.offset2(),
                    total,
                );
            }
            optima.update(i1, cell.j1, i2, cell.j2, total);
        });

        match ocon.report_overlap {
            ReportOverlap::Both => {
                report_candidates(&optima, &window, ocon, out, |candidate, interaction| {
                    trace_cells(
                        &window,
                        &cells,
                        candidate.i1,
                        candidate.j1,
                        candidate.i2,
                        candidate.j2,
                        interaction,
                    )
                })
            }
            _ => report_with_rescan(&window, &cells, &optima, ocon, out, |candidate, interaction| {
                trace_cells(
                    &window,
                    &cells,
                    candidate.i1,
                    candidate.j1,
                    candidate.i2,
                    candidate.j2,
                    interaction,
                )
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use df_energy::{BasePairModel, EsInit, InteractionEnergy, ReverseAccessibility};

    use crate::InteractionCollector;
    use crate::PairProfileTracker;
    use crate::mfe2d::PredictorMfe2d;
    use crate::mfe2d::tests::accessibilities;

    fn predict_one(s1: &str, s2: &str) -> Interaction {
        let (acc1, acc2) = accessibilities(s1, s2);
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2dHeuristic::new(&energy, None);
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
    fn test_full_duplex() {
        let interaction = predict_one("AAAA", "UUUU");
        assert_eq!(interaction.energy, -400);
        assert_eq!(interaction.base_pairs, vec![(0, 3), (1, 2), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_self_complementary_duplex() {
        let interaction = predict_one("ACGU", "ACGU");
        assert_eq!(interaction.energy, -400);
        assert_eq!(interaction.base_pairs, vec![(0, 3), (1, 2), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_single_pair() {
        let interaction = predict_one("AAAA", "AAAU");
        assert_eq!(interaction.energy, -100);
        assert_eq!(interaction.base_pairs, vec![(0, 3)]);
    }

    #[test]
    fn test_no_interaction_report() {
        let interaction = predict_one("AAAA", "AAAA");
        assert!(interaction.is_empty());
        assert_eq!(interaction.energy, 0);
    }

    #[test]
    fn test_heuristic_not_better_than_exact() {
        // the heuristic keeps one right boundary per anchor, so its mfe
        // is never below the exact one
        let cases = [
            ("ACGUACGU", "ACGUACGU"),
            ("GGGAAAACCC", "GGGAAAACCC"),
            ("AACCAAGG", "CCUUGGUU"),
            ("AGUCAGUC", "GACUGACU"),
        ];
        for (s1, s2) in cases {
            let (acc1, acc2) = accessibilities(s1, s2);
            let racc2 = ReverseAccessibility::new(&acc2);
            let model = BasePairModel::default();
            let energy =
                InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);

            let mut exact_out = InteractionCollector::new();
            PredictorMfe2d::new(&energy, None)
                .predict(
                    &IndexRange::default(),
                    &IndexRange::default(),
                    &OutputConstraint::default(),
                    &mut exact_out,
                )
                .unwrap();

            let mut heuristic_out = InteractionCollector::new();
            PredictorMfe2dHeuristic::new(&energy, None)
                .predict(
                    &IndexRange::default(),
                    &IndexRange::default(),
                    &OutputConstraint::default(),
                    &mut heuristic_out,
                )
                .unwrap();

            let exact = &exact_out.interactions[0];
            let heuristic = &heuristic_out.interactions[0];
            assert!(
                heuristic.energy >= exact.energy,
                "heuristic {} better than exact {} on {}x{}",
                heuristic.energy,
                exact.energy,
                s1,
                s2
            );
        }
    }

    #[test]
    fn test_non_overlapping_rescan() {
        let (acc1, acc2) = accessibilities("AACCCAA", "UUUUUUU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 1, 1, 0, false, EsInit::None);
        let mut predictor = PredictorMfe2dHeuristic::new(&energy, None);
        let mut collector = InteractionCollector::new();
        let ocon = OutputConstraint {
            report_max: 3,
            report_overlap: ReportOverlap::None,
            ..OutputConstraint::default()
        };
        predictor
            .predict(&IndexRange::default(), &IndexRange::default(), &ocon, &mut collector)
            .unwrap();
        let found: Vec<_> = collector.found().collect();
        assert!(found.len() >= 2);
        for (a, b) in found.iter().zip(found.iter().skip(1)) {
            assert!(a.energy <= b.energy);
        }
        // pairwise disjoint on both strands
        for i in 0..found.len() {
            for j in i + 1..found.len() {
                let (a1, b1) = (found[i].range1().unwrap(), found[j].range1().unwrap());
                assert!(a1.to < b1.from || b1.to < a1.from);
                let (a2, b2) = (found[i].range2().unwrap(), found[j].range2().unwrap());
                let (a2, b2) = (
                    IndexRange::new(a2.to, a2.from),
                    IndexRange::new(b2.to, b2.from),
                );
                assert!(a2.to < b2.from || b2.to < a2.from);
            }
        }
    }

    #[test]
    fn test_tracker_sees_every_cell_update() {
        let (acc1, acc2) = accessibilities("AAAA", "UUUU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut tracker = PairProfileTracker::new();
        let mut predictor = PredictorMfe2dHeuristic::new(&energy, Some(&mut tracker));
        let mut collector = InteractionCollector::new();
        predictor
            .predict(
                &IndexRange::default(),
                &IndexRange::default(),
                &OutputConstraint::default(),
                &mut collector,
            )
            .unwrap();
        // one update per pairable cell: all 16 A-U combinations
        assert_eq!(tracker.calls(), 16);
        assert_eq!(tracker.pair_profile(0, 0).unwrap().1, -400);
    }
}
