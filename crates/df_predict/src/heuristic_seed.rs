use log::debug;

use df_structure::IndexRange;
use df_structure::Interaction;
use df_structure::{E_INF, e_is_inf, e_sum};

use df_energy::EnergyWindow;
use df_energy::InteractionEnergy;

use ndarray::Array2;

use crate::OutputConstraint;
use crate::OutputHandler;
use crate::PredictError;
use crate::Predictor;
use crate::PredictionTracker;
use crate::ReportOverlap;
use crate::SeedHandler;
use crate::heuristic::BestInteraction;
use crate::heuristic::NO_INTERACTION;
use crate::heuristic::fill_cells;
use crate::heuristic::init_cells;
use crate::heuristic::next_best;
use crate::heuristic::report_with_rescan;
use crate::heuristic::trace_cells;
use crate::optima::OptimaList;
use crate::optima::report_candidates;
use crate::predictor::check_range;

/// Heuristic predictor restricted to seed-containing interactions: a
/// second cell table holds, per left anchor, the best interaction that
/// contains a seed; only those cells report optima.
pub struct PredictorMfe2dHeuristicSeed<'a> {
    energy: &'a InteractionEnergy<'a>,
    seed: &'a mut SeedHandler,
    tracker: Option<&'a mut dyn PredictionTracker>,
}

impl<'a> PredictorMfe2dHeuristicSeed<'a> {
    pub fn new(
        energy: &'a InteractionEnergy<'a>,
        seed: &'a mut SeedHandler,
        tracker: Option<&'a mut dyn PredictionTracker>,
    ) -> Self {
        PredictorMfe2dHeuristicSeed { energy, seed, tracker }
    }
}

/// Fills the seed cell table against the already filled plain cells.
fn fill_seed_cells(
    window: &EnergyWindow,
    seed: &SeedHandler,
    cells: &Array2<BestInteraction>,
    seed_cells: &mut Array2<BestInteraction>,
    mut on_cell: impl FnMut(usize, usize, &BestInteraction, df_structure::Energy),
) {
    let n1 = window.size1();
    let n2 = window.size2();
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();

    for i1 in (0..n1).rev() {
        for i2 in (0..n2).rev() {
            let mut best = NO_INTERACTION;
            let mut best_total = E_INF;

            // a seed starting here, extended by the best plain right side
            // from its right anchor
            let seed_e = seed.seed_e(i1, i2);
            if !e_is_inf(seed_e) {
                if let Some((s1, s2)) = seed.seed_end(i1, i2) {
                    if s1 < n1 && s2 < n2 {
                        let right = cells[(s1, s2)];
                        if !e_is_inf(right.e)
                            && right.j1 + 1 - i1 <= window.max_length1()
                            && right.j2 + 1 - i2 <= window.max_length2()
                        {
                            let e = e_sum(seed_e, right.e);
                            let total = window.e_total(i1, right.j1, i2, right.j2, e);
                            if total < best_total {
                                best = BestInteraction { e, j1: right.j1, j2: right.j2 };
                                best_total = total;
                            }
                        }
                    }
                }
            }

            // or one internal loop into a seed-containing cell
            if window.is_accessible1(i1)
                && window.is_accessible2(i2)
                && window.are_complementary(i1, i2)
            {
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
                        let right = seed_cells[(k1, k2)];
                        if e_is_inf(right.e) {
                            continue;
                        }
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
            }

            seed_cells[(i1, i2)] = best;
            if !e_is_inf(best.e) {
                on_cell(i1, i2, &best, best_total);
            }
        }
    }
}

/// Walks the seed cell table: loop steps until a seed start explains the
/// cell, then the seed pairs and the plain cell table for the remainder.
fn trace_seed_cells(
    window: &EnergyWindow,
    seed: &SeedHandler,
    cells: &Array2<BestInteraction>,
    seed_cells: &Array2<BestInteraction>,
    i1: usize,
    j1: usize,
    i2: usize,
    j2: usize,
    interaction: &mut Interaction,
) -> Result<(), PredictError> {
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();
    let (mut i1, mut i2) = (i1, i2);
    let mut cur = seed_cells[(i1, i2)].e;

    loop {
        // seed explanation of the current cell?
        let seed_e = seed.seed_e(i1, i2);
        if !e_is_inf(seed_e) {
            if let Some((s1, s2)) = seed.seed_end(i1, i2) {
                if s1 <= j1 && s2 <= j2 {
                    let right = cells[(s1, s2)];
                    if !e_is_inf(right.e)
                        && right.j1 == j1
                        && right.j2 == j2
                        && cur == e_sum(seed_e, right.e)
                    {
                        let bp_left = window.base_pair(i1, i2);
                        seed.trace_seed(window, i1, i2, &mut interaction.base_pairs);
                        let bp_right = window.base_pair(s1, s2);
                        interaction.set_seed(bp_left, bp_right, seed_e);
                        return trace_cells(window, cells, s1, j1, s2, j2, interaction);
                    }
                }
            }
        }

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
                let right = seed_cells[(k1, k2)];
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
                "no seeded heuristic recursion source at ({},{}) towards ({},{})",
                i1, i2, j1, j2
            )));
        }
    }
}

impl Predictor for PredictorMfe2dHeuristicSeed<'_> {
    fn predict(
        &mut self,
        r1: &IndexRange,
        r2: &IndexRange,
        ocon: &OutputConstraint,
        out: &mut dyn OutputHandler,
    ) -> Result<(), PredictError> {
        check_range(r1, self.energy.size1())?;
        check_range(r2, self.energy.size2())?;
        debug!("predicting mfe interactions with seed heuristically");

        let window = EnergyWindow::new(self.energy, r1, r2);
        let n1 = window.size1();
        let n2 = window.size2();

        let seeds = self.seed.fill_seed(&window);
        debug!("found {} seed anchors", seeds);

        let mut cells = init_cells(&window);
        fill_cells(&window, &mut cells, |_, _, _, _| {});

        let capacity = match ocon.report_overlap {
            ReportOverlap::Both => ocon.report_max,
            _ => 1,
        };
        let mut optima = OptimaList::new(ocon.max_e, capacity);
        let mut seed_cells = Array2::from_elem((n1, n2), NO_INTERACTION);

        let tracker = &mut self.tracker;
        fill_seed_cells(&window, self.seed, &cells, &mut seed_cells, |i1, i2, cell, total| {
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

        let seed = &*self.seed;
        match ocon.report_overlap {
            ReportOverlap::Both => {
                report_candidates(&optima, &window, ocon, out, |candidate, interaction| {
                    trace_seed_cells(
                        &window,
                        seed,
                        &cells,
                        &seed_cells,
                        candidate.i1,
                        candidate.j1,
                        candidate.i2,
                        candidate.j2,
                        interaction,
                    )
                })
            }
            _ => {
                report_with_rescan(&window, &seed_cells, &optima, ocon, out, |candidate, interaction| {
                    trace_seed_cells(
                        &window,
                        seed,
                        &cells,
                        &seed_cells,
                        candidate.i1,
                        candidate.j1,
                        candidate.i2,
                        candidate.j2,
                        interaction,
                    )
                })
            }
        }
    }
}
