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
use crate::SeedHandler;
use crate::mfe2d::fill_hybrid;
use crate::mfe2d::pool_size;
use crate::mfe2d::trace_hybrid;
use crate::optima::OptimaList;
use crate::optima::report_candidates;
use crate::predictor::check_range;

/// Exact predictor restricted to interactions containing a seed: next to
/// the plain per-boundary matrix, a second matrix holds the minimal
/// hybridization energy of seed-containing interactions. Only the seed
/// matrix reports optima.
pub struct PredictorMfe2dSeed<'a> {
    energy: &'a InteractionEnergy<'a>,
    seed: &'a mut SeedHandler,
    tracker: Option<&'a mut dyn PredictionTracker>,
}

impl<'a> PredictorMfe2dSeed<'a> {
    pub fn new(
        energy: &'a InteractionEnergy<'a>,
        seed: &'a mut SeedHandler,
        tracker: Option<&'a mut dyn PredictionTracker>,
    ) -> Self {
        PredictorMfe2dSeed { energy, seed, tracker }
    }
}

/// Fills the seed-containing matrix for the fixed right boundary (j1,j2).
/// A cell either starts a seed extended by the plain matrix from the
/// seed's right anchor, or steps one internal loop into another
/// seed-containing cell. Requires `hybrid` to be filled for (j1,j2).
fn fill_hybrid_seed(
    window: &EnergyWindow,
    seed: &SeedHandler,
    j1: usize,
    j2: usize,
    hybrid: &Array2<Energy>,
    hybrid_seed: &mut Array2<Energy>,
    mut on_cell: impl FnMut(usize, usize, Energy),
) {
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();
    let i1_min = (j1 + 1).saturating_sub(window.max_length1());
    let i2_min = (j2 + 1).saturating_sub(window.max_length2());

    for i1 in (i1_min..=j1).rev() {
        for i2 in (i2_min..=j2).rev() {
            let mut e = E_INF;

            // a seed starting at (i1,i2), extended right by the plain
            // recursion from its right anchor
            let seed_e = seed.seed_e(i1, i2);
            if !e_is_inf(seed_e) {
                if let Some((s1, s2)) = seed.seed_end(i1, i2) {
                    if s1 <= j1 && s2 <= j2 && !e_is_inf(hybrid[(s1, s2)]) {
                        e = e_sum(seed_e, hybrid[(s1, s2)]);
                    }
                }
            }

            // or one internal loop into a seed-containing cell
            if window.are_complementary(i1, i2)
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
                        let right = hybrid_seed[(k1, k2)];
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

            hybrid_seed[(i1, i2)] = e;
            if !e_is_inf(e) {
                on_cell(i1, i2, e);
            }
        }
    }
}

/// Walks the seed matrix from (i1,i2) to (j1,j2): loop steps until the
/// cell is explained by a seed start, then the seed pairs and the plain
/// recursion for the remainder.
fn trace_hybrid_seed(
    window: &EnergyWindow,
    seed: &SeedHandler,
    hybrid: &Array2<Energy>,
    hybrid_seed: &Array2<Energy>,
    i1: usize,
    j1: usize,
    i2: usize,
    j2: usize,
    interaction: &mut Interaction,
) -> Result<(), PredictError> {
    let max_loop1 = window.max_internal_loop_size1();
    let max_loop2 = window.max_internal_loop_size2();
    let (mut i1, mut i2) = (i1, i2);
    let mut cur = hybrid_seed[(i1, i2)];

    loop {
        // seed explanation of the current cell?
        let seed_e = seed.seed_e(i1, i2);
        if !e_is_inf(seed_e) {
            if let Some((s1, s2)) = seed.seed_end(i1, i2) {
                if s1 <= j1
                    && s2 <= j2
                    && !e_is_inf(hybrid[(s1, s2)])
                    && cur == e_sum(seed_e, hybrid[(s1, s2)])
                {
                    let bp_left = window.base_pair(i1, i2);
                    seed.trace_seed(window, i1, i2, &mut interaction.base_pairs);
                    let bp_right = window.base_pair(s1, s2);
                    interaction.set_seed(bp_left, bp_right, seed_e);
                    // remainder through the plain recursion
                    return trace_hybrid(window, hybrid, s1, j1, s2, j2, interaction);
                }
            }
        }

        // otherwise a loop step into the next seed-containing cell
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
                let right = hybrid_seed[(k1, k2)];
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
                "no seeded recursion source at ({},{}) towards ({},{})",
                i1, i2, j1, j2
            )));
        }
    }
}

impl Predictor for PredictorMfe2dSeed<'_> {
    fn predict(
        &mut self,
        r1: &IndexRange,
        r2: &IndexRange,
        ocon: &OutputConstraint,
        out: &mut dyn OutputHandler,
    ) -> Result<(), PredictError> {
        check_range(r1, self.energy.size1())?;
        check_range(r2, self.energy.size2())?;
        debug!("predicting mfe interactions with seed in O(n^2) space");

        let window = EnergyWindow::new(self.energy, r1, r2);
        let n1 = window.size1();
        let n2 = window.size2();

        let seeds = self.seed.fill_seed(&window);
        debug!("found {} seed anchors", seeds);

        let mut optima = OptimaList::new(ocon.max_e, pool_size(ocon));
        let mut hybrid = Array2::from_elem((n1, n2), E_INF);
        let mut hybrid_seed = Array2::from_elem((n1, n2), E_INF);

        for j1 in 0..n1 {
            for j2 in 0..n2 {
                if !window.are_complementary(j1, j2)
                    || !window.is_accessible1(j1)
                    || !window.is_accessible2(j2)
                {
                    continue;
                }
                fill_hybrid(&window, j1, j2, &mut hybrid, |_, _, _| {});
                let tracker = &mut self.tracker;
                fill_hybrid_seed(
                    &window,
                    self.seed,
                    j1,
                    j2,
                    &hybrid,
                    &mut hybrid_seed,
                    |i1, i2, e| {
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
                    },
                );
            }
        }

        let seed = &*self.seed;
        report_candidates(&optima, &window, ocon, out, |candidate, interaction| {
            fill_hybrid(&window, candidate.j1, candidate.j2, &mut hybrid, |_, _, _| {});
            fill_hybrid_seed(
                &window,
                seed,
                candidate.j1,
                candidate.j2,
                &hybrid,
                &mut hybrid_seed,
                |_, _, _| {},
            );
            trace_hybrid_seed(
                &window,
                seed,
                &hybrid,
                &hybrid_seed,
                candidate.i1,
                candidate.j1,
                candidate.i2,
                candidate.j2,
                interaction,
            )
        })
    }
}
