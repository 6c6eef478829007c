use log::debug;

use df_structure::IndexRange;
use df_structure::InteractionRange;
use df_structure::e_is_inf;

use df_energy::EnergyWindow;
use df_energy::InteractionEnergy;

use ndarray::Array2;

use crate::OutputConstraint;
use crate::OutputHandler;
use crate::PredictError;
use crate::Predictor;
use crate::PredictionTracker;
use crate::optima::report_none;
use crate::predictor::check_range;

/// Widest possible partner span of an interaction over `len` positions
/// with the given maximal internal loop size.
fn max_interaction_width(len: usize, max_loop: usize) -> usize {
    if len == 0 {
        0
    } else {
        len + (len - 1) * max_loop
    }
}

/// Boltzmann-sum predictor: per left anchor (i1,i2) a width-indexed
/// matrix accumulates the hybridization partition function of all sites
/// (i1,i2)..(i1+w1,i2+w2). The total partition function Z aggregates
/// every site weighted by its non-hybrid terms; the site with the
/// largest contribution is reported as a range with its ensemble energy.
///
/// Quartic space; only a single site is reported.
pub struct PredictorMaxProb<'a> {
    energy: &'a InteractionEnergy<'a>,
    tracker: Option<&'a mut dyn PredictionTracker>,
    z: f64,
}

impl<'a> PredictorMaxProb<'a> {
    pub fn new(
        energy: &'a InteractionEnergy<'a>,
        tracker: Option<&'a mut dyn PredictionTracker>,
    ) -> Self {
        PredictorMaxProb { energy, tracker, z: 0.0 }
    }

    /// Overall partition function of the last prediction.
    pub fn total_z(&self) -> f64 {
        self.z
    }
}

impl Predictor for PredictorMaxProb<'_> {
    fn predict(
        &mut self,
        r1: &IndexRange,
        r2: &IndexRange,
        ocon: &OutputConstraint,
        out: &mut dyn OutputHandler,
    ) -> Result<(), PredictError> {
        if ocon.report_max > 1 {
            return Err(PredictError::Unsupported(
                "PredictorMaxProb cannot enumerate suboptimal interactions",
            ));
        }
        check_range(r1, self.energy.size1())?;
        check_range(r2, self.energy.size2())?;
        debug!("predicting maximally probable interaction site in O(n^4) space");

        let window = EnergyWindow::new(self.energy, r1, r2);
        let n1 = window.size1();
        let n2 = window.size2();
        let max_loop1 = window.max_internal_loop_size1();
        let max_loop2 = window.max_internal_loop_size2();

        // per-anchor width matrices, allocated for pairable anchors only
        let mut hybrid_z: Array2<Option<Array2<f64>>> = Array2::from_elem((n1, n2), None);
        for i1 in 0..n1 {
            for i2 in 0..n2 {
                if window.is_accessible1(i1)
                    && window.is_accessible2(i2)
                    && window.are_complementary(i1, i2)
                {
                    let widest = if n1 - i1 < n2 - i2 {
                        max_interaction_width(n1 - i1, max_loop1)
                    } else {
                        max_interaction_width(n2 - i2, max_loop2)
                    };
                    let w1 = window.max_length1().min(n1 - i1).min(widest);
                    let w2 = window.max_length2().min(n2 - i2).min(widest);
                    hybrid_z[(i1, i2)] = Some(Array2::zeros((w1, w2)));
                }
            }
        }

        self.z = 0.0;
        let mut best_z = 0.0_f64;
        let mut best_site = None;

        // widths increase so that every referenced sub-site is computed
        for w1 in 0..window.max_length1().min(n1) {
            for w2 in 0..window.max_length2().min(n2) {
                for i1 in 0..n1 - w1 {
                    for i2 in 0..n2 - w2 {
                        let dims = match &hybrid_z[(i1, i2)] {
                            Some(m) => m.dim(),
                            None => continue,
                        };
                        if dims.0 <= w1 || dims.1 <= w2 {
                            continue;
                        }
                        // interaction widths incompatible with the loop bounds
                        if max_interaction_width(1 + w1, max_loop1) < w2
                            || max_interaction_width(1 + w2, max_loop2) < w1
                        {
                            continue;
                        }
                        let j1 = i1 + w1;
                        let j2 = i2 + w2;

                        let mut z = 0.0;
                        if w1 == 0 && w2 == 0 {
                            z += window.boltzmann_weight(window.e_init());
                        } else if hybrid_z[(j1, j2)].is_some() {
                            // single internal loop to the right boundary
                            if w1 <= max_loop1 + 1 && w2 <= max_loop2 + 1 {
                                let right = hybrid_z[(j1, j2)].as_ref().map(|m| m[(0, 0)]);
                                if let Some(right) = right {
                                    z += window
                                        .boltzmann_weight(window.e_inter_left(i1, j1, i2, j2))
                                        * right;
                                }
                            }
                            // or a loop into an inner anchor carrying the rest
                            if w1 > 1 && w2 > 1 {
                                for k1 in i1 + 1..=(i1 + max_loop1 + 1).min(j1 - 1) {
                                    for k2 in i2 + 1..=(i2 + max_loop2 + 1).min(j2 - 1) {
                                        let inner = match &hybrid_z[(k1, k2)] {
                                            Some(m)
                                                if m.dim().0 > j1 - k1 && m.dim().1 > j2 - k2 =>
                                            {
                                                m[(j1 - k1, j2 - k2)]
                                            }
                                            _ => continue,
                                        };
                                        z += window
                                            .boltzmann_weight(window.e_inter_left(i1, k1, i2, k2))
                                            * inner;
                                    }
                                }
                            }
                        }

                        if let Some(m) = hybrid_z[(i1, i2)].as_mut() {
                            m[(w1, w2)] = z;
                        }

                        // weight the site once with its non-hybrid terms
                        let site_z = z * window.boltzmann_weight(window.e_total(i1, j1, i2, j2, 0));
                        self.z += site_z;
                        if let Some(tracker) = &mut self.tracker {
                            tracker.update_optimum_called(
                                i1 + window.offset1(),
                                j1 + window.offset1(),
                                i2 + window.offset2(),
                                j2 + window.offset2(),
                                window.e_from_z(site_z),
                            );
                        }
                        if site_z > best_z {
                            best_z = site_z;
                            best_site = Some((i1, j1, i2, j2));
                        }
                    }
                }
            }
        }

        if ocon.report_max == 0 {
            return Ok(());
        }
        match best_site {
            Some((i1, j1, i2, j2)) if !e_is_inf(window.e_from_z(best_z)) => {
                let bp_left = window.base_pair(i1, i2);
                let bp_right = window.base_pair(j1, j2);
                let mut range = InteractionRange::new(
                    std::sync::Arc::clone(window.energy().accessibility1().sequence()),
                    std::sync::Arc::clone(window.energy().accessibility2().origin().sequence()),
                );
                range.r1 = IndexRange::new(bp_left.0, bp_right.0);
                range.r2 = IndexRange::new(bp_left.1, bp_right.1);
                range.energy = window.e_from_z(best_z);
                out.add_range(&range);
            }
            _ => report_none(&window, out),
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use df_energy::{BasePairModel, EsInit, InteractionEnergy, ReverseAccessibility};

    use crate::InteractionCollector;
    use crate::mfe2d::tests::accessibilities;

    fn predict(s1: &str, s2: &str) -> (InteractionCollector, f64) {
        let (acc1, acc2) = accessibilities(s1, s2);
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMaxProb::new(&energy, None);
        let mut collector = InteractionCollector::new();
        predictor
            .predict(
                &IndexRange::default(),
                &IndexRange::default(),
                &OutputConstraint::default(),
                &mut collector,
            )
            .unwrap();
        let z = predictor.total_z();
        (collector, z)
    }

    #[test]
    fn test_most_probable_site_is_full_duplex() {
        let (collector, z) = predict("AAAA", "UUUU");
        assert!(z > 0.0);
        assert_eq!(collector.ranges.len(), 1);
        let range = &collector.ranges[0];
        assert!(range.is_sane());
        assert_eq!(range.r1, IndexRange::new(0, 3));
        assert_eq!(range.r2, IndexRange::new(3, 0));
        // ensemble energy at most the mfe of the same site
        assert!(range.energy <= -400);
    }

    #[test]
    fn test_no_site_reports_none() {
        let (collector, z) = predict("AAAA", "AAAA");
        assert_eq!(z, 0.0);
        assert!(collector.ranges.is_empty());
        assert_eq!(collector.interactions.len(), 1);
        assert!(collector.interactions[0].is_empty());
    }

    #[test]
    fn test_report_max_above_one_unsupported() {
        let (acc1, acc2) = accessibilities("AAAA", "UUUU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);
        let mut predictor = PredictorMaxProb::new(&energy, None);
        let mut collector = InteractionCollector::new();
        let ocon = OutputConstraint { report_max: 2, ..OutputConstraint::default() };
        let result = predictor.predict(
            &IndexRange::default(),
            &IndexRange::default(),
            &ocon,
            &mut collector,
        );
        assert!(matches!(result, Err(PredictError::Unsupported(_))));
    }

    #[test]
    fn test_max_interaction_width() {
        assert_eq!(max_interaction_width(1, 16), 1);
        assert_eq!(max_interaction_width(4, 2), 10);
        assert_eq!(max_interaction_width(0, 5), 0);
    }
}
