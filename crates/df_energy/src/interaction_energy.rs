use df_structure::Base;
use df_structure::BasePair;
use df_structure::IndexRange;
use df_structure::Interaction;
use df_structure::PairTypeRNA;
use df_structure::{Energy, E_INF, e_is_inf, e_sum, e_to_kcal, kcal_to_e};

use ndarray::Array2;

use crate::Accessibility;
use crate::EnergyModel;
use crate::ReverseAccessibility;
use crate::nussinov::EnsembleConstraint;
use crate::nussinov::partition_matrix;

/// Which strands get precomputed ES matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsInit {
    None,
    Both,
}

/// Per-term breakdown of an interaction energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyContributions {
    pub init: Energy,
    pub ed1: Energy,
    pub ed2: Energy,
    pub dangle_left: Energy,
    pub dangle_right: Energy,
    pub end_left: Energy,
    pub end_right: Energy,
    pub energy_add: Energy,
    pub loops: Energy,
}

/// Composes full interaction site energies from an accessibility for the
/// first strand, a reversed accessibility for the second strand, and an
/// energy model. Both strands are indexed 5'->3'; only the emitted base
/// pairs translate back into original S2 coordinates.
pub struct InteractionEnergy<'a> {
    acc1: &'a dyn Accessibility,
    acc2: &'a ReverseAccessibility<'a>,
    model: &'a dyn EnergyModel,
    max_internal_loop_size1: usize,
    max_internal_loop_size2: usize,
    energy_add: Energy,
    with_dangles: bool,
    es1: Option<Array2<Energy>>,
    es2: Option<Array2<Energy>>,
}

impl<'a> InteractionEnergy<'a> {
    pub fn new(
        acc1: &'a dyn Accessibility,
        acc2: &'a ReverseAccessibility<'a>,
        model: &'a dyn EnergyModel,
        max_internal_loop_size1: usize,
        max_internal_loop_size2: usize,
        energy_add: Energy,
        with_dangles: bool,
        init_es: EsInit,
    ) -> Self {
        let (es1, es2) = match init_es {
            EsInit::None => (None, None),
            EsInit::Both => (
                Some(compute_es(acc1, model)),
                Some(compute_es(acc2, model)),
            ),
        };
        InteractionEnergy {
            acc1,
            acc2,
            model,
            max_internal_loop_size1,
            max_internal_loop_size2,
            energy_add,
            with_dangles,
            es1,
            es2,
        }
    }

    pub fn accessibility1(&self) -> &'a dyn Accessibility {
        self.acc1
    }

    pub fn accessibility2(&self) -> &'a ReverseAccessibility<'a> {
        self.acc2
    }

    pub fn model(&self) -> &'a dyn EnergyModel {
        self.model
    }

    pub fn size1(&self) -> usize {
        self.acc1.sequence().len()
    }

    pub fn size2(&self) -> usize {
        self.acc2.sequence().len()
    }

    pub fn max_internal_loop_size1(&self) -> usize {
        self.max_internal_loop_size1
    }

    pub fn max_internal_loop_size2(&self) -> usize {
        self.max_internal_loop_size2
    }

    pub fn energy_add(&self) -> Energy {
        self.energy_add
    }

    pub fn with_dangles(&self) -> bool {
        self.with_dangles
    }

    pub fn rt(&self) -> f64 {
        self.model.rt()
    }

    #[inline]
    fn base1(&self, i1: usize) -> Base {
        self.acc1.sequence().bases()[i1]
    }

    #[inline]
    fn base2(&self, i2: usize) -> Base {
        self.acc2.sequence().bases()[i2]
    }

    /// The pair type of the intermolecular pair (i1,i2).
    #[inline]
    pub fn pair_type(&self, i1: usize, i2: usize) -> PairTypeRNA {
        PairTypeRNA::from((self.base1(i1), self.base2(i2)))
    }

    /// Whether position i1 of strand 1 may take part in an interaction.
    pub fn is_accessible1(&self, i1: usize) -> bool {
        self.acc1.constraint().is_accessible(i1)
    }

    /// Whether position i2 of (reversed) strand 2 may take part in an
    /// interaction.
    pub fn is_accessible2(&self, i2: usize) -> bool {
        self.acc2.constraint().is_accessible(i2)
    }

    pub fn are_complementary(&self, i1: usize, i2: usize) -> bool {
        self.model.can_pair(self.base1(i1), self.base2(i2))
    }

    pub fn e_init(&self) -> Energy {
        self.model.e_init()
    }

    /// Energy of the internal loop between the pairs (i1,i2) and (k1,k2),
    /// E_INF when the loop is inadmissible: overlapping or reversed
    /// boundaries, loop sizes above the maxima, non-complementary end
    /// pairs, or covered positions excluded from interactions.
    pub fn e_inter_left(&self, i1: usize, k1: usize, i2: usize, k2: usize) -> Energy {
        if k1 <= i1 || k2 <= i2 || k1 >= self.size1() || k2 >= self.size2() {
            return E_INF;
        }
        if k1 - i1 > self.max_internal_loop_size1 + 1
            || k2 - i2 > self.max_internal_loop_size2 + 1
        {
            return E_INF;
        }
        if !self.are_complementary(i1, i2) || !self.are_complementary(k1, k2) {
            return E_INF;
        }
        if (i1..=k1).any(|p| !self.is_accessible1(p))
            || (i2..=k2).any(|p| !self.is_accessible2(p))
        {
            return E_INF;
        }
        self.model.e_inter_loop(
            self.pair_type(i1, i2),
            self.pair_type(k1, k2),
            &self.acc1.sequence().bases()[i1 + 1..k1],
            &self.acc2.sequence().bases()[i2 + 1..k2],
        )
    }

    /// Dangling end energies at the left boundary pair (i1,i2).
    pub fn e_dangling_left(&self, i1: usize, i2: usize) -> Energy {
        let bp = self.pair_type(i1, i2);
        let mut e = 0;
        if i1 > 0 {
            e += self.model.e_dangle5(bp, self.base1(i1 - 1));
        }
        if i2 > 0 {
            e += self.model.e_dangle3(bp.invert(), self.base2(i2 - 1));
        }
        e
    }

    /// Dangling end energies at the right boundary pair (j1,j2).
    pub fn e_dangling_right(&self, j1: usize, j2: usize) -> Energy {
        let bp = self.pair_type(j1, j2);
        let mut e = 0;
        if j1 + 1 < self.size1() {
            e += self.model.e_dangle3(bp, self.base1(j1 + 1));
        }
        if j2 + 1 < self.size2() {
            e += self.model.e_dangle5(bp.invert(), self.base2(j2 + 1));
        }
        e
    }

    /// Probability that the bases dangling left of the site [i1,j1]x[i2,j2]
    /// are unpaired, from the accessibility difference of the extended
    /// ranges.
    pub fn pr_dangling_left(&self, i1: usize, j1: usize, i2: usize, j2: usize) -> f64 {
        self.pr_unpaired(self.acc1, i1, j1) * self.pr_unpaired(self.acc2, i2, j2)
    }

    /// Probability that the bases dangling right of the site are unpaired.
    pub fn pr_dangling_right(&self, i1: usize, j1: usize, i2: usize, j2: usize) -> f64 {
        self.pr_unpaired_right(self.acc1, i1, j1) * self.pr_unpaired_right(self.acc2, i2, j2)
    }

    fn pr_unpaired(&self, acc: &dyn Accessibility, from: usize, to: usize) -> f64 {
        if from == 0 {
            return 1.0;
        }
        let ed = acc.get_ed(from, to);
        let ed_ext = acc.get_ed(from - 1, to);
        if e_is_inf(ed) || e_is_inf(ed_ext) {
            return 0.0;
        }
        ((e_to_kcal(ed) - e_to_kcal(ed_ext)) / self.rt()).exp().min(1.0)
    }

    fn pr_unpaired_right(&self, acc: &dyn Accessibility, from: usize, to: usize) -> f64 {
        if to + 1 >= acc.sequence().len() {
            return 1.0;
        }
        let ed = acc.get_ed(from, to);
        let ed_ext = acc.get_ed(from, to + 1);
        if e_is_inf(ed) || e_is_inf(ed_ext) {
            return 0.0;
        }
        ((e_to_kcal(ed) - e_to_kcal(ed_ext)) / self.rt()).exp().min(1.0)
    }

    /// Helix end penalty at the left boundary pair.
    pub fn e_end_left(&self, i1: usize, i2: usize) -> Energy {
        self.model.e_end(self.pair_type(i1, i2))
    }

    /// Helix end penalty at the right boundary pair.
    pub fn e_end_right(&self, j1: usize, j2: usize) -> Energy {
        self.model.e_end(self.pair_type(j1, j2))
    }

    pub fn ed1(&self, i1: usize, j1: usize) -> Energy {
        self.acc1.get_ed(i1, j1)
    }

    pub fn ed2(&self, i2: usize, j2: usize) -> Energy {
        self.acc2.get_ed(i2, j2)
    }

    /// ES value of [i,j] on strand 1; E_INF when ES values were not
    /// initialized or no intramolecular structure fits.
    pub fn es1(&self, i: usize, j: usize) -> Energy {
        self.es1.as_ref().map_or(E_INF, |es| es[(i, j)])
    }

    /// ES value of [i,j] on (reversed) strand 2.
    pub fn es2(&self, i: usize, j: usize) -> Energy {
        self.es2.as_ref().map_or(E_INF, |es| es[(i, j)])
    }

    /// Dangling end contribution of a site, Boltzmann-weighted by the
    /// probability of the dangle configuration.
    fn e_dangling_total(&self, i1: usize, j1: usize, i2: usize, j2: usize) -> Energy {
        if !self.with_dangles {
            return 0;
        }
        let left =
            e_to_kcal(self.e_dangling_left(i1, i2)) * self.pr_dangling_left(i1, j1, i2, j2);
        let right =
            e_to_kcal(self.e_dangling_right(j1, j2)) * self.pr_dangling_right(i1, j1, i2, j2);
        kcal_to_e(left) + kcal_to_e(right)
    }

    /// The total energy of a site with the given hybridization energy:
    /// hybrid + ED1 + ED2 + weighted dangles + end penalties + energy_add.
    pub fn e_total(&self, i1: usize, j1: usize, i2: usize, j2: usize, hybrid: Energy) -> Energy {
        if e_is_inf(hybrid) {
            return E_INF;
        }
        let ed1 = self.ed1(i1, j1);
        let ed2 = self.ed2(i2, j2);
        if e_is_inf(ed1) || e_is_inf(ed2) {
            return E_INF;
        }
        let mut e = e_sum(hybrid, e_sum(ed1, ed2));
        e = e_sum(e, self.e_dangling_total(i1, j1, i2, j2));
        e = e_sum(e, self.e_end_left(i1, i2));
        e = e_sum(e, self.e_end_right(j1, j2));
        e_sum(e, self.energy_add)
    }

    /// Recomputes the per-term breakdown of a reported interaction; the
    /// loop term is the remainder of the stored total.
    pub fn e_contributions(&self, interaction: &Interaction) -> EnergyContributions {
        assert!(!interaction.is_empty(), "contributions of an empty interaction");
        let first = interaction.base_pairs.first().unwrap();
        let last = interaction.base_pairs.last().unwrap();
        let i1 = self.index1(first);
        let i2 = self.index2(first);
        let j1 = self.index1(last);
        let j2 = self.index2(last);

        let mut contributions = EnergyContributions {
            init: self.e_init(),
            ed1: self.ed1(i1, j1),
            ed2: self.ed2(i2, j2),
            dangle_left: 0,
            dangle_right: 0,
            end_left: self.e_end_left(i1, i2),
            end_right: self.e_end_right(j1, j2),
            energy_add: self.energy_add,
            loops: 0,
        };
        if self.with_dangles {
            contributions.dangle_left = kcal_to_e(
                e_to_kcal(self.e_dangling_left(i1, i2)) * self.pr_dangling_left(i1, j1, i2, j2),
            );
            contributions.dangle_right = kcal_to_e(
                e_to_kcal(self.e_dangling_right(j1, j2)) * self.pr_dangling_right(i1, j1, i2, j2),
            );
        }
        contributions.loops = interaction.energy
            - contributions.init
            - contributions.ed1
            - contributions.ed2
            - contributions.dangle_left
            - contributions.dangle_right
            - contributions.end_left
            - contributions.end_right
            - contributions.energy_add;
        contributions
    }

    /// The Boltzmann weight exp(-E/RT) of an energy; 0 for E_INF.
    pub fn boltzmann_weight(&self, e: Energy) -> f64 {
        if e_is_inf(e) {
            0.0
        } else {
            (-e_to_kcal(e) / self.rt()).exp()
        }
    }

    /// The ensemble energy -RT ln(z) of a partition function value.
    pub fn e_from_z(&self, z: f64) -> Energy {
        if z <= 0.0 {
            E_INF
        } else {
            kcal_to_e(-self.rt() * z.ln())
        }
    }

    /// The base pair (i1,i2) in original S1/S2 coordinates.
    pub fn base_pair(&self, i1: usize, i2: usize) -> BasePair {
        (i1, self.acc2.reversed_index(i2))
    }

    /// The strand-1 index of a base pair in S1/S2 coordinates.
    pub fn index1(&self, bp: &BasePair) -> usize {
        bp.0
    }

    /// The (reversed) strand-2 index of a base pair in S1/S2 coordinates.
    pub fn index2(&self, bp: &BasePair) -> usize {
        self.acc2.reversed_index(bp.1)
    }
}

/// ES values: ensemble energy of all intramolecular structures of [i,j]
/// with at least one pair, -RT ln(Q(i,j) - 1); E_INF where no pair fits.
fn compute_es(acc: &dyn Accessibility, model: &dyn EnergyModel) -> Array2<Energy> {
    let bases = acc.sequence().bases();
    let n = bases.len();
    let constraint = acc.constraint();
    let rt = model.rt();

    let ensemble = EnsembleConstraint {
        pair_weight: (-e_to_kcal(model.es_pair_energy()) / rt).exp(),
        min_hairpin: model.min_hairpin_size(),
        max_span: constraint.max_bp_span(),
        forced_unpaired: (0..n)
            .map(|i| constraint.is_blocked(i) || constraint.is_marked_accessible(i))
            .collect(),
        forced_paired: vec![false; n],
    };
    let q = partition_matrix(bases, &ensemble);

    let mut es = Array2::from_elem((n, n), E_INF);
    for i in 0..n {
        for j in i..n {
            let structured = q[(i, j + 1)] - 1.0;
            if structured > 0.0 {
                es[(i, j)] = kcal_to_e(-rt * structured.ln());
            }
        }
    }
    es
}


/// The windowed view a predictor addresses during one prediction: index
/// ranges [r1.from, r1.to] x [r2.from, r2.to] mapped to local coordinates
/// starting at 0. Translation back to global (and original S2)
/// coordinates happens only where base pairs are emitted.
pub struct EnergyWindow<'a> {
    energy: &'a InteractionEnergy<'a>,
    offset1: usize,
    offset2: usize,
    size1: usize,
    size2: usize,
}

impl<'a> EnergyWindow<'a> {
    /// Clamps NA or overlong ranges to the sequence ends; requires
    /// ascending ranges.
    pub fn new(energy: &'a InteractionEnergy<'a>, r1: &IndexRange, r2: &IndexRange) -> Self {
        let to1 = r1.to.min(energy.size1() - 1);
        let to2 = r2.to.min(energy.size2() - 1);
        assert!(r1.from <= to1, "window range {} is not sane", r1);
        assert!(r2.from <= to2, "window range {} is not sane", r2);
        EnergyWindow {
            energy,
            offset1: r1.from,
            offset2: r2.from,
            size1: to1 - r1.from + 1,
            size2: to2 - r2.from + 1,
        }
    }

    pub fn energy(&self) -> &'a InteractionEnergy<'a> {
        self.energy
    }

    pub fn offset1(&self) -> usize {
        self.offset1
    }

    pub fn offset2(&self) -> usize {
        self.offset2
    }

    pub fn size1(&self) -> usize {
        self.size1
    }

    pub fn size2(&self) -> usize {
        self.size2
    }

    pub fn max_length1(&self) -> usize {
        self.energy.accessibility1().max_length()
    }

    pub fn max_length2(&self) -> usize {
        self.energy.accessibility2().max_length()
    }

    pub fn max_internal_loop_size1(&self) -> usize {
        self.energy.max_internal_loop_size1()
    }

    pub fn max_internal_loop_size2(&self) -> usize {
        self.energy.max_internal_loop_size2()
    }

    pub fn is_accessible1(&self, i1: usize) -> bool {
        self.energy.is_accessible1(i1 + self.offset1)
    }

    pub fn is_accessible2(&self, i2: usize) -> bool {
        self.energy.is_accessible2(i2 + self.offset2)
    }

    pub fn are_complementary(&self, i1: usize, i2: usize) -> bool {
        self.energy.are_complementary(i1 + self.offset1, i2 + self.offset2)
    }

    pub fn e_init(&self) -> Energy {
        self.energy.e_init()
    }

    pub fn e_inter_left(&self, i1: usize, k1: usize, i2: usize, k2: usize) -> Energy {
        self.energy.e_inter_left(
            i1 + self.offset1,
            k1 + self.offset1,
            i2 + self.offset2,
            k2 + self.offset2,
        )
    }

    pub fn e_total(&self, i1: usize, j1: usize, i2: usize, j2: usize, hybrid: Energy) -> Energy {
        self.energy.e_total(
            i1 + self.offset1,
            j1 + self.offset1,
            i2 + self.offset2,
            j2 + self.offset2,
            hybrid,
        )
    }

    pub fn boltzmann_weight(&self, e: Energy) -> f64 {
        self.energy.boltzmann_weight(e)
    }

    pub fn e_from_z(&self, z: f64) -> Energy {
        self.energy.e_from_z(z)
    }

    /// The base pair of local (i1,i2) in original S1/S2 coordinates.
    pub fn base_pair(&self, i1: usize, i2: usize) -> BasePair {
        self.energy.base_pair(i1 + self.offset1, i2 + self.offset2)
    }

    /// Local strand-1 index of a base pair in S1/S2 coordinates.
    pub fn index1(&self, bp: &BasePair) -> usize {
        self.energy.index1(bp) - self.offset1
    }

    /// Local strand-2 index of a base pair in S1/S2 coordinates.
    pub fn index2(&self, bp: &BasePair) -> usize {
        self.energy.index2(bp) - self.offset2
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use df_structure::AccessibilityConstraint;
    use df_structure::RnaSequence;

    use crate::AccessibilityDisabled;
    use crate::BasePairModel;

    fn setup(s1: &str, s2: &str) -> (AccessibilityDisabled, AccessibilityDisabled) {
        let rna1 = Arc::new(RnaSequence::new("s1", s1).unwrap());
        let rna2 = Arc::new(RnaSequence::new("s2", s2).unwrap());
        let c1 = AccessibilityConstraint::empty(rna1.len());
        let c2 = AccessibilityConstraint::empty(rna2.len());
        (
            AccessibilityDisabled::new(rna1, 0, c1),
            AccessibilityDisabled::new(rna2, 0, c2),
        )
    }

    #[test]
    fn test_data_access() {
        let (acc1, acc2) = setup("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 1, 2, 0, true, EsInit::None);

        assert_eq!(energy.max_internal_loop_size1(), 1);
        assert_eq!(energy.max_internal_loop_size2(), 2);
        assert_eq!(energy.accessibility1().sequence().as_str(), "ACGU");
        assert_eq!(energy.accessibility2().sequence().as_str(), "UGCA");
    }

    #[test]
    fn test_e_inter_left() {
        let (acc1, acc2) = setup("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 1, 2, 0, true, EsInit::None);

        // s1 = ACGU, reversed s2 = UGCA; (0,0) = A-U pairs, (1,1) = C-G
        assert!(energy.are_complementary(0, 0));
        assert!(energy.are_complementary(1, 1));
        assert!(!energy.are_complementary(0, 1));

        // stacking A-U on C-G
        assert!(energy.e_inter_left(0, 1, 0, 1) < 0);
        // overlapping boundaries
        assert!(e_is_inf(energy.e_inter_left(0, 0, 0, 1)));
        assert!(e_is_inf(energy.e_inter_left(0, 1, 0, 0)));
        // non-complementary ends
        assert!(e_is_inf(energy.e_inter_left(0, 1, 1, 2)));
        assert!(e_is_inf(energy.e_inter_left(0, 1, 0, 2)));
        // loop sizes exceeded (max_loop1 = 1)
        assert!(e_is_inf(energy.e_inter_left(0, 3, 1, 2)));
        assert!(e_is_inf(energy.e_inter_left(0, 3, 0, 3)));
    }

    #[test]
    fn test_dangles_zero_for_base_pair_model() {
        let (acc1, acc2) = setup("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 1, 2, 0, true, EsInit::None);

        assert_eq!(energy.e_dangling_left(0, 0), 0);
        assert_eq!(energy.e_dangling_left(2, 2), 0);
        assert_eq!(energy.e_dangling_right(0, 0), 0);
        assert_eq!(energy.e_dangling_right(2, 2), 0);
    }

    #[test]
    fn test_e_total_base_pair_model() {
        let (acc1, acc2) = setup("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);

        // single pair: just init
        assert_eq!(energy.e_total(0, 0, 0, 0, energy.e_init()), -100);
        // two stacked pairs
        let hybrid = e_sum(energy.e_inter_left(0, 1, 0, 1), energy.e_init());
        assert_eq!(energy.e_total(0, 1, 0, 1, hybrid), -200);
        assert!(e_is_inf(energy.e_total(0, 0, 0, 0, E_INF)));
    }

    #[test]
    fn test_energy_add() {
        let (acc1, acc2) = setup("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 150, false, EsInit::None);
        assert_eq!(energy.e_total(0, 0, 0, 0, -100), 50);
    }

    #[test]
    fn test_base_pair_mapping() {
        let (acc1, acc2) = setup("ACGU", "ACGU");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, true, EsInit::None);

        // local (0,0) = S1 0 with reversed-S2 0 = original S2 3
        assert_eq!(energy.base_pair(0, 0), (0, 3));
        assert_eq!(energy.base_pair(3, 3), (3, 0));
        assert_eq!(energy.index1(&(0, 3)), 0);
        assert_eq!(energy.index2(&(0, 3)), 0);
    }

    #[test]
    fn test_es_values() {
        let (acc1, acc2) = setup("GGGAAAACCC", "GGGAAAACCC");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, true, EsInit::Both);

        // a hairpin fits into the full range
        assert!(!e_is_inf(energy.es1(0, 9)));
        assert!(energy.es1(0, 9) < 0);
        // too short for any pair
        assert!(e_is_inf(energy.es1(3, 6)));
        assert!(e_is_inf(energy.es2(3, 6)));
    }

    #[test]
    fn test_window_offsets() {
        let (acc1, acc2) = setup("AAACGUAA", "AAACGUAA");
        let racc2 = ReverseAccessibility::new(&acc2);
        let model = BasePairModel::default();
        let energy =
            InteractionEnergy::new(&acc1, &racc2, &model, 16, 16, 0, false, EsInit::None);

        let window = EnergyWindow::new(
            &energy,
            &IndexRange::new(3, 6),
            &IndexRange::new(2, 5),
        );
        assert_eq!(window.size1(), 4);
        assert_eq!(window.size2(), 4);
        // window-local (0,*) is global (3,*): base C
        assert_eq!(
            window.are_complementary(0, 1),
            energy.are_complementary(3, 3)
        );
        let bp = window.base_pair(0, 1);
        assert_eq!(bp, energy.base_pair(3, 3));
        assert_eq!(window.index1(&bp), 0);
        assert_eq!(window.index2(&bp), 1);
    }
}
