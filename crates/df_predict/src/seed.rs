use df_structure::BasePair;
use df_structure::IndexRange;
use df_structure::{Energy, E_INF, e_is_inf, e_sum};

use df_energy::EnergyWindow;

/// Admissibility bounds for seeds: contiguous interaction fragments of
/// bp_min..=bp_max base pairs with bounded unpaired stretches per strand
/// and hybridization energy <= max_e.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedConstraint {
    pub bp_min: usize,
    pub bp_max: usize,
    pub max_unpaired1: usize,
    pub max_unpaired2: usize,
    pub max_e: Energy,
}

impl SeedConstraint {
    pub fn new(
        bp_min: usize,
        bp_max: usize,
        max_unpaired1: usize,
        max_unpaired2: usize,
        max_e: Energy,
    ) -> Self {
        assert!(bp_min >= 2, "seeds need at least 2 base pairs");
        assert!(bp_max >= bp_min, "bp_max below bp_min");
        SeedConstraint { bp_min, bp_max, max_unpaired1, max_unpaired2, max_e }
    }
}

impl Default for SeedConstraint {
    /// Seven perfectly stacked pairs of non-positive energy.
    fn default() -> Self {
        SeedConstraint::new(7, 7, 0, 0, 0)
    }
}

/// Best admissible seed for one left anchor.
#[derive(Debug, Clone, Copy)]
struct SeedCell {
    energy: Energy,
    /// pair count index (bp - 2) of the best seed
    t: usize,
    u1: usize,
    u2: usize,
}

const NO_SEED: SeedCell = SeedCell { energy: E_INF, t: 0, u1: 0, u2: 0 };

/// Enumerates all admissible seeds within a prediction window and keeps,
/// per left anchor (i1,i2), the minimum-energy one and the DP table to
/// trace its base pairs. All indices are window-local; `fill_seed` must
/// run before any lookup.
pub struct SeedHandler {
    constraint: SeedConstraint,
    n1: usize,
    n2: usize,
    table: Vec<Energy>,
    best: Vec<SeedCell>,
}

impl SeedHandler {
    pub fn new(constraint: SeedConstraint) -> Self {
        SeedHandler { constraint, n1: 0, n2: 0, table: Vec::new(), best: Vec::new() }
    }

    pub fn constraint(&self) -> &SeedConstraint {
        &self.constraint
    }

    #[inline]
    fn dims(&self) -> (usize, usize, usize) {
        (
            self.constraint.bp_max - 1,
            self.constraint.max_unpaired1 + 1,
            self.constraint.max_unpaired2 + 1,
        )
    }

    /// table(i1, i2, t, u1, u2): minimal energy of a seed fragment
    /// starting at (i1,i2) with t+2 pairs and exactly u1/u2 unpaired
    /// positions per strand.
    #[inline]
    fn table_index(&self, i1: usize, i2: usize, t: usize, u1: usize, u2: usize) -> usize {
        let (tn, un1, un2) = self.dims();
        (((i1 * self.n2 + i2) * tn + t) * un1 + u1) * un2 + u2
    }

    #[inline]
    fn table_e(&self, i1: usize, i2: usize, t: usize, u1: usize, u2: usize) -> Energy {
        self.table[self.table_index(i1, i2, t, u1, u2)]
    }

    /// Fills the seed tables for the given window; returns the number of
    /// anchors holding an admissible seed.
    pub fn fill_seed(&mut self, window: &EnergyWindow) -> usize {
        let constraint = self.constraint;
        self.n1 = window.size1();
        self.n2 = window.size2();
        let (tn, un1, un2) = self.dims();
        self.table = vec![E_INF; self.n1 * self.n2 * tn * un1 * un2];
        self.best = vec![NO_SEED; self.n1 * self.n2];

        for i1 in (0..self.n1).rev() {
            for i2 in (0..self.n2).rev() {
                for t in 0..tn {
                    for u1 in 0..un1 {
                        for u2 in 0..un2 {
                            let e = self.seed_step(window, i1, i2, t, u1, u2);
                            let idx = self.table_index(i1, i2, t, u1, u2);
                            self.table[idx] = e;
                            // admissible complete seed?
                            let bp = t + 2;
                            if bp >= constraint.bp_min
                                && !e_is_inf(e)
                                && e <= constraint.max_e
                            {
                                let best = &mut self.best[i1 * self.n2 + i2];
                                if e < best.energy {
                                    *best = SeedCell { energy: e, t, u1, u2 };
                                }
                            }
                        }
                    }
                }
            }
        }

        self.best.iter().filter(|c| !e_is_inf(c.energy)).count()
    }

    fn seed_step(
        &self,
        window: &EnergyWindow,
        i1: usize,
        i2: usize,
        t: usize,
        u1: usize,
        u2: usize,
    ) -> Energy {
        if t == 0 {
            // two pairs enclosing exactly (u1, u2) unpaired positions
            if i1 + u1 + 1 >= self.n1 || i2 + u2 + 1 >= self.n2 {
                return E_INF;
            }
            return window.e_inter_left(i1, i1 + u1 + 1, i2, i2 + u2 + 1);
        }
        let mut best = E_INF;
        for w1 in 0..=u1 {
            for w2 in 0..=u2 {
                let k1 = i1 + w1 + 1;
                let k2 = i2 + w2 + 1;
                if k1 >= self.n1 || k2 >= self.n2 {
                    continue;
                }
                let rest = self.table_e(k1, k2, t - 1, u1 - w1, u2 - w2);
                if e_is_inf(rest) {
                    continue;
                }
                let e = e_sum(window.e_inter_left(i1, k1, i2, k2), rest);
                if e < best {
                    best = e;
                }
            }
        }
        best
    }

    /// Hybridization energy of the best admissible seed with left anchor
    /// (i1,i2); E_INF when there is none.
    pub fn seed_e(&self, i1: usize, i2: usize) -> Energy {
        self.best[i1 * self.n2 + i2].energy
    }

    /// Right anchor of the best seed at (i1,i2).
    pub fn seed_end(&self, i1: usize, i2: usize) -> Option<(usize, usize)> {
        let cell = &self.best[i1 * self.n2 + i2];
        if e_is_inf(cell.energy) {
            return None;
        }
        Some((i1 + cell.t + 1 + cell.u1, i2 + cell.t + 1 + cell.u2))
    }

    /// Appends the base pairs of the best seed at (i1,i2) after the
    /// anchor, through the right anchor, in S1/S2 coordinates.
    pub fn trace_seed(&self, window: &EnergyWindow, i1: usize, i2: usize, pairs: &mut Vec<BasePair>) {
        let cell = self.best[i1 * self.n2 + i2];
        assert!(!e_is_inf(cell.energy), "trace_seed() without a seed at ({},{})", i1, i2);

        let (mut i1, mut i2) = (i1, i2);
        let (mut t, mut u1, mut u2) = (cell.t, cell.u1, cell.u2);
        let mut cur = cell.energy;
        loop {
            if t == 0 {
                pairs.push(window.base_pair(i1 + u1 + 1, i2 + u2 + 1));
                return;
            }
            let mut advanced = false;
            'search: for w1 in 0..=u1 {
                for w2 in 0..=u2 {
                    let k1 = i1 + w1 + 1;
                    let k2 = i2 + w2 + 1;
                    if k1 >= self.n1 || k2 >= self.n2 {
                        continue;
                    }
                    let rest = self.table_e(k1, k2, t - 1, u1 - w1, u2 - w2);
                    if e_is_inf(rest) {
                        continue;
                    }
                    if cur == e_sum(window.e_inter_left(i1, k1, i2, k2), rest) {
                        pairs.push(window.base_pair(k1, k2));
                        i1 = k1;
                        i2 = k2;
                        u1 -= w1;
                        u2 -= w2;
                        t -= 1;
                        cur = rest;
                        advanced = true;
                        break 'search;
                    }
                }
            }
            assert!(advanced, "seed trace lost at ({},{})", i1, i2);
        }
    }

    /// Left anchors of admissible seeds whose site overlaps the given
    /// window-local ranges.
    pub fn anchors_in(&self, r1: &IndexRange, r2: &IndexRange) -> Vec<(usize, usize)> {
        let mut anchors = Vec::new();
        for i1 in 0..self.n1 {
            for i2 in 0..self.n2 {
                if let Some((j1, j2)) = self.seed_end(i1, i2) {
                    if i1 <= r1.to && j1 >= r1.from && i2 <= r2.to && j2 >= r2.from {
                        anchors.push((i1, i2));
                    }
                }
            }
        }
        anchors
    }
}
