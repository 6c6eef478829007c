use df_structure::Base;
use df_structure::PairTypeRNA;
use df_structure::{Energy, kcal_to_e};

use crate::EnergyModel;
use crate::nn_tables::*;

/// Nearest neighbor thermodynamic model over the embedded Turner-style
/// parameter tables: stacking, bulge and internal loop initiation with
/// asymmetry penalty, dangling ends, terminal A-U/G-U penalties and
/// duplex initiation.
///
/// Parameters are tabulated for 37C; other temperatures rescale RT only.
#[derive(Debug, Clone, Copy)]
pub struct NearestNeighborModel {
    temperature: f64,
}

impl NearestNeighborModel {
    pub fn new(temperature: f64) -> Self {
        NearestNeighborModel { temperature }
    }
}

impl Default for NearestNeighborModel {
    fn default() -> Self {
        NearestNeighborModel::new(37.0)
    }
}

impl EnergyModel for NearestNeighborModel {
    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn e_init(&self) -> Energy {
        DUPLEX_INIT37
    }

    fn e_inter_loop(
        &self,
        bp_left: PairTypeRNA,
        bp_right: PairTypeRNA,
        unpaired1: &[Base],
        unpaired2: &[Base],
    ) -> Energy {
        let l1 = unpaired1.len();
        let l2 = unpaired2.len();
        let left = bp_left as usize;
        let right = bp_right as usize;

        match (l1, l2) {
            // stacking
            (0, 0) => STACK37[left][right],
            // bulge; size-1 bulges keep the stacking of the closing pairs
            (0, 1) | (1, 0) => loop_init(&BULGE_INIT37, 1) + STACK37[left][right],
            (0, b) | (b, 0) => {
                let mut e = loop_init(&BULGE_INIT37, b);
                e += self.e_end(bp_left);
                e += self.e_end(bp_right);
                e
            }
            // internal loop
            (a, b) => {
                let mut e = loop_init(&INTERNAL_INIT37, a + b);
                e += NINIO_MAX37.min(a.abs_diff(b) as Energy * NINIO37);
                e += self.e_end(bp_left);
                e += self.e_end(bp_right);
                e
            }
        }
    }

    fn e_dangle5(&self, bp: PairTypeRNA, nt: Base) -> Energy {
        DANGLE5_37[bp as usize][nt as usize]
    }

    fn e_dangle3(&self, bp: PairTypeRNA, nt: Base) -> Energy {
        DANGLE3_37[bp as usize][nt as usize]
    }

    fn e_end(&self, bp: PairTypeRNA) -> Energy {
        if bp.is_ru() { TERMINAL_RU37 } else { 0 }
    }

    fn es_pair_energy(&self) -> Energy {
        // mean Watson-Crick stack, used for intramolecular ensemble
        // estimates only
        kcal_to_e(-2.0)
    }
}
