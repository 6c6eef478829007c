use df_structure::Base;
use df_structure::PairTypeRNA;
use df_structure::{Energy, kcal_to_e};

pub const K0: f64 = 273.15;
pub const GAS_CONSTANT: f64 = 0.001987204285; // kcal/(mol*K)

/// The primitives an intermolecular free energy model has to provide.
///
/// All energies are in 1/100 kcal/mol. Loop admissibility (maximal loop
/// sizes, blocked positions) is checked by the caller; the model only
/// scores admissible loops. Models are shared across prediction threads
/// and must support concurrent reads.
pub trait EnergyModel: Sync {
    /// Whether two bases form one of the six admissible RNA pairs.
    fn can_pair(&self, b1: Base, b2: Base) -> bool {
        PairTypeRNA::from((b1, b2)).can_pair()
    }

    /// Temperature in Celsius.
    fn temperature(&self) -> f64;

    /// RT in kcal/mol.
    fn rt(&self) -> f64 {
        GAS_CONSTANT * (self.temperature() + K0)
    }

    /// One-time cost of opening an intermolecular helix.
    fn e_init(&self) -> Energy;

    /// Energy of the internal loop enclosed by `bp_left` and `bp_right`,
    /// with the given unpaired stretches (5'->3' on their own strand).
    /// Both stretches empty means stacking.
    fn e_inter_loop(
        &self,
        bp_left: PairTypeRNA,
        bp_right: PairTypeRNA,
        unpaired1: &[Base],
        unpaired2: &[Base],
    ) -> Energy;

    /// Stabilization by the unpaired base 5'-adjacent to a helix-closing
    /// pair.
    fn e_dangle5(&self, bp: PairTypeRNA, nt: Base) -> Energy;

    /// Stabilization by the unpaired base 3'-adjacent to a helix-closing
    /// pair.
    fn e_dangle3(&self, bp: PairTypeRNA, nt: Base) -> Energy;

    /// Helix end penalty (terminal A-U / G-U).
    fn e_end(&self, bp: PairTypeRNA) -> Energy;

    /// Per-pair energy for intramolecular ensemble estimates (ES values,
    /// computed accessibilities).
    fn es_pair_energy(&self) -> Energy;

    /// Minimal number of unpaired positions enclosed by an intramolecular
    /// pair.
    fn min_hairpin_size(&self) -> usize {
        3
    }
}


/// The base pair counting model: every admissible pair contributes the
/// same energy, nothing else scores. The baseline model for algorithmic
/// tests.
#[derive(Debug, Clone, Copy)]
pub struct BasePairModel {
    pair_energy: Energy,
    temperature: f64,
}

impl BasePairModel {
    pub fn new(pair_energy_kcal: f64) -> Self {
        BasePairModel {
            pair_energy: kcal_to_e(pair_energy_kcal),
            temperature: 37.0,
        }
    }
}

impl Default for BasePairModel {
    fn default() -> Self {
        BasePairModel::new(-1.0)
    }
}

impl EnergyModel for BasePairModel {
    fn temperature(&self) -> f64 {
        self.temperature
    }

    /// The first pair of the helix.
    fn e_init(&self) -> Energy {
        self.pair_energy
    }

    /// Each extension adds exactly one pair.
    fn e_inter_loop(
        &self,
        _bp_left: PairTypeRNA,
        _bp_right: PairTypeRNA,
        _unpaired1: &[Base],
        _unpaired2: &[Base],
    ) -> Energy {
        self.pair_energy
    }

    fn e_dangle5(&self, _bp: PairTypeRNA, _nt: Base) -> Energy {
        0
    }

    fn e_dangle3(&self, _bp: PairTypeRNA, _nt: Base) -> Energy {
        0
    }

    fn e_end(&self, _bp: PairTypeRNA) -> Energy {
        0
    }

    fn es_pair_energy(&self) -> Energy {
        self.pair_energy
    }
}
