//! Nearest neighbor free energy parameters at 37C, RNA, in 1/100 kcal/mol.
//!
//! Tables are indexed by PairTypeRNA discriminants in the order
//! AU, UA, CG, GC, GU, UG, NN. NN rows/columns are zero; callers never
//! score NN pairs.

use df_structure::Energy;
use df_structure::{BCOUNT, PCOUNT};

/// Stacking of two consecutive pairs, stack[left][right] with the left
/// pair closing the helix towards 5' of strand 1. Invariant under reading
/// the duplex from the other side: stack[a][b] == stack[b'][a'] for
/// inverted pairs a', b'.
pub(crate) const STACK37: [[Energy; PCOUNT]; PCOUNT] = [
    //         AU    UA    CG    GC    GU    UG   NN
    /* AU */ [ -93, -110, -224, -208, -136, -100,   0],
    /* UA */ [-133,  -93, -235, -211, -121,  -74,   0],
    /* CG */ [-211, -208, -326, -236, -188, -210,   0],
    /* GC */ [-235, -224, -342, -326, -225, -239,   0],
    /* GU */ [ -74, -100, -239, -210,  -50,  130,   0],
    /* UG */ [-121, -136, -225, -188,   30,  -50,   0],
    /* NN */ [   0,    0,    0,    0,    0,    0,   0],
];

/// Internal loop initiation by total loop size (unpaired1 + unpaired2),
/// index 0..=30; sizes 0 and 1 never occur for true internal loops.
pub(crate) const INTERNAL_INIT37: [Energy; 31] = [
    0, 0, 100, 100, 110, 200, 200, 210, 230, 240, 250,
    260, 270, 278, 286, 294, 301, 307, 313, 319, 325,
    330, 335, 340, 345, 349, 353, 357, 361, 365, 369,
];

/// Bulge loop initiation by bulge size, index 0..=30.
pub(crate) const BULGE_INIT37: [Energy; 31] = [
    0, 380, 280, 320, 360, 400, 440, 459, 470, 480, 490,
    500, 510, 519, 527, 534, 541, 548, 554, 560, 565,
    571, 576, 580, 585, 589, 594, 598, 602, 605, 609,
];

/// Loop size beyond which initiation is extrapolated logarithmically.
pub(crate) const MAX_TABULATED_LOOP: usize = 30;

/// Scaler of the logarithmic loop size extrapolation.
pub(crate) const LXC37: f64 = 107.856;

/// Asymmetry penalty per unit of internal loop asymmetry, and its cap.
pub(crate) const NINIO37: Energy = 60;
pub(crate) const NINIO_MAX37: Energy = 300;

/// Penalty for helices ending in A-U or G-U.
pub(crate) const TERMINAL_RU37: Energy = 50;

/// One-time intermolecular duplex initiation.
pub(crate) const DUPLEX_INIT37: Energy = 410;

/// 5' dangling ends, dangle5[pair][base] with base codes N,A,C,G,U.
pub(crate) const DANGLE5_37: [[Energy; BCOUNT]; PCOUNT] = [
    //        N    A    C    G    U
    /* AU */ [0, -30, -30, -40, -20],
    /* UA */ [0, -30, -10, -20, -20],
    /* CG */ [0, -50, -30, -20, -10],
    /* GC */ [0, -20, -30, -10,  -0],
    /* GU */ [0, -30, -30, -40, -20],
    /* UG */ [0, -30, -10, -20, -20],
    /* NN */ [0,   0,   0,   0,   0],
];

/// 3' dangling ends, dangle3[pair][base].
pub(crate) const DANGLE3_37: [[Energy; BCOUNT]; PCOUNT] = [
    //        N     A     C     G     U
    /* AU */ [0,  -70,  -10,  -70,  -10],
    /* UA */ [0,  -80,  -50,  -80,  -60],
    /* CG */ [0, -110,  -40, -130,  -60],
    /* GC */ [0, -170,  -80, -170, -120],
    /* GU */ [0,  -70,  -10,  -70,  -10],
    /* UG */ [0,  -80,  -50,  -80,  -60],
    /* NN */ [0,    0,    0,    0,    0],
];

/// Loop initiation with logarithmic extrapolation beyond the tabulated
/// sizes.
pub(crate) fn loop_init(table: &[Energy; 31], size: usize) -> Energy {
    if size <= MAX_TABULATED_LOOP {
        table[size]
    } else {
        table[MAX_TABULATED_LOOP]
            + (LXC37 * (size as f64 / MAX_TABULATED_LOOP as f64).ln()).round() as Energy
    }
}
