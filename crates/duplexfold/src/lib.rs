//! # duplexfold
//!
//! The main entry point for the duplexfold RNA-RNA interaction prediction
//! package, with interfaces to multiple crates that are organized as a
//! workspace. At this level, you can also find argument parsers for the
//! binaries shipped with the duplexfold package.
//!
//! This crate re-exports the main functionality from its submodules.


/// Exposing duplexfold::structure. Sequences, index ranges, constraints
/// and interaction representations.
pub mod structure {
    pub use ::df_structure::*;
}

/// Exposing duplexfold::energy. Energy models, accessibilities and
/// interaction energy composition.
pub mod energy {
    pub use ::df_energy::*;
}

/// Exposing duplexfold::predict. Seed handling and the interaction
/// prediction engines.
pub mod predict {
    pub use ::df_predict::*;
}

/// Various flavors of handling sequence/constraint input.
pub mod input_parsers;

/// Exposing the currently supported options of duplexfold's prediction
/// pipeline as clap argument groups.
pub mod prediction_parsers;
