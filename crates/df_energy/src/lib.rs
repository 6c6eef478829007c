/// The energy model trait and the base pair counting model.
mod energy_model;

/// Embedded nearest neighbor parameter tables.
mod nn_tables;

/// The nearest neighbor thermodynamic model.
mod nn_model;

/// Boltzmann-weighted pairing ensembles (intramolecular).
mod nussinov;

/// The accessibility trait, banded ED storage and the disabled variant.
mod accessibility;

/// Accessibility parsed from RNAplfold-like text streams.
mod acc_from_stream;

/// Accessibility computed from the pairing ensemble.
mod acc_computed;

/// Reversed view onto another accessibility.
mod acc_reversed;

/// Interaction energy composition and the prediction window view.
mod interaction_energy;

pub use energy_model::*;
pub use nn_model::*;
pub use accessibility::*;
pub use acc_from_stream::*;
pub use acc_computed::*;
pub use acc_reversed::*;
pub use interaction_energy::*;
