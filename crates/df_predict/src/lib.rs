/// Output constraints, handlers and collectors.
mod output;

/// Observer hook for updateOptimum calls.
mod tracker;

/// Seed enumeration and lookup.
mod seed;

/// Best-K bookkeeping shared by the MFE engines.
mod optima;

/// The predictor contract and its error type.
mod predictor;

/// Exact 2D predictor and its seed variant.
mod mfe2d;
mod mfe2d_seed;

/// Heuristic single-cell-per-anchor predictor and its seed variant.
mod heuristic;
mod heuristic_seed;

/// Boltzmann-sum predictor for the most probable site.
mod maxprob;

pub use output::*;
pub use tracker::*;
pub use seed::*;
pub use predictor::*;
pub use mfe2d::*;
pub use mfe2d_seed::*;
pub use heuristic::*;
pub use heuristic_seed::*;
pub use maxprob::*;
