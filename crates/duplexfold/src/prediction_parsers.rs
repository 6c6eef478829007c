use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use clap::ValueEnum;

use df_structure::AccessibilityConstraint;
use df_structure::RnaSequence;
use df_structure::{Energy, E_INF, kcal_to_e};
use df_energy::{
    Accessibility, AccessibilityComputed, AccessibilityDisabled, AccessibilityFromStream,
    AccessibilityStreamMode, BasePairModel, EnergyModel, NearestNeighborModel,
};
use df_predict::{OutputConstraint, ReportOverlap, SeedConstraint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelChoice {
    /// Base pair counting, for algorithmic baselines.
    Bp,
    /// Nearest neighbor thermodynamic model.
    Nn,
}

/// Free energy evaluation parameters.
#[derive(Debug, Args)]
pub struct EnergyArguments {
    /// Energy model
    #[arg(long, value_enum, default_value = "nn")]
    pub model: ModelChoice,

    /// Temperature in Celsius
    #[arg(short, long, default_value = "37.0")]
    pub temperature: f64,

    /// Maximal unpaired positions of an internal loop on either strand
    #[arg(long, default_value = "16")]
    pub max_loop: usize,

    /// Energy offset added to every reported interaction (kcal/mol)
    #[arg(long, default_value = "0.0")]
    pub energy_add: f64,

    /// Disable dangling end contributions
    #[arg(long)]
    pub no_dangles: bool,
}

impl EnergyArguments {
    pub fn build_model(&self) -> Box<dyn EnergyModel> {
        match self.model {
            ModelChoice::Bp => Box::new(BasePairModel::default()),
            ModelChoice::Nn => Box::new(NearestNeighborModel::new(self.temperature)),
        }
    }

    pub fn energy_add(&self) -> Energy {
        kcal_to_e(self.energy_add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccessibilityChoice {
    /// No accessibility penalties.
    None,
    /// Compute from the intramolecular pairing ensemble.
    Compute,
}

/// Accessibility parameters, applied to both strands.
#[derive(Debug, Args)]
pub struct AccessibilityArguments {
    /// Accessibility mode when no table file is given
    #[arg(long, value_enum, default_value = "none")]
    pub accessibility: AccessibilityChoice,

    /// RNAplfold-like table for the target (overrides the mode)
    #[arg(long, value_name = "FILE")]
    pub ed_target: Option<PathBuf>,

    /// RNAplfold-like table for the query (overrides the mode)
    #[arg(long, value_name = "FILE")]
    pub ed_query: Option<PathBuf>,

    /// Table files hold ED values in kcal/mol instead of probabilities
    #[arg(long)]
    pub ed_values: bool,

    /// Maximal length of interacting subsequences (0 = sequence length)
    #[arg(long, default_value = "0")]
    pub max_length: usize,

    /// Maximal intramolecular base pair span (0 = sequence length)
    #[arg(long, default_value = "0")]
    pub max_bp_span: usize,
}

impl AccessibilityArguments {
    fn stream_mode(&self) -> AccessibilityStreamMode {
        if self.ed_values {
            AccessibilityStreamMode::EdValues
        } else {
            AccessibilityStreamMode::UnpairedProbabilities
        }
    }

    /// Builds the accessibility of one strand from its sequence, optional
    /// constraint encoding and optional table file.
    pub fn build(
        &self,
        sequence: Arc<RnaSequence>,
        constraint_encoding: Option<&str>,
        table: Option<&PathBuf>,
        model: &dyn EnergyModel,
    ) -> Result<Box<dyn Accessibility>> {
        let constraint = match constraint_encoding {
            Some(encoding) => {
                AccessibilityConstraint::from_string(sequence.len(), encoding, self.max_bp_span)
                    .map_err(|e| anyhow!("constraint of '{}': {}", sequence.id(), e))?
            }
            None => AccessibilityConstraint::from_string(
                sequence.len(),
                "",
                self.max_bp_span,
            )
            .expect("empty constraint encoding is valid"),
        };

        if let Some(path) = table {
            let reader = std::io::BufReader::new(
                std::fs::File::open(path)
                    .with_context(|| format!("cannot open {}", path.display()))?,
            );
            let acc = AccessibilityFromStream::from_reader(
                sequence,
                self.max_length,
                constraint,
                reader,
                self.stream_mode(),
                model.rt(),
            )?;
            return Ok(Box::new(acc));
        }

        match self.accessibility {
            AccessibilityChoice::None => {
                Ok(Box::new(AccessibilityDisabled::new(sequence, self.max_length, constraint)))
            }
            AccessibilityChoice::Compute => Ok(Box::new(AccessibilityComputed::new(
                sequence,
                self.max_length,
                constraint,
                model,
            ))),
        }
    }
}

/// Seed constraint parameters.
#[derive(Debug, Args)]
pub struct SeedArguments {
    /// Predict without a seed constraint
    #[arg(long)]
    pub no_seed: bool,

    /// Number of base pairs within the seed
    #[arg(long, default_value = "7")]
    pub seed_bp: usize,

    /// Maximal unpaired positions of the seed within the target
    #[arg(long, default_value = "0")]
    pub seed_max_up1: usize,

    /// Maximal unpaired positions of the seed within the query
    #[arg(long, default_value = "0")]
    pub seed_max_up2: usize,

    /// Maximal hybridization energy of the seed (kcal/mol)
    #[arg(long, default_value = "0.0")]
    pub seed_max_e: f64,
}

impl SeedArguments {
    pub fn build_constraint(&self) -> SeedConstraint {
        SeedConstraint::new(
            self.seed_bp,
            self.seed_bp,
            self.seed_max_up1,
            self.seed_max_up2,
            kcal_to_e(self.seed_max_e),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineChoice {
    /// Heuristic, quadratic time and space.
    Heuristic,
    /// Exact recursion, quadratic space.
    Exact,
    /// Most probable site from the Boltzmann ensemble.
    Maxprob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverlapChoice {
    /// Reported sites may overlap anywhere.
    Both,
    /// Sites may overlap in the target only.
    Seq1,
    /// Sites may overlap in the query only.
    Seq2,
    /// Sites are disjoint in both sequences.
    None,
}

impl From<OverlapChoice> for ReportOverlap {
    fn from(choice: OverlapChoice) -> Self {
        match choice {
            OverlapChoice::Both => ReportOverlap::Both,
            OverlapChoice::Seq1 => ReportOverlap::Seq1,
            OverlapChoice::Seq2 => ReportOverlap::Seq2,
            OverlapChoice::None => ReportOverlap::None,
        }
    }
}

/// Output constraints and reporting options.
#[derive(Debug, Args)]
pub struct OutputArguments {
    /// Prediction engine
    #[arg(long, value_enum, default_value = "heuristic")]
    pub engine: EngineChoice,

    /// Number of reported interactions per sequence pair
    #[arg(short = 'n', long, default_value = "1")]
    pub report_max: usize,

    /// Overlap policy among reported interactions
    #[arg(long, value_enum, default_value = "seq2")]
    pub overlap: OverlapChoice,

    /// Maximal energy of reported interactions (kcal/mol)
    #[arg(long, default_value = "0.0")]
    pub max_e: f64,

    /// Maximal energy above the mfe for suboptimals (kcal/mol)
    #[arg(long)]
    pub delta_e: Option<f64>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl OutputArguments {
    pub fn build_constraint(&self) -> OutputConstraint {
        OutputConstraint {
            report_max: self.report_max,
            report_overlap: self.overlap.into(),
            max_e: kcal_to_e(self.max_e),
            delta_e: self.delta_e.map_or(E_INF, kcal_to_e),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_model_choice() {
        let args = EnergyArguments {
            model: ModelChoice::Bp,
            temperature: 37.0,
            max_loop: 16,
            energy_add: 0.5,
            no_dangles: false,
        };
        let model = args.build_model();
        assert_eq!(model.e_init(), -100);
        assert_eq!(args.energy_add(), 50);
    }

    #[test]
    fn test_output_constraint_defaults() {
        let args = OutputArguments {
            engine: EngineChoice::Heuristic,
            report_max: 3,
            overlap: OverlapChoice::None,
            max_e: 0.0,
            delta_e: None,
            json: false,
        };
        let ocon = args.build_constraint();
        assert_eq!(ocon.report_max, 3);
        assert_eq!(ocon.report_overlap, ReportOverlap::None);
        assert_eq!(ocon.max_e, 0);
        assert_eq!(ocon.delta_e, E_INF);
    }

    #[test]
    fn test_seed_constraint() {
        let args = SeedArguments {
            no_seed: false,
            seed_bp: 5,
            seed_max_up1: 1,
            seed_max_up2: 2,
            seed_max_e: -1.0,
        };
        let constraint = args.build_constraint();
        assert_eq!(constraint.bp_min, 5);
        assert_eq!(constraint.max_unpaired1, 1);
        assert_eq!(constraint.max_unpaired2, 2);
        assert_eq!(constraint.max_e, -100);
    }

    #[test]
    fn test_accessibility_build_disabled() {
        let args = AccessibilityArguments {
            accessibility: AccessibilityChoice::None,
            ed_target: None,
            ed_query: None,
            ed_values: false,
            max_length: 0,
            max_bp_span: 0,
        };
        let model = BasePairModel::default();
        let seq = Arc::new(RnaSequence::new("t", "ACGUACGU").unwrap());
        let acc = args.build(seq, Some("..bb..xp"), None, &model).unwrap();
        assert_eq!(acc.get_ed(0, 1), 0);
        assert!(df_structure::e_is_inf(acc.get_ed(2, 4)));
    }
}
