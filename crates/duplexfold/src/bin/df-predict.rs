use std::io::Write;
use std::sync::Arc;

use log::info;
use log::warn;
use colored::*;
use env_logger::Builder;
use clap::Args;
use clap::Parser;
use clap::ArgAction;
use anyhow::Result;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;

use df_structure::e_to_kcal;
use df_energy::{EsInit, InteractionEnergy, ReverseAccessibility};
use df_predict::{
    InteractionCollector, Predictor, PredictorMaxProb, PredictorMfe2d,
    PredictorMfe2dHeuristic, PredictorMfe2dHeuristicSeed, PredictorMfe2dSeed, SeedHandler,
};

use duplexfold::input_parsers::SequenceRecord;
use duplexfold::input_parsers::read_fasta_record_input;
use duplexfold::input_parsers::read_fasta_records_input;
use duplexfold::input_parsers::ruler;
use duplexfold::prediction_parsers::AccessibilityArguments;
use duplexfold::prediction_parsers::EnergyArguments;
use duplexfold::prediction_parsers::EngineChoice;
use duplexfold::prediction_parsers::OutputArguments;
use duplexfold::prediction_parsers::SeedArguments;


#[derive(Debug, Args)]
pub struct PredictInput {
    /// Target sequence file (FASTA-like, may hold several records), or "-"
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub target: String,

    /// Query sequence file (FASTA-like, first record used), or "-"
    #[arg(short, long, value_name = "FILE")]
    pub query: String,

    /// Verbosity (-v = info, -vv = debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Parser)]
#[command(name = "df-predict")]
#[command(author, version, about = "RNA-RNA interaction prediction")]
pub struct Cli {
    #[command(flatten)]
    pub input: PredictInput,

    #[command(flatten, next_help_heading = "Energy model parameters")]
    pub energy: EnergyArguments,

    #[command(flatten, next_help_heading = "Accessibility parameters")]
    pub accessibility: AccessibilityArguments,

    #[command(flatten, next_help_heading = "Seed parameters")]
    pub seed: SeedArguments,

    #[command(flatten, next_help_heading = "Output parameters")]
    pub output: OutputArguments,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            // no prefix, just the message
            writeln!(buf, "{}", record.args())
        })
        .init();
}

#[derive(Debug, Serialize)]
struct InteractionReport {
    base_pairs: Vec<(usize, usize)>,
    energy: f64,
    hybrid: Option<String>,
    range1: Option<String>,
    range2: Option<String>,
    seed: Option<SeedReport>,
    contributions: Option<ContributionReport>,
}

#[derive(Debug, Serialize)]
struct SeedReport {
    bp_left: (usize, usize),
    bp_right: (usize, usize),
    energy: f64,
}

#[derive(Debug, Serialize)]
struct ContributionReport {
    init: f64,
    loops: f64,
    ed1: f64,
    ed2: f64,
    dangle_left: f64,
    dangle_right: f64,
    end_left: f64,
    end_right: f64,
    energy_add: f64,
}

#[derive(Debug, Serialize)]
struct PairReport {
    target: String,
    query: String,
    target_sequence: String,
    query_sequence: String,
    interactions: Vec<InteractionReport>,
    sites: Vec<InteractionReport>,
    ensemble_z: Option<f64>,
}

fn predict_pair(cli: &Cli, target: &SequenceRecord, query: &SequenceRecord) -> Result<PairReport> {
    let model = cli.energy.build_model();
    let s1 = Arc::new(target.sequence.clone());
    let s2 = Arc::new(query.sequence.clone());

    let acc1 = cli.accessibility.build(
        Arc::clone(&s1),
        target.constraint.as_deref(),
        cli.accessibility.ed_target.as_ref(),
        model.as_ref(),
    )?;
    let acc2 = cli.accessibility.build(
        Arc::clone(&s2),
        query.constraint.as_deref(),
        cli.accessibility.ed_query.as_ref(),
        model.as_ref(),
    )?;
    let racc2 = ReverseAccessibility::new(acc2.as_ref());

    let energy = InteractionEnergy::new(
        acc1.as_ref(),
        &racc2,
        model.as_ref(),
        cli.energy.max_loop,
        cli.energy.max_loop,
        cli.energy.energy_add(),
        !cli.energy.no_dangles,
        EsInit::None,
    );

    let ocon = cli.output.build_constraint();
    let full = df_structure::IndexRange::default();
    let mut collector = InteractionCollector::new();
    let mut ensemble_z = None;

    let with_seed = !cli.seed.no_seed;
    match cli.output.engine {
        EngineChoice::Heuristic if with_seed => {
            let mut seed = SeedHandler::new(cli.seed.build_constraint());
            PredictorMfe2dHeuristicSeed::new(&energy, &mut seed, None)
                .predict(&full, &full, &ocon, &mut collector)?;
        }
        EngineChoice::Heuristic => {
            PredictorMfe2dHeuristic::new(&energy, None)
                .predict(&full, &full, &ocon, &mut collector)?;
        }
        EngineChoice::Exact if with_seed => {
            let mut seed = SeedHandler::new(cli.seed.build_constraint());
            PredictorMfe2dSeed::new(&energy, &mut seed, None)
                .predict(&full, &full, &ocon, &mut collector)?;
        }
        EngineChoice::Exact => {
            PredictorMfe2d::new(&energy, None).predict(&full, &full, &ocon, &mut collector)?;
        }
        EngineChoice::Maxprob => {
            if with_seed {
                warn!("{} seed constraints are ignored by the maxprob engine", "WARNING:".red());
            }
            let mut predictor = PredictorMaxProb::new(&energy, None);
            predictor.predict(&full, &full, &ocon, &mut collector)?;
            ensemble_z = Some(predictor.total_z());
        }
    }

    let interactions = collector
        .found()
        .map(|interaction| InteractionReport {
            base_pairs: interaction.base_pairs.clone(),
            energy: e_to_kcal(interaction.energy),
            hybrid: Some(interaction.dot_bar()),
            range1: interaction.range1().map(|r| r.to_string()),
            range2: interaction.range2().map(|r| r.to_string()),
            seed: interaction.seed.map(|s| SeedReport {
                bp_left: s.bp_left,
                bp_right: s.bp_right,
                energy: e_to_kcal(s.energy),
            }),
            contributions: {
                let c = energy.e_contributions(interaction);
                Some(ContributionReport {
                    init: e_to_kcal(c.init),
                    loops: e_to_kcal(c.loops),
                    ed1: e_to_kcal(c.ed1),
                    ed2: e_to_kcal(c.ed2),
                    dangle_left: e_to_kcal(c.dangle_left),
                    dangle_right: e_to_kcal(c.dangle_right),
                    end_left: e_to_kcal(c.end_left),
                    end_right: e_to_kcal(c.end_right),
                    energy_add: e_to_kcal(c.energy_add),
                })
            },
        })
        .collect();

    let sites = collector
        .ranges
        .iter()
        .map(|range| InteractionReport {
            base_pairs: Vec::new(),
            energy: e_to_kcal(range.energy),
            hybrid: None,
            range1: Some(range.r1.to_string()),
            range2: Some(range.r2.to_string()),
            seed: None,
            contributions: None,
        })
        .collect();

    Ok(PairReport {
        target: target.id().to_string(),
        query: query.id().to_string(),
        target_sequence: s1.as_str().to_string(),
        query_sequence: s2.as_str().to_string(),
        interactions,
        sites,
        ensemble_z,
    })
}

fn print_report(report: &PairReport) {
    println!("{}", format!("> {} vs {}", report.target, report.query).yellow());
    info!("{}", ruler(report.target_sequence.len() - 1).magenta());
    println!("{}", report.target_sequence);

    for interaction in &report.interactions {
        let hybrid = interaction.hybrid.as_deref().unwrap_or("");
        println!(
            "{} {} {}",
            hybrid,
            format!("{:>7.2}", interaction.energy).green(),
            format!(
                "[{} & {}]",
                interaction.range1.as_deref().unwrap_or("-"),
                interaction.range2.as_deref().unwrap_or("-")
            )
            .cyan()
        );
        if let Some(seed) = &interaction.seed {
            info!(
                "seed {:?}..{:?} {}",
                seed.bp_left,
                seed.bp_right,
                format!("{:>7.2}", seed.energy).green()
            );
        }
        if let Some(c) = &interaction.contributions {
            info!(
                "E = init {:.2} + loops {:.2} + ED1 {:.2} + ED2 {:.2} + dangles {:.2} + ends {:.2} + add {:.2}",
                c.init,
                c.loops,
                c.ed1,
                c.ed2,
                c.dangle_left + c.dangle_right,
                c.end_left + c.end_right,
                c.energy_add
            );
        }
    }
    for site in &report.sites {
        println!(
            "site {} & {} {}",
            site.range1.as_deref().unwrap_or("-"),
            site.range2.as_deref().unwrap_or("-"),
            format!("{:>7.2}", site.energy).green()
        );
    }
    if let Some(z) = report.ensemble_z {
        info!("ensemble partition function Z = {:e}", z);
    }
    if report.interactions.is_empty() && report.sites.is_empty() {
        println!("{}", "no favorable interaction found".red());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.input.verbose);

    let query = read_fasta_record_input(&cli.input.query)?;
    let targets = read_fasta_records_input(&cli.input.target)?;

    let progress = if targets.len() > 1 && !cli.output.json {
        Some(ProgressBar::new(targets.len() as u64))
    } else {
        None
    };

    let reports: Result<Vec<PairReport>> = targets
        .par_iter()
        .map(|target| {
            let report = predict_pair(&cli, target, &query);
            if let Some(progress) = &progress {
                progress.inc(1);
            }
            report
        })
        .collect();
    let reports = reports?;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if cli.output.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}
