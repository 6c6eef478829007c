use std::io::Write;

use clap::Parser;
use clap::ArgAction;
use anyhow::Result;
use env_logger::Builder;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Random RNA sequence generation for tests and benchmarks.
#[derive(Debug, Parser)]
#[command(name = "df-randseq")]
#[command(author, version, about)]
pub struct Cli {
    /// Sequence length
    #[arg(short, long, default_value = "50")]
    pub length: usize,

    /// Number of sequences
    #[arg(short, long, default_value = "1")]
    pub number: usize,

    /// GC content in [0,1]
    #[arg(short, long, default_value = "0.5")]
    pub gc_content: f64,

    /// Seed for reproducible output
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Verbosity (-v = info, -vv = debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn random_sequence<R: Rng>(rng: &mut R, length: usize, gc_content: f64) -> String {
    (0..length)
        .map(|_| {
            if rng.random_bool(gc_content) {
                if rng.random_bool(0.5) { 'G' } else { 'C' }
            } else if rng.random_bool(0.5) {
                'A'
            } else {
                'U'
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    anyhow::ensure!(
        (0.0..=1.0).contains(&cli.gc_content),
        "GC content {} not in [0,1]",
        cli.gc_content
    );

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    for i in 0..cli.number {
        println!(">random-{}", i + 1);
        println!("{}", random_sequence(&mut rng, cli.length, cli.gc_content));
    }
    Ok(())
}
