//! `skd` CLI: collision experiments, collision-rate analysis, kamikaze scoring.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim::analysis::collision_rate_rows;
use sim::experiment::{run_experiments, ExperimentConfig, ExperimentResults};
use sim::pairs::{load_pairs, PairDump};
use sim::run_log::JsonDirStore;
use sim::safe_trajs::SafeTrajectorySet;
use skd_core::augment::DEFAULT_MAX_DISPLACEMENT;
use skd_core::metrics::{score_controller, AnalysisConfig, ControllerScore};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SUMMARY_FILE: &str = "experiments_summary.json";

#[derive(Parser)]
#[command(name = "skd", about = "Pedestrian-vehicle collision experiments and kamikaze scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collision experiment grid and persist every run.
    Run {
        /// Experiment configuration (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Safe trajectory files (JSON)
        #[arg(long, required = true, num_args = 1..)]
        safe: Vec<PathBuf>,
        /// Output directory for runs and the experiment summary
        #[arg(long)]
        out: PathBuf,
        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compute collision-rate rows from an experiment summary.
    AnalyseRuns {
        #[arg(long)]
        summary: PathBuf,
        /// Write rows to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score planner-produced kamikaze pair dumps by Fréchet distance to
    /// their safe paths.
    Score {
        #[arg(long, required = true, num_args = 1..)]
        pairs: Vec<PathBuf>,
        /// Write rows to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Compare raw kamikaze paths without completing them
        #[arg(long)]
        no_augment: bool,
        /// Largest synthetic step when completing truncated paths
        #[arg(long, default_value_t = DEFAULT_MAX_DISPLACEMENT)]
        max_displacement: f64,
        /// Total records to sample per controller, split evenly over keys
        #[arg(long)]
        sample_limit: Option<usize>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            safe,
            out,
            seed,
        } => {
            run(config.as_deref(), &safe, &out, seed)?;
        }
        Commands::AnalyseRuns { summary, output } => {
            analyse_runs(&summary, output.as_deref())?;
        }
        Commands::Score {
            pairs,
            output,
            no_augment,
            max_displacement,
            sample_limit,
            seed,
        } => {
            let config = AnalysisConfig {
                max_displacement,
                augmented: !no_augment,
                sample_limit,
                seed,
                ..Default::default()
            };
            score(&pairs, &config, output.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))
        }
        None => Ok(ExperimentConfig::default()),
    }
}

fn run(config_path: Option<&Path>, safe_paths: &[PathBuf], out: &Path, seed: Option<u64>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(s) = seed {
        config.seed = s;
    }
    let sets = safe_paths
        .iter()
        .map(|p| SafeTrajectorySet::load(p))
        .collect::<Result<Vec<_>>>()?;

    println!(
        "Running {} multipliers x {} safe sets x {} repetitions (seed={})...",
        config.multipliers.len(),
        sets.len(),
        config.repetitions,
        config.seed
    );
    let start = std::time::Instant::now();

    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let mut store = JsonDirStore::new(out);
    let results = run_experiments(&config, &sets, &mut store)?;

    println!(
        "Done: {} runs, {} collisions, elapsed={:.2}s",
        results.tally.total_runs,
        results.tally.failures,
        start.elapsed().as_secs_f64()
    );

    let summary_path = out.join(SUMMARY_FILE);
    std::fs::write(&summary_path, serde_json::to_string_pretty(&results)?)?;
    println!("Summary saved to {}", summary_path.display());

    Ok(())
}

fn analyse_runs(summary_path: &Path, output_path: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(summary_path)
        .with_context(|| format!("reading {}", summary_path.display()))?;
    let results: ExperimentResults = serde_json::from_str(&text)?;
    let rows = collision_rate_rows(&results.outcomes)?;

    println!("multiplier  mean_rate  ci_low  ci_high");
    for r in &rows {
        println!(
            "{:>10.3}  {:>9.3}  {:>6.3}  {:>7.3}",
            r.multiplier, r.summary.mean, r.summary.ci_low, r.summary.ci_high
        );
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "seed": results.seed,
            "repetitions": results.repetitions,
            "tally": results.tally.to_row(),
            "rows": rows.iter().map(|r| r.to_row()).collect::<Vec<_>>(),
            "labels": rows.first().map(|r| r.rates.iter().map(|(l, _)| l.clone()).collect::<Vec<_>>()),
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Rows saved to {}", opath.display());
    }

    Ok(())
}

fn score(pair_paths: &[PathBuf], config: &AnalysisConfig, output_path: Option<&Path>) -> Result<()> {
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut scores = Vec::new();

    for path in pair_paths {
        match score_dump(load_pairs(path)?, config, &mut rng)? {
            Some(score) => scores.push(score),
            None => warn!(path = %path.display(), "no scorable pairs"),
        }
    }

    println!("multiplier  frechet_mean  ci_low  ci_high  ms_mean");
    for s in &scores {
        println!(
            "{:>10.3}  {:>12.4}  {:>6.4}  {:>7.4}  {:>7.4}",
            s.multiplier,
            s.distances.overall.mean,
            s.distances.overall.ci_low,
            s.distances.overall.ci_high,
            s.timings.overall.mean
        );
    }

    if let Some(opath) = output_path {
        let json = serde_json::json!({
            "augmented": config.augmented,
            "rows": scores.iter().map(|s| s.to_row()).collect::<Vec<_>>(),
            "grouped_variance": scores.iter().map(|s| s.distances.grouped_variance).collect::<Vec<_>>(),
            "controllers": scores,
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        println!("Scores saved to {}", opath.display());
    }

    Ok(())
}

/// Score one dump, skipping keys with fewer than two pairs. Returns `None`
/// when no key is left.
fn score_dump(dump: PairDump, config: &AnalysisConfig, rng: &mut ChaCha8Rng) -> Result<Option<ControllerScore>> {
    let multiplier = dump.multiplier;
    let mut records = dump.into_records()?;
    // Per-key statistics need at least two records.
    records.retain(|key, recs| {
        if recs.len() < 2 {
            warn!(multiplier, key = key.as_str(), n = recs.len(), "too few kamikaze pairs, skipping key");
            false
        } else {
            true
        }
    });
    if records.is_empty() {
        return Ok(None);
    }

    let start = std::time::Instant::now();
    let score = score_controller(multiplier, records, config, rng)?;
    info!(
        multiplier,
        n = score.distances.overall.size,
        elapsed_s = start.elapsed().as_secs_f64(),
        "controller scored"
    );
    Ok(Some(score))
}
