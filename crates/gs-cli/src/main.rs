//! gammasens CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use gs_core::SensitivityTable;
use gs_events::{EnergyBinning, EnergyColumn};
use gs_inference::{BackgroundStrategy, BinnedSensitivityPipeline, attach_flux};
use std::path::{Path, PathBuf};

mod config;
mod load;

use config::{AnalysisConfig, read_analysis_config};
use load::{InputFiles, load_samples};

#[derive(Parser)]
#[command(name = "gammasens")]
#[command(about = "gammasens - Point-source sensitivity of gamma-ray telescope arrays")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize cuts and compute the sensitivity per energy bin
    Sensitivity {
        /// Simulated gammas (Parquet)
        gamma: PathBuf,

        /// Simulated protons (Parquet)
        proton: PathBuf,

        /// Simulated electrons (Parquet)
        electron: PathBuf,

        /// Analysis config (YAML or JSON). Flags below override it.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Background estimation method (exact, simple, histogram, extrapolate)
        #[arg(long)]
        method: Option<BackgroundStrategy>,

        /// On/off exposure ratio
        #[arg(long)]
        alpha: Option<f64>,

        /// Minimum number of triggered telescopes
        #[arg(short, long)]
        multiplicity: Option<u32>,

        /// Observation time (hours)
        #[arg(short, long)]
        t_obs: Option<f64>,

        /// Base seed for the Monte-Carlo scaling
        #[arg(long)]
        seed: Option<u64>,

        /// Threads (0 = auto)
        #[arg(long)]
        threads: Option<usize>,

        /// Monte-Carlo trials per energy bin
        #[arg(long)]
        n_trials: Option<usize>,

        /// Bin in true instead of reconstructed energy
        #[arg(long)]
        true_energy: bool,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version
    Version,
}

/// Command-line overrides applied on top of the config file.
struct Overrides {
    method: Option<BackgroundStrategy>,
    alpha: Option<f64>,
    multiplicity: Option<u32>,
    t_obs: Option<f64>,
    seed: Option<u64>,
    threads: Option<usize>,
    n_trials: Option<usize>,
    true_energy: bool,
}

impl Overrides {
    fn apply(self, cfg: &mut AnalysisConfig) {
        let s = &mut cfg.sensitivity;
        match (self.method, s.strategy) {
            // Keep a configured smoothing width when only the method is named.
            (Some(BackgroundStrategy::Extrapolate { .. }), BackgroundStrategy::Extrapolate { .. }) => {}
            (Some(m), _) => s.strategy = m,
            (None, _) => {}
        }
        if let Some(alpha) = self.alpha {
            s.alpha = alpha;
        }
        if let Some(seed) = self.seed {
            s.seed = Some(seed);
        }
        if let Some(threads) = self.threads {
            s.threads = threads;
        }
        if let Some(n) = self.n_trials {
            s.scaler.n_trials = n;
        }
        if self.true_energy {
            s.energy = EnergyColumn::True;
        }
        if let Some(m) = self.multiplicity {
            cfg.multiplicity = m;
        }
        if let Some(t) = self.t_obs {
            cfg.observation.t_obs_hours = t;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Sensitivity {
            gamma,
            proton,
            electron,
            config,
            method,
            alpha,
            multiplicity,
            t_obs,
            seed,
            threads,
            n_trials,
            true_energy,
            output,
        } => {
            let overrides =
                Overrides { method, alpha, multiplicity, t_obs, seed, threads, n_trials, true_energy };
            let files = InputFiles { gamma: &gamma, proton: &proton, electron: &electron };
            cmd_sensitivity(&files, config.as_deref(), overrides, output.as_ref())
        }
        Commands::Version => {
            println!("gammasens {}", gs_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_sensitivity(
    files: &InputFiles<'_>,
    config: Option<&Path>,
    overrides: Overrides,
    output: Option<&PathBuf>,
) -> Result<()> {
    let mut cfg = match config {
        Some(path) => read_analysis_config(path)?,
        None => AnalysisConfig::default(),
    };
    overrides.apply(&mut cfg);

    // Validate before touching the (possibly large) input files.
    let pipeline = BinnedSensitivityPipeline::new(cfg.sensitivity)?;
    let binning = cfg.binning.build()?;

    let samples = load_samples(files, &cfg)?;
    let mut table = pipeline.run(&samples.signal, &samples.background, &binning)?;
    attach_flux(&mut table, &binning, &cfg.target.gamma)?;

    for row in table.undefined_bins() {
        tracing::warn!(e_min = row.bin.low, e_max = row.bin.high, "no sensitivity in bin");
    }

    write_json(output, report_json(&cfg, &binning, &table))
}

fn report_json(
    cfg: &AnalysisConfig,
    binning: &EnergyBinning,
    table: &SensitivityTable,
) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .zip(binning.centers())
        .zip(binning.widths())
        .map(|((row, center), width)| {
            serde_json::json!({
                "e_min": row.bin.low,
                "e_max": row.bin.high,
                "e_center": center,
                "e_width": width,
                "theta_squared": row.cut.theta_squared,
                "theta": row.theta(),
                "threshold": row.cut.threshold,
                "significance": row.significance,
                "signal": row.signal,
                "background": row.background,
                "relative_sensitivity": row.scaling,
                "flux_sensitivity": row.flux,
            })
        })
        .collect();

    let s = &cfg.sensitivity;
    serde_json::json!({
        "tool": "gammasens",
        "version": gs_core::VERSION,
        "method": s.strategy.name(),
        "alpha": s.alpha,
        "t_obs_hours": cfg.observation.t_obs_hours,
        "multiplicity": cfg.multiplicity,
        "energy": s.energy,
        "seed": s.seed,
        "n_trials": s.scaler.n_trials,
        "rows": rows,
    })
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
