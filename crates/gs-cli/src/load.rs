//! Event-file loading: Parquet → reweighted, offset-resolved [`EventTable`]s.

use anyhow::{Context, Result, bail};
use gs_events::event_parquet::{RawEvents, read_event_parquet};
use gs_events::{EventTable, McProduction, SkyPosition, Spectrum};
use std::path::Path;

use crate::config::AnalysisConfig;

/// Paths of the three simulated samples.
pub struct InputFiles<'a> {
    pub gamma: &'a Path,
    pub proton: &'a Path,
    pub electron: &'a Path,
}

/// Signal and combined background after weighting and multiplicity selection.
pub struct Samples {
    pub signal: EventTable,
    pub background: EventTable,
}

fn read(path: &Path) -> Result<RawEvents> {
    read_event_parquet(path).with_context(|| format!("failed to read events from {}", path.display()))
}

/// File weights win; otherwise the configured production is reweighted to `target`.
fn weights_for(
    raw: &RawEvents,
    production: Option<&McProduction>,
    target: &Spectrum,
    t_obs_s: f64,
) -> Result<Option<Vec<f64>>> {
    if raw.weight.is_some() {
        return Ok(None);
    }
    match production {
        Some(p) => Ok(Some(p.reweigh_to(target, &raw.true_energy, t_obs_s)?)),
        None => Ok(None),
    }
}

fn build_table(
    raw: RawEvents,
    source: Option<SkyPosition>,
    production: Option<&McProduction>,
    target: &Spectrum,
    t_obs_s: f64,
    path: &Path,
) -> Result<EventTable> {
    let weights = weights_for(&raw, production, target, t_obs_s)?;
    let table = raw
        .into_table(source, weights)
        .with_context(|| format!("invalid event sample {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        n_events = table.n_events(),
        total_weight = table.total_weight(),
        "loaded sample"
    );
    Ok(table)
}

/// Load gammas, protons and electrons; protons and electrons form the background.
pub fn load_samples(files: &InputFiles<'_>, cfg: &AnalysisConfig) -> Result<Samples> {
    if cfg.production.gamma.is_some_and(|p| p.is_diffuse()) {
        bail!("point-like gammas are required to calculate a point-source sensitivity");
    }
    let t_obs_s = cfg.observation.t_obs_hours * 3600.0;
    if !t_obs_s.is_finite() || t_obs_s <= 0.0 {
        bail!("observation time must be finite and > 0, got {} h", cfg.observation.t_obs_hours);
    }

    let gamma = read(files.gamma)?;
    let source = gamma.true_source_position();
    if let Some(pos) = source {
        tracing::debug!(alt = pos.alt, az = pos.az, "source position from first gamma");
    }

    let prod = &cfg.production;
    let target = &cfg.target;
    let signal = build_table(gamma, source, prod.gamma.as_ref(), &target.gamma, t_obs_s, files.gamma)?;
    let protons = build_table(
        read(files.proton)?,
        source,
        prod.proton.as_ref(),
        &target.proton,
        t_obs_s,
        files.proton,
    )?;
    let electrons = build_table(
        read(files.electron)?,
        source,
        prod.electron.as_ref(),
        &target.electron,
        t_obs_s,
        files.electron,
    )?;
    let background = EventTable::concat(&[&protons, &electrons]);

    if cfg.multiplicity <= 2 {
        return Ok(Samples { signal, background });
    }
    let signal = signal.with_min_multiplicity(cfg.multiplicity);
    let background = background.with_min_multiplicity(cfg.multiplicity);
    tracing::info!(
        multiplicity = cfg.multiplicity,
        n_signal = signal.n_events(),
        n_background = background.n_events(),
        "applied multiplicity selection"
    );
    Ok(Samples { signal, background })
}
