#![cfg(feature = "arrow-io")]

use approx::assert_relative_eq;
use gs_core::EnergyBin;
use gs_events::event_parquet::{Direction, read_event_parquet, write_event_parquet};
use gs_events::{
    EnergyBinning, EnergyColumn, EventColumns, EventTable, McProduction, Spacing, Spectrum,
};

fn tmp_path(filename: &str) -> std::path::PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("gammasens_it_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn production() -> McProduction {
    McProduction {
        e_min: 0.003,
        e_max: 330.0,
        spectral_index: -2.0,
        n_showers: 1e6,
        scatter_radius_m: 2500.0,
        viewcone_deg: 0.0,
    }
}

fn sample() -> EventTable {
    let energies = vec![0.05, 0.2, 1.0, 4.0, 30.0, 120.0];
    let n = energies.len();
    EventTable::from_columns(EventColumns {
        reco_energy: energies.iter().map(|e| e * 1.05).collect(),
        true_energy: energies,
        theta: vec![0.05, 0.1, 0.02, 0.3, 0.15, 0.08],
        score: vec![0.2, 0.9, 0.95, 0.4, 0.7, 0.99],
        weight: vec![1.0; n],
        multiplicity: vec![2, 3, 4, 2, 5, 8],
    })
    .unwrap()
}

#[test]
fn test_reweighted_table_survives_parquet() {
    let crab = Spectrum::crab();
    let table = sample();
    let t_obs = 50.0 * 3600.0;
    let energies = table.energies(EnergyColumn::True);
    let weights = production().reweigh_to(&crab, energies, t_obs).unwrap();
    let table = table.with_weights(weights.clone()).unwrap();

    let path = tmp_path("reweighted.parquet");
    write_event_parquet(&table, &path).unwrap();
    let raw = read_event_parquet(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(matches!(raw.direction, Direction::Offset(_)));
    let back = raw.into_table(None, None).unwrap();
    assert_eq!(back.n_events(), table.n_events());
    for (a, b) in back.weights().iter().zip(&weights) {
        assert_relative_eq!(*a, *b, max_relative = 1e-15);
    }
    assert_eq!(back.multiplicities(), table.multiplicities());
}

#[test]
fn test_reweighting_overrides_file_weights() {
    let table = sample();
    let path = tmp_path("override.parquet");
    write_event_parquet(&table, &path).unwrap();
    let raw = read_event_parquet(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let proton = Spectrum::cosmic_proton();
    let diffuse = McProduction { viewcone_deg: 10.0, ..production() };
    let weights = diffuse.reweigh_to(&proton, &raw.true_energy, 3600.0).unwrap();
    let back = raw.into_table(None, Some(weights.clone())).unwrap();
    assert_eq!(back.weights(), weights.as_slice());
    assert!(back.weights().iter().all(|w| *w > 0.0));
}

#[test]
fn test_binning_and_selection_on_loaded_table() {
    let table = sample();
    let binning = EnergyBinning::new(0.02, 200.0, 4, Spacing::Log).unwrap();
    let total: usize = binning
        .bins()
        .iter()
        .map(|b| table.select_energy_range(b, EnergyColumn::True).n_events())
        .sum();
    assert_eq!(total, table.n_events());

    let bin = EnergyBin::new(0.5, 5.0);
    let selected = table.select_energy_range(&bin, EnergyColumn::Reconstructed);
    assert_eq!(selected.n_events(), 2);
    assert_eq!(table.with_min_multiplicity(4).n_events(), 3);
}
