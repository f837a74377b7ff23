//! Columnar event storage for simulated detections.

use gs_core::{EnergyBin, Error, Result};
use serde::{Deserialize, Serialize};

/// Which energy estimate energy bins are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyColumn {
    /// Simulated (true) energy
    True,
    /// Reconstructed energy
    #[default]
    Reconstructed,
}

/// One simulated detection, viewed by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// True energy (TeV)
    pub true_energy: f64,
    /// Reconstructed energy (TeV)
    pub reco_energy: f64,
    /// Angular offset from the source direction (deg)
    pub theta: f64,
    /// Classification score ("gamma-likeness")
    pub score: f64,
    /// Expected real-observation count this event stands for
    pub weight: f64,
    /// Number of triggered telescopes
    pub multiplicity: u32,
}

impl Event {
    /// Squared angular offset (deg²).
    #[inline]
    pub fn theta_squared(&self) -> f64 {
        self.theta * self.theta
    }

    /// Energy according to `column`.
    #[inline]
    pub fn energy(&self, column: EnergyColumn) -> f64 {
        match column {
            EnergyColumn::True => self.true_energy,
            EnergyColumn::Reconstructed => self.reco_energy,
        }
    }
}

/// Column vectors used to build an [`EventTable`].
#[derive(Debug, Clone, Default)]
pub struct EventColumns {
    /// True energy (TeV)
    pub true_energy: Vec<f64>,
    /// Reconstructed energy (TeV)
    pub reco_energy: Vec<f64>,
    /// Angular offset (deg)
    pub theta: Vec<f64>,
    /// Classification score
    pub score: Vec<f64>,
    /// Per-event weight
    pub weight: Vec<f64>,
    /// Triggered telescopes
    pub multiplicity: Vec<u32>,
}

/// Columnar event storage (Structure-of-Arrays / SoA).
///
/// Tables are immutable; every filter returns a new table.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    true_energy: Vec<f64>,
    reco_energy: Vec<f64>,
    theta: Vec<f64>,
    theta_squared: Vec<f64>,
    score: Vec<f64>,
    weight: Vec<f64>,
    multiplicity: Vec<u32>,
}

impl EventTable {
    /// Create an [`EventTable`] from already materialized columns.
    pub fn from_columns(columns: EventColumns) -> Result<Self> {
        let EventColumns { true_energy, reco_energy, theta, score, weight, multiplicity } =
            columns;
        let n = true_energy.len();

        let lengths = [
            ("reco_energy", reco_energy.len()),
            ("theta", theta.len()),
            ("score", score.len()),
            ("weight", weight.len()),
            ("multiplicity", multiplicity.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(Error::Schema(format!(
                    "column length mismatch for '{name}': expected {n}, got {len}"
                )));
            }
        }

        for (name, col) in [
            ("true_energy", &true_energy),
            ("reco_energy", &reco_energy),
            ("theta", &theta),
            ("score", &score),
            ("weight", &weight),
        ] {
            if col.iter().any(|x| !x.is_finite()) {
                return Err(Error::Schema(format!("column '{name}' contains non-finite values")));
            }
        }
        if true_energy.iter().chain(reco_energy.iter()).any(|&e| e <= 0.0) {
            return Err(Error::Schema("energies must be positive".into()));
        }
        if theta.iter().any(|&t| t < 0.0) {
            return Err(Error::Schema("angular offsets must be non-negative".into()));
        }
        if weight.iter().any(|&w| w < 0.0) {
            return Err(Error::Schema("negative event weights are not supported".into()));
        }

        let theta_squared = theta.iter().map(|t| t * t).collect();
        Ok(Self { true_energy, reco_energy, theta, theta_squared, score, weight, multiplicity })
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.true_energy.len()
    }

    /// Whether the table holds no events.
    pub fn is_empty(&self) -> bool {
        self.true_energy.is_empty()
    }

    /// Event at `idx`.
    pub fn get(&self, idx: usize) -> Option<Event> {
        (idx < self.n_events()).then(|| Event {
            true_energy: self.true_energy[idx],
            reco_energy: self.reco_energy[idx],
            theta: self.theta[idx],
            score: self.score[idx],
            weight: self.weight[idx],
            multiplicity: self.multiplicity[idx],
        })
    }

    /// Iterate over events.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        (0..self.n_events()).filter_map(move |i| self.get(i))
    }

    /// Squared angular offsets (deg²).
    pub fn theta_squared(&self) -> &[f64] {
        &self.theta_squared
    }

    /// Angular offsets (deg).
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Classification scores.
    pub fn scores(&self) -> &[f64] {
        &self.score
    }

    /// Per-event weights.
    pub fn weights(&self) -> &[f64] {
        &self.weight
    }

    /// Triggered-telescope counts.
    pub fn multiplicities(&self) -> &[u32] {
        &self.multiplicity
    }

    /// Energy column selected by `column`.
    pub fn energies(&self, column: EnergyColumn) -> &[f64] {
        match column {
            EnergyColumn::True => &self.true_energy,
            EnergyColumn::Reconstructed => &self.reco_energy,
        }
    }

    /// Total weight of the table.
    pub fn total_weight(&self) -> f64 {
        self.weight.iter().sum()
    }

    /// Keep events for which `predicate` holds.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Event) -> bool,
    {
        let keep: Vec<usize> =
            (0..self.n_events()).filter(|&i| self.get(i).is_some_and(|e| predicate(&e))).collect();
        self.take(&keep)
    }

    /// Events whose energy (per `column`) lies in `bin`.
    pub fn select_energy_range(&self, bin: &EnergyBin, column: EnergyColumn) -> Self {
        self.filter(|e| bin.contains(e.energy(column)))
    }

    /// Events seen by at least `min_multiplicity` telescopes.
    pub fn with_min_multiplicity(&self, min_multiplicity: u32) -> Self {
        self.filter(|e| e.multiplicity >= min_multiplicity)
    }

    /// Replace the weight column.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self> {
        if weights.len() != self.n_events() {
            return Err(Error::Schema(format!(
                "weights length mismatch: expected {}, got {}",
                self.n_events(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Schema("weights must be finite and non-negative".into()));
        }
        self.weight = weights;
        Ok(self)
    }

    /// Row-wise concatenation (e.g. protons + electrons into one background sample).
    pub fn concat(tables: &[&EventTable]) -> Self {
        let mut out = Self::default();
        for t in tables {
            out.true_energy.extend_from_slice(&t.true_energy);
            out.reco_energy.extend_from_slice(&t.reco_energy);
            out.theta.extend_from_slice(&t.theta);
            out.theta_squared.extend_from_slice(&t.theta_squared);
            out.score.extend_from_slice(&t.score);
            out.weight.extend_from_slice(&t.weight);
            out.multiplicity.extend_from_slice(&t.multiplicity);
        }
        out
    }

    fn take(&self, idx: &[usize]) -> Self {
        fn pick<T: Copy>(col: &[T], idx: &[usize]) -> Vec<T> {
            idx.iter().map(|&i| col[i]).collect()
        }
        Self {
            true_energy: pick(&self.true_energy, idx),
            reco_energy: pick(&self.reco_energy, idx),
            theta: pick(&self.theta, idx),
            theta_squared: pick(&self.theta_squared, idx),
            score: pick(&self.score, idx),
            weight: pick(&self.weight, idx),
            multiplicity: pick(&self.multiplicity, idx),
        }
    }
}

impl FromIterator<Event> for EventColumns {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut cols = EventColumns::default();
        for e in iter {
            cols.true_energy.push(e.true_energy);
            cols.reco_energy.push(e.reco_energy);
            cols.theta.push(e.theta);
            cols.score.push(e.score);
            cols.weight.push(e.weight);
            cols.multiplicity.push(e.multiplicity);
        }
        cols
    }
}
