//! On-region selection.

use gs_core::{CutPair, Error, RegionCounts, Result};
use serde::{Deserialize, Serialize};

use crate::event_table::EventTable;

/// Whether classification scores are confined to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    /// Scores are probabilities; thresholds outside `[0, 1]` are invalid.
    #[default]
    Bounded,
    /// Scores are arbitrary reals; any finite threshold is accepted.
    Unbounded,
}

/// Counts events inside the region defined by a [`CutPair`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventSelector {
    policy: ScorePolicy,
}

impl EventSelector {
    /// Create a selector with the given score policy.
    pub fn new(policy: ScorePolicy) -> Self {
        Self { policy }
    }

    /// Score policy in use.
    pub fn policy(&self) -> ScorePolicy {
        self.policy
    }

    /// Check that `cut` is a valid region for this selector.
    pub fn validate(&self, cut: &CutPair) -> Result<()> {
        if !(cut.theta_squared > 0.0) || !cut.theta_squared.is_finite() {
            return Err(Error::InvalidCut(format!(
                "theta_squared must be positive and finite, got {}",
                cut.theta_squared
            )));
        }
        if !cut.threshold.is_finite() {
            return Err(Error::InvalidCut(format!(
                "score threshold must be finite, got {}",
                cut.threshold
            )));
        }
        if self.policy == ScorePolicy::Bounded && !(0.0..=1.0).contains(&cut.threshold) {
            return Err(Error::InvalidCut(format!(
                "score threshold must lie in [0, 1] for bounded scores, got {}",
                cut.threshold
            )));
        }
        Ok(())
    }

    /// Weighted and raw number of events with `theta² <= theta_squared` and
    /// `score >= threshold`, both multiplied by `alpha_scale`.
    pub fn count_in_region(
        &self,
        table: &EventTable,
        cut: &CutPair,
        alpha_scale: f64,
    ) -> Result<RegionCounts> {
        self.validate(cut)?;
        Ok(count_passing(table, cut).scaled(alpha_scale))
    }
}

/// Region counts without cut validation.
fn count_passing(table: &EventTable, cut: &CutPair) -> RegionCounts {
    let mut weighted = 0.0;
    let mut raw = 0usize;
    for ((&t2, &s), &w) in
        table.theta_squared().iter().zip(table.scores()).zip(table.weights())
    {
        if t2 <= cut.theta_squared && s >= cut.threshold {
            weighted += w;
            raw += 1;
        }
    }
    RegionCounts::new(weighted, raw as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_table::EventColumns;
    use approx::assert_relative_eq;

    fn make_table() -> EventTable {
        EventTable::from_columns(EventColumns {
            true_energy: vec![1.0; 5],
            reco_energy: vec![1.0; 5],
            theta: vec![0.125, 0.25, 0.375, 0.125, 0.5],
            score: vec![0.9, 0.8, 0.95, 0.3, 0.99],
            weight: vec![0.5, 1.5, 2.0, 4.0, 8.0],
            multiplicity: vec![2; 5],
        })
        .unwrap()
    }

    #[test]
    fn test_count_in_region_inclusive_edges() {
        let t = make_table();
        let sel = EventSelector::default();
        // theta² of 0.25 deg is 0.0625: on the edge, included. Score 0.8 on the threshold, included.
        let c = sel.count_in_region(&t, &CutPair::new(0.0625, 0.8), 1.0).unwrap();
        assert_relative_eq!(c.weighted, 2.0, epsilon = 1e-12);
        assert_eq!(c.raw, 2.0);
    }

    #[test]
    fn test_alpha_scale_multiplies_both_counts() {
        let t = make_table();
        let sel = EventSelector::default();
        let c = sel.count_in_region(&t, &CutPair::new(0.1, 0.5), 0.2).unwrap();
        assert_relative_eq!(c.weighted, 2.0 * 0.2, epsilon = 1e-12);
        assert_relative_eq!(c.raw, 2.0 * 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_cuts() {
        let t = make_table();
        let bounded = EventSelector::new(ScorePolicy::Bounded);
        assert!(matches!(
            bounded.count_in_region(&t, &CutPair::new(0.0, 0.5), 1.0),
            Err(Error::InvalidCut(_))
        ));
        assert!(matches!(
            bounded.count_in_region(&t, &CutPair::new(0.1, 1.2), 1.0),
            Err(Error::InvalidCut(_))
        ));

        let unbounded = EventSelector::new(ScorePolicy::Unbounded);
        let c = unbounded.count_in_region(&t, &CutPair::new(1.0, 1.2), 1.0).unwrap();
        assert_eq!(c.raw, 0.0);
        assert!(unbounded.count_in_region(&t, &CutPair::new(-0.1, 0.5), 1.0).is_err());
    }
}
