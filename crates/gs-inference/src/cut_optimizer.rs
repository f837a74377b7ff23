//! Brute-force search for the most significant (theta², threshold) cut.
//!
//! Every grid candidate is scored independently, so candidates are evaluated in parallel
//! and reduced afterwards in traversal order. A candidate replaces the incumbent only when
//! its objective is strictly lower, which makes ties resolve to the first candidate in
//! (theta², threshold) ascending order.

use std::fmt;

use gs_core::{CutPair, Error, RegionCounts, Result};
use gs_events::{EventSelector, EventTable};
use gs_prob::li_ma_significance;
use rayon::prelude::*;

use crate::background::{BackgroundStrategy, PreparedBackground};
use crate::grid::CutGrid;

/// Minimum raw signal excess over the scaled background sample.
const MIN_RAW_EXCESS: f64 = 10.0;

/// Signal must exceed this fraction of the background (after the ×5 margin).
const SYSTEMATIC_FRACTION: f64 = 0.01;
const SYSTEMATIC_MARGIN: f64 = 5.0;

/// Why a candidate was not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The background strategy lacks simulated events for this region.
    InsufficientBackground,
    /// Raw signal events do not exceed `alpha · raw background + 10`.
    InsufficientExcess,
    /// Weighted signal is below 0.2 % of the weighted background.
    SystematicsDominated,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InsufficientBackground => "not enough background",
            Self::InsufficientExcess => "counts not large enough compared to background",
            Self::SystematicsDominated => "systematics dominated",
        })
    }
}

/// Outcome for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Scored with the Li & Ma significance.
    Accepted {
        /// Significance at this cut.
        significance: f64,
    },
    /// Excluded from the search (objective 0).
    Rejected(Rejection),
}

/// One evaluated grid candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    /// Candidate cut
    pub cut: CutPair,
    /// On-region signal counts
    pub signal: RegionCounts,
    /// Background counts from the configured strategy
    pub background: RegionCounts,
    /// Verdict
    pub verdict: Verdict,
}

impl GridPoint {
    /// Value minimized by the search: `-significance`, or 0 if rejected.
    pub fn objective(&self) -> f64 {
        -self.significance()
    }

    /// Significance, 0 if rejected.
    pub fn significance(&self) -> f64 {
        match self.verdict {
            Verdict::Accepted { significance } => significance,
            Verdict::Rejected(_) => 0.0,
        }
    }

    /// `true` if the candidate was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self.verdict, Verdict::Rejected(_))
    }
}

/// Result of a grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct CutSearchResult {
    /// Winning candidate (the first grid point if every candidate was rejected).
    pub best: GridPoint,
    /// Number of candidates evaluated
    pub n_evaluated: usize,
    /// Number of rejected candidates
    pub n_rejected: usize,
}

impl CutSearchResult {
    /// Winning cut.
    pub fn cut(&self) -> CutPair {
        self.best.cut
    }

    /// `true` if no candidate survived the rejection rules.
    pub fn all_rejected(&self) -> bool {
        self.n_rejected == self.n_evaluated
    }
}

/// Grid-search cut optimizer.
///
/// A pure function of its inputs: no randomness, no shared state.
#[derive(Debug, Clone)]
pub struct CutOptimizer {
    grid: CutGrid,
    strategy: BackgroundStrategy,
    selector: EventSelector,
    alpha: f64,
}

impl CutOptimizer {
    /// Create an optimizer. Fails on an invalid grid, strategy or `alpha`.
    pub fn new(
        grid: CutGrid,
        strategy: BackgroundStrategy,
        selector: EventSelector,
        alpha: f64,
    ) -> Result<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(Error::Config(format!("alpha must be finite and > 0, got {alpha}")));
        }
        grid.validate()?;
        strategy.validate()?;
        Ok(Self { grid, strategy, selector, alpha })
    }

    /// Search grid.
    pub fn grid(&self) -> &CutGrid {
        &self.grid
    }

    /// Background strategy.
    pub fn strategy(&self) -> BackgroundStrategy {
        self.strategy
    }

    /// Exposure ratio.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Bind the background strategy to a sample.
    pub fn prepare<'a>(&self, background: &'a EventTable) -> Result<PreparedBackground<'a>> {
        self.strategy.prepare(background, self.selector)
    }

    /// Score one candidate.
    pub fn evaluate(
        &self,
        signal: &EventTable,
        background: &PreparedBackground<'_>,
        cut: CutPair,
    ) -> Result<GridPoint> {
        let alpha = self.alpha;
        let s = self.selector.count_in_region(signal, &cut, 1.0)?;
        let estimate = background.estimate(&cut, alpha)?;
        let b = estimate.counts;

        let verdict = if estimate.is_insufficient() {
            Verdict::Rejected(Rejection::InsufficientBackground)
        } else if s.raw <= b.raw * alpha + MIN_RAW_EXCESS {
            Verdict::Rejected(Rejection::InsufficientExcess)
        } else if s.weighted * SYSTEMATIC_MARGIN < b.weighted * SYSTEMATIC_FRACTION {
            Verdict::Rejected(Rejection::SystematicsDominated)
        } else {
            let n_on = s.weighted + alpha * b.weighted;
            Verdict::Accepted { significance: li_ma_significance(n_on, b.weighted, alpha) }
        };

        Ok(GridPoint { cut, signal: s, background: b, verdict })
    }

    /// Search the whole grid.
    pub fn optimize(&self, signal: &EventTable, background: &EventTable) -> Result<CutSearchResult> {
        let prepared = self.prepare(background)?;
        self.optimize_prepared(signal, &prepared)
    }

    /// Search the whole grid with an already prepared background.
    pub fn optimize_prepared(
        &self,
        signal: &EventTable,
        background: &PreparedBackground<'_>,
    ) -> Result<CutSearchResult> {
        let cuts = self.grid.cuts();
        let points: Vec<GridPoint> = cuts
            .par_iter()
            .map(|&cut| self.evaluate(signal, background, cut))
            .collect::<Result<Vec<_>>>()?;

        let mut iter = points.into_iter();
        let mut best = iter
            .next()
            .ok_or_else(|| Error::Config("cut grid has no candidates".to_string()))?;
        let mut n_evaluated = 1;
        let mut n_rejected = usize::from(log_rejection(&best));

        for point in iter {
            n_evaluated += 1;
            n_rejected += usize::from(log_rejection(&point));
            if point.objective() < best.objective() {
                best = point;
            }
        }

        tracing::debug!(
            theta_squared = best.cut.theta_squared,
            threshold = best.cut.threshold,
            significance = best.significance(),
            n_evaluated,
            n_rejected,
            "cut search finished"
        );
        Ok(CutSearchResult { best, n_evaluated, n_rejected })
    }
}

fn log_rejection(point: &GridPoint) -> bool {
    match point.verdict {
        Verdict::Rejected(reason) => {
            tracing::debug!(
                theta_squared = point.cut.theta_squared,
                threshold = point.cut.threshold,
                %reason,
                "candidate rejected"
            );
            true
        }
        Verdict::Accepted { .. } => false,
    }
}
