//! # gs-events
//!
//! Event-level inputs for the gammasens sensitivity engine.
//!
//! This crate provides:
//! - A columnar [`EventTable`] (SoA layout) with typed predicates over [`Event`].
//! - The [`EventSelector`] that counts events inside an on-region.
//! - Energy binning ([`EnergyBinning`]) and source-offset geometry.
//! - Spectral reweighting of simulated events ([`McProduction`], [`Spectrum`]).
//! - Parquet input/output for event tables (feature `arrow-io`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binning;
pub mod coordinates;
#[cfg(feature = "arrow-io")]
pub mod event_parquet;
pub mod event_table;
pub mod selection;
pub mod spectrum;

pub use binning::{EnergyBinning, Spacing};
pub use coordinates::{SkyPosition, angular_separation_deg};
pub use event_table::{EnergyColumn, Event, EventColumns, EventTable};
pub use selection::{EventSelector, ScorePolicy};
pub use spectrum::{McProduction, Spectrum};
