//! # gs-core
//!
//! Core types for gammasens.
//!
//! This crate holds the pieces every other crate agrees on:
//! - the shared [`Error`] type and [`Result`] alias
//! - the analysis data model: [`CutPair`], [`RegionCounts`], [`EnergyBin`],
//!   [`ScalingEstimate`], [`BinResult`] and the assembled [`SensitivityTable`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    BinResult, CutPair, EnergyBin, FluxSensitivity, RegionCounts, ScalingEstimate,
    SensitivityTable,
};

/// Crate version, shared by every workspace member.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
