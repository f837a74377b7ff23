//! Parquet / Arrow event I/O.
//!
//! # Schema: `gammasens_events_v1`
//!
//! | Column                          | Arrow Type | Required | Description                          |
//! |---------------------------------|------------|----------|--------------------------------------|
//! | `mc_energy`                     | numeric    | yes      | True energy (TeV)                    |
//! | `gamma_energy_prediction_mean`  | numeric    | yes      | Reconstructed energy (TeV)           |
//! | `gamma_prediction_mean`         | numeric    | yes      | Classification score                 |
//! | `num_triggered_telescopes`      | integer    | yes      | Multiplicity                         |
//! | `theta`                         | numeric    | one of   | Offset from the source (deg)         |
//! | `alt`, `az`, `mc_alt`, `mc_az`  | numeric    | one of   | Reconstructed / true direction (deg) |
//! | `weight`                        | numeric    | no       | Per-event weight                     |
//!
//! Rows with a null in any used column are dropped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, UInt32Array};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;

use crate::coordinates::{SkyPosition, offsets_from_source};
use crate::event_table::{EventColumns, EventTable};
use gs_core::{Error, Result};

/// Schema version string embedded in Parquet key-value metadata.
pub const EVENTS_SCHEMA_V1: &str = "gammasens_events_v1";

/// Parquet metadata key for the schema version.
pub const META_KEY_SCHEMA_VERSION: &str = "gammasens.schema_version";

/// True energy column.
pub const COL_TRUE_ENERGY: &str = "mc_energy";
/// Reconstructed energy column.
pub const COL_RECO_ENERGY: &str = "gamma_energy_prediction_mean";
/// Classification score column.
pub const COL_SCORE: &str = "gamma_prediction_mean";
/// Multiplicity column.
pub const COL_MULTIPLICITY: &str = "num_triggered_telescopes";
/// Precomputed source offset column.
pub const COL_THETA: &str = "theta";
/// Optional weight column.
pub const COL_WEIGHT: &str = "weight";
/// Reconstructed altitude column.
pub const COL_ALT: &str = "alt";
/// Reconstructed azimuth column.
pub const COL_AZ: &str = "az";
/// True altitude column.
pub const COL_MC_ALT: &str = "mc_alt";
/// True azimuth column.
pub const COL_MC_AZ: &str = "mc_az";

/// How the source offset is available in a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Direction {
    /// Offsets already computed (deg).
    Offset(Vec<f64>),
    /// Reconstructed and true directions (deg); offsets need a source position.
    Horizontal {
        /// Reconstructed altitude
        alt: Vec<f64>,
        /// Reconstructed azimuth
        az: Vec<f64>,
        /// True altitude
        mc_alt: Vec<f64>,
        /// True azimuth
        mc_az: Vec<f64>,
    },
}

/// Events as read from disk, before offsets and weights are settled.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvents {
    /// True energy (TeV)
    pub true_energy: Vec<f64>,
    /// Reconstructed energy (TeV)
    pub reco_energy: Vec<f64>,
    /// Classification score
    pub score: Vec<f64>,
    /// Triggered telescopes
    pub multiplicity: Vec<u32>,
    /// Weight column, if the file carries one
    pub weight: Option<Vec<f64>>,
    /// Direction information
    pub direction: Direction,
}

impl RawEvents {
    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.true_energy.len()
    }

    /// True direction of the first event; for a point-like simulation this is the
    /// source position.
    pub fn true_source_position(&self) -> Option<SkyPosition> {
        match &self.direction {
            Direction::Horizontal { mc_alt, mc_az, .. } => {
                Some(SkyPosition::new(*mc_alt.first()?, *mc_az.first()?))
            }
            Direction::Offset(_) => None,
        }
    }

    /// Offsets (deg) from `source`; files with a `theta` column ignore `source`.
    pub fn offsets(&self, source: Option<SkyPosition>) -> Result<Vec<f64>> {
        match &self.direction {
            Direction::Offset(theta) => Ok(theta.clone()),
            Direction::Horizontal { alt, az, .. } => {
                let source = source.ok_or_else(|| {
                    Error::Config("a source position is required to derive offsets".into())
                })?;
                offsets_from_source(alt, az, source)
            }
        }
    }

    /// Build an [`EventTable`].
    ///
    /// `weights` takes precedence over the file's weight column; one of the two must exist.
    pub fn into_table(
        self,
        source: Option<SkyPosition>,
        weights: Option<Vec<f64>>,
    ) -> Result<EventTable> {
        let theta = self.offsets(source)?;
        let weight = weights.or(self.weight).ok_or_else(|| {
            Error::Schema(format!(
                "no '{COL_WEIGHT}' column and no reweighting configured for this sample"
            ))
        })?;
        EventTable::from_columns(EventColumns {
            true_energy: self.true_energy,
            reco_energy: self.reco_energy,
            theta,
            score: self.score,
            weight,
            multiplicity: self.multiplicity,
        })
    }
}

// ---------------------------------------------------------------------------
// Read: Parquet → Arrow RecordBatch → RawEvents
// ---------------------------------------------------------------------------

fn column_as_f64(batch: &RecordBatch, name: &str) -> Result<Option<ArrayRef>> {
    let schema = batch.schema();
    let Ok(idx) = schema.index_of(name) else {
        return Ok(None);
    };
    let arr = batch.column(idx);
    match arr.data_type() {
        DataType::Float64 => Ok(Some(arr.clone())),
        dt if dt.is_numeric() => arrow::compute::cast(arr, &DataType::Float64)
            .map(Some)
            .map_err(|e| Error::Schema(format!("failed to cast column '{name}' to Float64: {e}"))),
        dt => Err(Error::Schema(format!(
            "column '{name}' has type {dt:?}, expected a numeric type"
        ))),
    }
}

fn require_column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    column_as_f64(batch, name)?
        .ok_or_else(|| Error::Schema(format!("missing required column '{name}'")))
}

enum DirectionColumns {
    Offset(ArrayRef),
    Horizontal([ArrayRef; 4]),
}

/// Build [`RawEvents`] from an Arrow [`RecordBatch`].
pub fn raw_events_from_record_batch(batch: &RecordBatch) -> Result<RawEvents> {
    let true_energy = require_column(batch, COL_TRUE_ENERGY)?;
    let reco_energy = require_column(batch, COL_RECO_ENERGY)?;
    let score = require_column(batch, COL_SCORE)?;
    let multiplicity = require_column(batch, COL_MULTIPLICITY)?;
    let weight = column_as_f64(batch, COL_WEIGHT)?;

    let direction_cols = match column_as_f64(batch, COL_THETA)? {
        Some(theta) => DirectionColumns::Offset(theta),
        None => {
            let fetch = |name: &str| {
                require_column(batch, name).map_err(|_| {
                    Error::Schema(format!(
                        "missing column '{name}': either '{COL_THETA}' or all of \
                         '{COL_ALT}', '{COL_AZ}', '{COL_MC_ALT}', '{COL_MC_AZ}' are required"
                    ))
                })
            };
            DirectionColumns::Horizontal([
                fetch(COL_ALT)?,
                fetch(COL_AZ)?,
                fetch(COL_MC_ALT)?,
                fetch(COL_MC_AZ)?,
            ])
        }
    };

    let mut used: Vec<&ArrayRef> = vec![&true_energy, &reco_energy, &score, &multiplicity];
    used.extend(weight.iter());
    match &direction_cols {
        DirectionColumns::Offset(theta) => used.push(theta),
        DirectionColumns::Horizontal(cols) => used.extend(cols.iter()),
    }

    let n_rows = batch.num_rows();
    let keep: Vec<usize> = (0..n_rows).filter(|&i| used.iter().all(|a| a.is_valid(i))).collect();
    if keep.len() < n_rows {
        tracing::debug!(dropped = n_rows - keep.len(), kept = keep.len(), "dropped rows with nulls");
    }

    let values = |a: &ArrayRef| -> Vec<f64> {
        let p = a.as_primitive::<Float64Type>();
        keep.iter().map(|&i| p.value(i)).collect()
    };

    let multiplicity = values(&multiplicity)
        .into_iter()
        .map(|m| {
            if m >= 0.0 && m.fract() == 0.0 && m <= u32::MAX as f64 {
                Ok(m as u32)
            } else {
                Err(Error::Schema(format!(
                    "column '{COL_MULTIPLICITY}' must hold non-negative integers, got {m}"
                )))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let direction = match &direction_cols {
        DirectionColumns::Offset(theta) => Direction::Offset(values(theta)),
        DirectionColumns::Horizontal([alt, az, mc_alt, mc_az]) => Direction::Horizontal {
            alt: values(alt),
            az: values(az),
            mc_alt: values(mc_alt),
            mc_az: values(mc_az),
        },
    };

    Ok(RawEvents {
        true_energy: values(&true_energy),
        reco_energy: values(&reco_energy),
        score: values(&score),
        multiplicity,
        weight: weight.as_ref().map(&values),
        direction,
    })
}

/// Read a Parquet file into [`RawEvents`].
pub fn read_event_parquet(path: &Path) -> Result<RawEvents> {
    let file = std::fs::File::open(path)?;
    let builder = parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::Schema(format!("failed to read Parquet {}: {e}", path.display())))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| Error::Schema(format!("failed to build Parquet reader: {e}")))?;

    let batches: std::result::Result<Vec<_>, _> = reader.collect();
    let batches =
        batches.map_err(|e| Error::Schema(format!("failed to read Parquet batches: {e}")))?;

    let merged = arrow::compute::concat_batches(&schema, &batches)
        .map_err(|e| Error::Schema(format!("failed to concat batches: {e}")))?;
    let raw = raw_events_from_record_batch(&merged)?;
    tracing::debug!(path = %path.display(), events = raw.n_events(), "read event table");
    Ok(raw)
}

// ---------------------------------------------------------------------------
// Write: EventTable → Arrow RecordBatch → Parquet
// ---------------------------------------------------------------------------

/// Build an Arrow [`RecordBatch`] (offset form, with weights) from an [`EventTable`].
pub fn event_table_to_record_batch(table: &EventTable) -> Result<RecordBatch> {
    use crate::event_table::EnergyColumn;

    let fields = vec![
        Field::new(COL_TRUE_ENERGY, DataType::Float64, false),
        Field::new(COL_RECO_ENERGY, DataType::Float64, false),
        Field::new(COL_SCORE, DataType::Float64, false),
        Field::new(COL_MULTIPLICITY, DataType::UInt32, false),
        Field::new(COL_THETA, DataType::Float64, false),
        Field::new(COL_WEIGHT, DataType::Float64, false),
    ];
    let metadata =
        HashMap::from([(META_KEY_SCHEMA_VERSION.to_string(), EVENTS_SCHEMA_V1.to_string())]);
    let schema = Arc::new(Schema::new(fields).with_metadata(metadata));

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(table.energies(EnergyColumn::True).to_vec())),
        Arc::new(Float64Array::from(table.energies(EnergyColumn::Reconstructed).to_vec())),
        Arc::new(Float64Array::from(table.scores().to_vec())),
        Arc::new(UInt32Array::from(table.multiplicities().to_vec())),
        Arc::new(Float64Array::from(table.theta().to_vec())),
        Arc::new(Float64Array::from(table.weights().to_vec())),
    ];

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| Error::Schema(format!("failed to build RecordBatch: {e}")))
}

/// Write a [`RecordBatch`] to a Parquet file (Snappy).
pub fn write_record_batch_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let props = parquet::file::properties::WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();
    let mut writer = parquet::arrow::ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| Error::Schema(format!("failed to create Parquet writer: {e}")))?;
    writer.write(batch).map_err(|e| Error::Schema(format!("failed to write Parquet: {e}")))?;
    writer.close().map_err(|e| Error::Schema(format!("failed to close Parquet writer: {e}")))?;
    Ok(())
}

/// Write an [`EventTable`] to a Parquet file.
pub fn write_event_parquet(table: &EventTable, path: &Path) -> Result<()> {
    write_record_batch_parquet(&event_table_to_record_batch(table)?, path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
