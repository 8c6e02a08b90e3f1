//! # Parquet ingestion
//!
//! Column-projected readers for the three input tables of the SSObject pipeline:
//!
//! | table | function | columns |
//! |---|---|---|
//! | SSSource | [`read_sssource`] | `ssObjectId`, `diaSourceId`, `unpacked_primary_provisional_designation`, `phaseAngle`, `topocentricDist`, `heliocentricDist` |
//! | DiaSource | [`read_diasource`] | `diaSourceId`, `midpointMjdTai`, `ra`, `dec`, `extendedness`, `band`, `psfFlux`, `psfFluxErr` |
//! | MPCORB | [`read_mpcorb`] | `unpacked_primary_provisional_designation`, `q`, `e`, `i`, `node`, `argperi` |
//!
//! Only the listed leaf columns are materialized; any other column in the file is skipped.
//! Columns are located by **name**, so their position in the file does not matter.
//!
//! ## Accepted types
//!
//! * identifiers: `UInt64` or `Int64` (negative values are rejected),
//! * floats: `Float64` or `Float32`; nulls read as `NaN`,
//! * strings: `Utf8` or `LargeUtf8`; nulls are rejected.
//!
//! A missing column yields [`SspError::MissingColumn`], a column of another type or with a
//! rejected value yields [`SspError::InvalidColumn`].

use std::fs::File;
use std::str::FromStr;
use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, Float32Array, Float64Array, Int64Array, LargeStringArray, RecordBatch,
    StringArray, UInt64Array,
};
use camino::Utf8Path;
use log::info;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;

use crate::band::Band;
use crate::constants::FastHashMap;
use crate::dynamics::{MpcOrbit, OrbitCatalog};
use crate::observations::{DetectionRow, SourceRow};
use crate::ssp_errors::SspError;

/// Default Arrow batch size.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

const DESIGNATION: &str = "unpacked_primary_provisional_designation";

pub const SSSOURCE_COLUMNS: [&str; 6] = [
    "ssObjectId",
    "diaSourceId",
    DESIGNATION,
    "phaseAngle",
    "topocentricDist",
    "heliocentricDist",
];

pub const DIASOURCE_COLUMNS: [&str; 8] = [
    "diaSourceId",
    "midpointMjdTai",
    "ra",
    "dec",
    "extendedness",
    "band",
    "psfFlux",
    "psfFluxErr",
];

pub const MPCORB_COLUMNS: [&str; 6] = [DESIGNATION, "q", "e", "i", "node", "argperi"];

/// Open `path` and project it onto `columns`.
fn projected_reader(
    path: &Utf8Path,
    columns: &[&str],
    batch_size: Option<usize>,
) -> Result<ParquetRecordBatchReader, SspError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema_descr = builder.metadata().file_metadata().schema_descr();
    let leaves = schema_descr.columns();
    let indices = columns
        .iter()
        .map(|name| {
            leaves
                .iter()
                .position(|c| c.name() == *name)
                .ok_or_else(|| SspError::MissingColumn((*name).to_string()))
        })
        .collect::<Result<Vec<usize>, _>>()?;
    let mask = ProjectionMask::leaves(schema_descr, indices);

    Ok(builder
        .with_projection(mask)
        .with_batch_size(batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, SspError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SspError::MissingColumn(name.to_string()))
}

/// Identifier column as `u64`.
fn u64_values(batch: &RecordBatch, name: &str) -> Result<Vec<u64>, SspError> {
    let col = column(batch, name)?;
    if col.null_count() > 0 {
        return Err(SspError::InvalidColumn(format!("{name} contains nulls")));
    }
    if let Some(arr) = col.as_any().downcast_ref::<UInt64Array>() {
        return Ok(arr.values().to_vec());
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        return arr
            .values()
            .iter()
            .map(|&v| {
                u64::try_from(v)
                    .map_err(|_| SspError::InvalidColumn(format!("{name} has negative value {v}")))
            })
            .collect();
    }
    Err(SspError::InvalidColumn(format!(
        "{name} must be UInt64 or Int64, found {}",
        col.data_type()
    )))
}

/// Float column as `f64`, nulls mapped to `NaN`.
fn f64_values(batch: &RecordBatch, name: &str) -> Result<Vec<f64>, SspError> {
    let col = column(batch, name)?;
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect());
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        return Ok(arr
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect());
    }
    Err(SspError::InvalidColumn(format!(
        "{name} must be Float64 or Float32, found {}",
        col.data_type()
    )))
}

/// String column, passed value by value to `f`.
fn for_each_str(
    batch: &RecordBatch,
    name: &str,
    mut f: impl FnMut(&str) -> Result<(), SspError>,
) -> Result<(), SspError> {
    let col = column(batch, name)?;
    if col.null_count() > 0 {
        return Err(SspError::InvalidColumn(format!("{name} contains nulls")));
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return (0..arr.len()).try_for_each(|k| f(arr.value(k)));
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return (0..arr.len()).try_for_each(|k| f(arr.value(k)));
    }
    Err(SspError::InvalidColumn(format!(
        "{name} must be Utf8 or LargeUtf8, found {}",
        col.data_type()
    )))
}

/// Shares one `Arc<str>` between all rows carrying the same designation.
#[derive(Default)]
struct Interner {
    seen: FastHashMap<String, Arc<str>>,
}

impl Interner {
    fn get(&mut self, s: &str) -> Arc<str> {
        if let Some(a) = self.seen.get(s) {
            return Arc::clone(a);
        }
        let a: Arc<str> = Arc::from(s);
        self.seen.insert(s.to_string(), Arc::clone(&a));
        a
    }
}

/// Read SSSource rows.
///
/// Arguments
/// -----------------
/// * `path`: Parquet file.
/// * `batch_size`: Arrow batch size, [`DEFAULT_BATCH_SIZE`] when `None`.
pub fn read_sssource(
    path: &Utf8Path,
    batch_size: Option<usize>,
) -> Result<Vec<SourceRow>, SspError> {
    let reader = projected_reader(path, &SSSOURCE_COLUMNS, batch_size)?;
    let mut rows = Vec::new();
    let mut interner = Interner::default();

    for maybe_batch in reader {
        let batch = maybe_batch?;
        let obj = u64_values(&batch, "ssObjectId")?;
        let dia = u64_values(&batch, "diaSourceId")?;
        let phase = f64_values(&batch, "phaseAngle")?;
        let topo = f64_values(&batch, "topocentricDist")?;
        let helio = f64_values(&batch, "heliocentricDist")?;

        let mut k = 0;
        rows.reserve(batch.num_rows());
        for_each_str(&batch, DESIGNATION, |designation| {
            rows.push(SourceRow {
                ss_object_id: obj[k],
                dia_source_id: dia[k],
                designation: interner.get(designation),
                phase_angle: phase[k],
                topocentric_dist: topo[k],
                heliocentric_dist: helio[k],
            });
            k += 1;
            Ok(())
        })?;
    }

    info!("Loaded {} SSSource rows from {path}", rows.len());
    Ok(rows)
}

/// Read DiaSource rows; the `band` column holds one-letter filter names.
pub fn read_diasource(
    path: &Utf8Path,
    batch_size: Option<usize>,
) -> Result<Vec<DetectionRow>, SspError> {
    let reader = projected_reader(path, &DIASOURCE_COLUMNS, batch_size)?;
    let mut rows = Vec::new();

    for maybe_batch in reader {
        let batch = maybe_batch?;
        let dia = u64_values(&batch, "diaSourceId")?;
        let epoch = f64_values(&batch, "midpointMjdTai")?;
        let ra = f64_values(&batch, "ra")?;
        let dec = f64_values(&batch, "dec")?;
        let ext = f64_values(&batch, "extendedness")?;
        let flux = f64_values(&batch, "psfFlux")?;
        let flux_err = f64_values(&batch, "psfFluxErr")?;

        let mut k = 0;
        rows.reserve(batch.num_rows());
        for_each_str(&batch, "band", |band| {
            rows.push(DetectionRow {
                dia_source_id: dia[k],
                midpoint_mjd_tai: epoch[k],
                ra: ra[k],
                dec: dec[k],
                extendedness: ext[k],
                band: Band::from_str(band)?,
                psf_flux: flux[k],
                psf_flux_err: flux_err[k],
            });
            k += 1;
            Ok(())
        })?;
    }

    info!("Loaded {} DiaSource rows from {path}", rows.len());
    Ok(rows)
}

/// Read an MPC orbit table into an [`OrbitCatalog`]. Angles are expected in degrees.
pub fn read_mpcorb(path: &Utf8Path, batch_size: Option<usize>) -> Result<OrbitCatalog, SspError> {
    let reader = projected_reader(path, &MPCORB_COLUMNS, batch_size)?;
    let mut catalog = OrbitCatalog::new();

    for maybe_batch in reader {
        let batch = maybe_batch?;
        let q = f64_values(&batch, "q")?;
        let e = f64_values(&batch, "e")?;
        let i = f64_values(&batch, "i")?;
        let node = f64_values(&batch, "node")?;
        let argperi = f64_values(&batch, "argperi")?;

        let mut k = 0;
        for_each_str(&batch, DESIGNATION, |designation| {
            catalog.insert(MpcOrbit {
                designation: Arc::from(designation),
                q: q[k],
                e: e[k],
                i: i[k],
                node: node[k],
                argperi: argperi[k],
            });
            k += 1;
            Ok(())
        })?;
    }

    info!("Loaded {} MPC orbits from {path}", catalog.len());
    Ok(catalog)
}
