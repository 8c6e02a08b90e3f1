//! # Parquet export of SSObject records
//!
//! One row per [`ObjectSummaryRecord`], one column per scalar field. Band fields are prefixed
//! with the filter letter (`r_H`, `r_G12Err`, `r_H_r_G12_Cov`, ...), and all six bands are always
//! present.
//!
//! The file is written with zstd compression, in row groups of
//! [`ParquetWriterConfig::row_group_size`] rows. It is first written next to the target as
//! `<name>.partial` and renamed once the footer is flushed: an error part-way never leaves a
//! truncated file at the target path.

use std::fs::{self, File};
use std::sync::Arc;

use arrow_array::{
    ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray, UInt32Array, UInt64Array,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

use crate::band::Band;
use crate::ssobject::{BandSummary, ObjectSummaryRecord};
use crate::ssp_errors::SspError;

/// Export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParquetWriterConfig {
    /// Maximum rows per row group (default 1 000 000).
    pub row_group_size: usize,
    pub zstd_level: i32,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        ParquetWriterConfig {
            row_group_size: 1_000_000,
            zstd_level: 3,
        }
    }
}

/// Arrow schema of the exported table.
pub fn ssobject_schema() -> Schema {
    let f64_field = |name: String| Field::new(name, DataType::Float64, false);

    let mut fields = vec![
        Field::new("ssObjectId", DataType::UInt64, false),
        Field::new("designation", DataType::Utf8, false),
        f64_field("firstObservationDate".into()),
        f64_field("discoverySubmissionDate".into()),
        f64_field("arc".into()),
        Field::new("nObs", DataType::UInt32, false),
    ];
    for band in Band::ALL {
        let b = band.as_char();
        fields.push(Field::new(format!("{b}_nObs"), DataType::UInt32, false));
        fields.push(f64_field(format!("{b}_phaseAngleMin")));
        fields.push(f64_field(format!("{b}_phaseAngleMax")));
        fields.push(f64_field(format!("{b}_H")));
        fields.push(f64_field(format!("{b}_HErr")));
        fields.push(f64_field(format!("{b}_G12")));
        fields.push(f64_field(format!("{b}_G12Err")));
        fields.push(f64_field(format!("{b}_H_{b}_G12_Cov")));
        fields.push(f64_field(format!("{b}_Chi2")));
        fields.push(Field::new(format!("{b}_nObsUsed"), DataType::Int32, false));
    }
    fields.extend([
        f64_field("extendednessMin".into()),
        f64_field("extendednessMax".into()),
        f64_field("extendednessMedian".into()),
        Field::new("flags", DataType::UInt64, false),
        f64_field("tisserand_J".into()),
        f64_field("MOIDEarth".into()),
        f64_field("MOIDEarthDeltaV".into()),
        f64_field("MOIDEarthEclipticLongitude".into()),
        f64_field("MOIDEarthTrueAnomaly".into()),
        f64_field("MOIDEarthTrueAnomalyObject".into()),
    ]);
    Schema::new(fields)
}

fn f64_col(records: &[ObjectSummaryRecord], f: impl Fn(&ObjectSummaryRecord) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(records.iter().map(f)))
}

fn band_f64_col(
    records: &[ObjectSummaryRecord],
    band: Band,
    f: impl Fn(&BandSummary) -> f64,
) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(
        records.iter().map(|r| f(r.band(band))),
    ))
}

/// Columnar view of a slice of records, in [`ssobject_schema`] order.
pub fn records_to_batch(
    records: &[ObjectSummaryRecord],
    schema: SchemaRef,
) -> Result<RecordBatch, SspError> {
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(
            records.iter().map(|r| r.ss_object_id),
        )) as ArrayRef,
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| &*r.designation),
        )) as ArrayRef,
        f64_col(records, |r| r.first_observation_date),
        f64_col(records, |r| r.discovery_submission_date),
        f64_col(records, |r| r.arc),
        Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.n_obs))) as ArrayRef,
    ];
    for band in Band::ALL {
        columns.push(Arc::new(UInt32Array::from_iter_values(
            records.iter().map(|r| r.band(band).n_obs),
        )));
        columns.push(band_f64_col(records, band, |b| b.phase_angle_min));
        columns.push(band_f64_col(records, band, |b| b.phase_angle_max));
        columns.push(band_f64_col(records, band, |b| b.h));
        columns.push(band_f64_col(records, band, |b| b.h_err));
        columns.push(band_f64_col(records, band, |b| b.g12));
        columns.push(band_f64_col(records, band, |b| b.g12_err));
        columns.push(band_f64_col(records, band, |b| b.h_g12_cov));
        columns.push(band_f64_col(records, band, |b| b.chi2));
        columns.push(Arc::new(Int32Array::from_iter_values(
            records.iter().map(|r| r.band(band).n_obs_used),
        )));
    }
    columns.extend([
        f64_col(records, |r| r.extendedness_min),
        f64_col(records, |r| r.extendedness_max),
        f64_col(records, |r| r.extendedness_median),
        Arc::new(UInt64Array::from_iter_values(records.iter().map(|r| r.flags))) as ArrayRef,
        f64_col(records, |r| r.dynamics.tisserand_j),
        f64_col(records, |r| r.dynamics.moid_earth.moid),
        f64_col(records, |r| r.dynamics.moid_earth.delta_v),
        f64_col(records, |r| r.dynamics.moid_earth.ecliptic_longitude),
        f64_col(records, |r| r.dynamics.moid_earth.true_anomaly_reference),
        f64_col(records, |r| r.dynamics.moid_earth.true_anomaly_object),
    ]);

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn partial_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut name = path.file_name().unwrap_or("ssobject").to_string();
    name.push_str(".partial");
    path.with_file_name(name)
}

fn write_all(
    records: &[ObjectSummaryRecord],
    file: File,
    config: &ParquetWriterConfig,
) -> Result<(), SspError> {
    let schema: SchemaRef = Arc::new(ssobject_schema());
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(config.zstd_level)?))
        .set_max_row_group_size(config.row_group_size)
        .build();

    let mut writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(props))?;
    for chunk in records.chunks(config.row_group_size) {
        writer.write(&records_to_batch(chunk, Arc::clone(&schema))?)?;
    }
    writer.close()?;
    Ok(())
}

/// Write `records` to `path`.
///
/// Return
/// ----------
/// * `Ok(())` once the file is complete at `path`.
/// * An I/O, Arrow or Parquet error; the target path is then left untouched and no
///   `.partial` file remains.
pub fn write_ssobject(
    records: &[ObjectSummaryRecord],
    path: &Utf8Path,
    config: &ParquetWriterConfig,
) -> Result<(), SspError> {
    if config.row_group_size == 0 {
        return Err(SspError::InvalidWriterConfig(
            "row_group_size must be >= 1".into(),
        ));
    }

    let tmp = partial_path(path);
    let file = File::create(&tmp)?;
    if let Err(e) = write_all(records, file, config) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!("Wrote {} SSObject rows to {path}", records.len());
    Ok(())
}
