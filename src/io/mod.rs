//! Parquet ingestion of the input tables and export of the SSObject table.
//!
//! * [`parquet_reader`] – SSSource, DiaSource and MPCORB readers, projected by column name.
//! * [`parquet_writer`] – zstd-compressed export of [`ObjectSummaryRecord`](crate::ssobject::ObjectSummaryRecord)s.

pub mod parquet_reader;
pub mod parquet_writer;
