use std::env;
use std::error::Error;

use camino::Utf8PathBuf;
use flexi_logger::Logger;
use log::info;

use ssphot::band::Band;
use ssphot::io::parquet_reader::{read_diasource, read_mpcorb, read_sssource};
use ssphot::io::parquet_writer::{write_ssobject, ParquetWriterConfig};
use ssphot::ssobject::params::AggregationParams;
use ssphot::ssobject::BandStatus;
use ssphot::ssobject::pipeline::SsObjectPipeline;

/// Build an SSObject table from SSSource, DiaSource and MPCORB Parquet files.
///
/// Usage:
///   build_ssobject <sssource.parquet> <diasource.parquet> <mpcorb.parquet> <out.parquet>
///
/// The log level follows `RUST_LOG` and defaults to `info`.
fn main() -> Result<(), Box<dyn Error>> {
    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    let args: Vec<Utf8PathBuf> = env::args().skip(1).map(Utf8PathBuf::from).collect();
    let [sssource, diasource, mpcorb, out] = args.as_slice() else {
        return Err("usage: build_ssobject <sssource> <diasource> <mpcorb> <out>".into());
    };

    let sources = read_sssource(sssource, None)?;
    let detections = read_diasource(diasource, None)?;
    let catalog = read_mpcorb(mpcorb, None)?;

    let pipeline = SsObjectPipeline::new(AggregationParams::default());
    let records = pipeline.compute(&sources, &detections, &catalog)?;

    for band in Band::ALL {
        let fitted = records
            .iter()
            .filter(|r| r.band(band).status == BandStatus::Fitted)
            .count();
        info!("{band}: {fitted} fitted phase curves");
    }
    let failed = records.iter().filter(|r| r.flags != 0).count();
    info!("{failed} objects with at least one failed fit");

    write_ssobject(&records, out, &ParquetWriterConfig::default())?;
    Ok(())
}
