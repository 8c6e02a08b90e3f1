mod common;

use std::sync::Arc;

use common::{phase_grid, SyntheticObject};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use ssphot::band::Band;
use ssphot::dynamics::moid::GridMoidSolver;
use ssphot::dynamics::{MpcOrbit, OrbitCatalog};
use ssphot::observations::{DetectionRow, SourceRow};
use ssphot::ssobject::params::AggregationParams;
use ssphot::ssobject::pipeline::SsObjectPipeline;
use ssphot::ssp_errors::SspError;

const DESIGNATIONS: [&str; 4] = ["2019 AA1", "2020 BC12", "2021 XY", "2022 KL3"];

fn survey(rng: &mut StdRng) -> (Vec<SourceRow>, Vec<DetectionRow>) {
    let (mut sources, mut detections) = (Vec::new(), Vec::new());
    let mut dia = 1;
    for (k, &designation) in DESIGNATIONS.iter().enumerate() {
        for (j, band) in [Band::G, Band::R, Band::I].into_iter().enumerate() {
            let n = 1 + 3 * j + k;
            let obj = SyntheticObject {
                ss_object_id: 1000 - k as u64,
                designation,
                band,
                h: 14.0 + k as f64,
                g12: 0.2 + 0.1 * j as f64,
                mag_err: 0.04,
            };
            let phases = if n == 1 { vec![9.0] } else { phase_grid(3.0, 24.0, n) };
            obj.push_rows(&phases, dia, Some(&mut *rng), &mut sources, &mut detections);
            dia += n as u64;
        }
    }
    // the join must not depend on row order
    sources.shuffle(rng);
    detections.shuffle(rng);
    (sources, detections)
}

fn catalog() -> OrbitCatalog {
    DESIGNATIONS[..2]
        .iter()
        .enumerate()
        .map(|(k, d)| MpcOrbit {
            designation: Arc::from(*d),
            q: 1.1 + 0.4 * k as f64,
            e: 0.2,
            i: 8.0,
            node: 40.0,
            argperi: 75.0,
        })
        .collect()
}

#[test]
fn one_record_per_object_in_id_order() {
    let mut rng = StdRng::seed_from_u64(1);
    let (sources, detections) = survey(&mut rng);
    let pipeline = SsObjectPipeline::new(AggregationParams::default());
    let records = pipeline.compute(&sources, &detections, &catalog()).unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.ss_object_id).collect();
    assert_eq!(ids, vec![997, 998, 999, 1000]);

    let total: u32 = records.iter().map(|r| r.n_obs).sum();
    assert_eq!(total as usize, sources.len());

    // 1000 and 999 are in the catalog, 998 and 997 are not
    assert!(records[3].dynamics.tisserand_j.is_finite());
    assert!(records[2].dynamics.moid_earth.moid.is_finite());
    assert!(records[1].dynamics.tisserand_j.is_nan());
    assert!(records[0].dynamics.moid_earth.delta_v.is_nan());

    // object 1000 has a single g-band point
    assert_eq!(records[3].band(Band::G).n_obs_used, 0);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let mut rng = StdRng::seed_from_u64(2);
    let (sources, detections) = survey(&mut rng);
    let pipeline =
        SsObjectPipeline::with_solver(AggregationParams::default(), GridMoidSolver::default());

    let first = pipeline.compute(&sources, &detections, &catalog()).unwrap();
    let second = pipeline.compute(&sources, &detections, &catalog()).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
        for (x, y) in a.bands.iter().zip(&b.bands) {
            assert_eq!(x.h.to_bits(), y.h.to_bits());
            assert_eq!(x.g12_err.to_bits(), y.g12_err.to_bits());
        }
    }
}

#[test]
fn missing_detection_aborts_the_batch() {
    let mut rng = StdRng::seed_from_u64(3);
    let (sources, mut detections) = survey(&mut rng);
    let removed = detections.pop().unwrap().dia_source_id;

    let err = SsObjectPipeline::new(AggregationParams::default())
        .compute(&sources, &detections, &catalog())
        .unwrap_err();
    assert!(err.is_integrity_error());
    assert_eq!(
        err,
        SspError::JoinRowCountMismatch {
            sources: sources.len(),
            joined: sources.len() - 1,
            first_missing: removed,
        }
    );
    assert!(err.to_string().contains(&removed.to_string()));
}

#[test]
fn duplicate_detection_aborts_the_batch() {
    let mut rng = StdRng::seed_from_u64(4);
    let (sources, mut detections) = survey(&mut rng);
    detections.push(detections[0].clone());

    let err = SsObjectPipeline::new(AggregationParams::default())
        .compute(&sources, &detections, &catalog())
        .unwrap_err();
    assert!(matches!(err, SspError::DuplicateDetection(_)));
}
