//! Serial and partitioned-parallel overlap builds.

use std::sync::Arc;

use tractmap_skymap::TractIndex;
use tractmap_skymap_models::{ClosestTractMap, OverlapRecord, TractId, Visit, VisitId};

use crate::partition::partition_ranges;
use crate::progress::ProgressCallback;
use crate::{BuildError, BuildOptions, OverlapTable};

/// Per-partition accumulator, merged and renumbered after the join barrier.
#[derive(Debug, Default)]
struct PartitionOutput {
    /// Overlapping (tract, visit) pairs in visit-then-tract order.
    pairs: Vec<(TractId, VisitId)>,
    /// Nearest tract per visit, in visit order.
    closest: Vec<(VisitId, TractId)>,
}

/// Builds the overlap table over the whole visit slice, in order.
///
/// Every visit is processed even when its overlap set is empty; each one
/// contributes exactly one closest-tract entry. Overlap ids are dense and
/// sequential in visit-then-tract order.
///
/// # Errors
///
/// Returns a configuration error if the options are invalid; validation
/// happens before any visit is processed.
pub fn build_overlap_table(
    visits: &[Visit],
    index: &TractIndex,
    options: &BuildOptions,
    progress: &dyn ProgressCallback,
) -> Result<OverlapTable, BuildError> {
    options.validate()?;

    progress.set_total(visits.len() as u64);
    let output = resolve_range(visits, index, options.max_sep_deg, progress);
    let table = assemble(vec![output]);
    progress.finish(format!("Resolved {} visits", visits.len()));
    Ok(table)
}

/// Partitioned-parallel overlap build.
///
/// Splits the visit table into contiguous ranges and resolves each range in
/// a blocking worker over shared read-only views. The output is identical
/// to the serial build: partition outputs are concatenated in partition
/// order and ids reassigned densely after the join barrier. The first
/// worker failure aborts the remaining tasks and fails the whole build with
/// no partial output.
///
/// # Errors
///
/// Returns a configuration error if the options are invalid, or a join
/// error if a worker panics or is cancelled.
pub async fn build_overlap_table_parallel(
    visits: Arc<Vec<Visit>>,
    index: Arc<TractIndex>,
    options: &BuildOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<OverlapTable, BuildError> {
    options.validate()?;

    let ranges = partition_ranges(visits.len(), options.partitions);
    progress.set_total(visits.len() as u64);
    log::debug!(
        "Resolving {} visits across {} partitions",
        visits.len(),
        ranges.len()
    );

    let mut tasks = tokio::task::JoinSet::new();
    for (slot, range) in ranges.into_iter().enumerate() {
        let visits = Arc::clone(&visits);
        let index = Arc::clone(&index);
        let progress = Arc::clone(&progress);
        let max_sep_deg = options.max_sep_deg;
        tasks.spawn_blocking(move || {
            (
                slot,
                resolve_range(&visits[range], &index, max_sep_deg, progress.as_ref()),
            )
        });
    }

    let mut outputs: Vec<(usize, PartitionOutput)> = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(output) => outputs.push(output),
            Err(err) => {
                tasks.abort_all();
                return Err(err.into());
            }
        }
    }
    outputs.sort_by_key(|(slot, _)| *slot);

    let table = assemble(outputs.into_iter().map(|(_, output)| output).collect());
    progress.finish(format!("Resolved {} visits", table.closest.len()));
    Ok(table)
}

/// Resolves a contiguous run of visits. Shared by the serial build and by
/// each parallel worker.
fn resolve_range(
    visits: &[Visit],
    index: &TractIndex,
    max_sep_deg: f64,
    progress: &dyn ProgressCallback,
) -> PartitionOutput {
    let mut output = PartitionOutput {
        pairs: Vec::new(),
        closest: Vec::with_capacity(visits.len()),
    };
    for visit in visits {
        let resolved = index.resolve_visit(visit.center, max_sep_deg);
        for tract in resolved.overlaps {
            output.pairs.push((tract, visit.id));
        }
        output.closest.push((visit.id, resolved.closest_tract));
        progress.inc(1);
    }
    output
}

/// Concatenates partition outputs in partition order and assigns dense
/// sequential overlap ids.
fn assemble(outputs: Vec<PartitionOutput>) -> OverlapTable {
    let mut records = Vec::new();
    let mut closest = ClosestTractMap::new();
    let mut next_id = 0_i64;
    for output in outputs {
        for (tract, visit) in output.pairs {
            records.push(OverlapRecord {
                id: next_id,
                tract,
                visit,
            });
            next_id += 1;
        }
        closest.extend(output.closest);
    }
    OverlapTable { records, closest }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;
    use tractmap_skymap_models::{Band, SkyCoord, Tract};

    fn tract(id: TractId, ra_deg: f64, dec_deg: f64) -> Tract {
        Tract {
            id,
            center: SkyCoord::new(ra_deg, dec_deg).unwrap(),
        }
    }

    fn visit(id: VisitId, ra_deg: f64, dec_deg: f64) -> Visit {
        Visit {
            id,
            center: SkyCoord::new(ra_deg, dec_deg).unwrap(),
            band: Band::R,
            survey_id: None,
            mjd: None,
            nearest_tract: None,
        }
    }

    fn survey_index() -> TractIndex {
        TractIndex::build(&[
            tract(1, 10.0, 0.0),
            tract(2, 10.0, 5.0),
            tract(3, 350.0, 0.0),
        ])
        .unwrap()
    }

    fn options(max_sep_deg: f64, partitions: usize) -> BuildOptions {
        BuildOptions {
            max_sep_deg,
            partitions,
        }
    }

    #[test]
    fn serial_build_assigns_dense_ids_in_visit_order() {
        let index = survey_index();
        // 100 overlaps tract 1 only; 101 overlaps tracts 1 and 2; 102 is far
        // from everything and contributes only a closest entry.
        let visits = vec![visit(100, 9.0, 1.0), visit(101, 10.0, 2.4), visit(102, 180.0, 80.0)];

        let table =
            build_overlap_table(&visits, &index, &options(3.0, 1), null_progress().as_ref())
                .unwrap();

        let rows: Vec<(i64, TractId, VisitId)> =
            table.records.iter().map(|r| (r.id, r.tract, r.visit)).collect();
        assert_eq!(rows, vec![(0, 1, 100), (1, 1, 101), (2, 2, 101)]);
        assert_eq!(
            table.closest,
            ClosestTractMap::from([(100, 1), (101, 1), (102, 2)])
        );
    }

    #[test]
    fn every_visit_gets_exactly_one_closest_entry() {
        let index = survey_index();
        let visits: Vec<Visit> = (0..15_i32)
            .map(|i| visit(i64::from(i), 5.0 + f64::from(i), -10.0))
            .collect();
        let table =
            build_overlap_table(&visits, &index, &options(3.15, 1), null_progress().as_ref())
                .unwrap();
        assert_eq!(table.closest.len(), visits.len());
    }

    #[test]
    fn empty_visit_table_builds_empty_output() {
        let index = survey_index();
        let table =
            build_overlap_table(&[], &index, &options(3.15, 1), null_progress().as_ref()).unwrap();
        assert!(table.records.is_empty());
        assert!(table.closest.is_empty());
    }

    #[test]
    fn invalid_options_fail_before_processing() {
        let index = survey_index();
        let visits = vec![visit(1, 9.0, 1.0)];
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let err =
                build_overlap_table(&visits, &index, &options(bad, 1), null_progress().as_ref())
                    .unwrap_err();
            assert!(matches!(err, BuildError::Config { .. }), "max_sep {bad}");
        }
        let err = build_overlap_table(&visits, &index, &options(3.15, 0), null_progress().as_ref())
            .unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }

    #[tokio::test]
    async fn parallel_build_matches_serial() {
        let tracts: Vec<Tract> = (0..40_i32)
            .map(|i| {
                tract(
                    i64::from(i),
                    f64::from(i * 53 % 360) + 0.25,
                    f64::from(i * 37 % 170) - 84.5,
                )
            })
            .collect();
        let visits: Vec<Visit> = (0..25_i32)
            .map(|i| {
                visit(
                    i64::from(1000 + i),
                    f64::from(i * 97 % 360) + 0.5,
                    f64::from(i * 61 % 160) - 79.5,
                )
            })
            .collect();
        let index = Arc::new(TractIndex::build(&tracts).unwrap());

        let serial = build_overlap_table(
            &visits,
            &index,
            &options(3.15, 1),
            null_progress().as_ref(),
        )
        .unwrap();
        let parallel = build_overlap_table_parallel(
            Arc::new(visits),
            Arc::clone(&index),
            &options(3.15, 4),
            null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(serial, parallel);
        for (position, record) in parallel.records.iter().enumerate() {
            assert_eq!(record.id, i64::try_from(position).unwrap());
        }
    }

    #[tokio::test]
    async fn parallel_build_handles_more_partitions_than_visits() {
        let index = Arc::new(survey_index());
        let visits = vec![visit(100, 9.0, 1.0), visit(101, 180.0, 80.0)];
        let table = build_overlap_table_parallel(
            Arc::new(visits),
            index,
            &options(3.0, 16),
            null_progress(),
        )
        .await
        .unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.closest.len(), 2);
    }
}
