//! Grouping records into `(entity, period)` buckets.

use idp_map_analytics_models::{EntityKey, Period, Summary};
use idp_map_dataset_models::Record;

/// Sums `measures` over `records`, grouped by entity and period.
///
/// Every record lands in exactly one bucket. Buckets that no record fell
/// into are absent from the result rather than zero-filled, and a measure
/// that a record lacks (or holds as non-numeric text) contributes zero.
/// The result does not depend on the order of `records`.
pub fn aggregate_by_entity_and_period<'a, I, F>(
    records: I,
    entity_key: &EntityKey,
    period_fn: F,
    measures: &[&str],
) -> Summary
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> Period,
{
    let mut summary = Summary::new();
    let mut count = 0_usize;

    for record in records {
        let entity = entity_key.resolve(record);
        let bucket = summary.bucket_mut(&entity, period_fn(record), measures);
        for measure in measures {
            if let Some(total) = bucket.get_mut(*measure) {
                *total += record.measure(measure);
            }
        }
        count += 1;
    }

    log::debug!(
        "Aggregated {count} records into {} buckets over {} measures",
        summary.len(),
        measures.len()
    );

    summary
}
