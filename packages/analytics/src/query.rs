//! Lookups and reductions over a [`Summary`].

use std::collections::{BTreeMap, BTreeSet};

use idp_map_analytics_models::{Extent, Measures, Period, Summary, TotalsLookup};

/// Looks up the totals of one `(entity, period)` bucket.
///
/// Returns [`TotalsLookup::NotFound`] when no record ever matched the key,
/// and `Found` (possibly with all-zero totals) otherwise.
#[must_use]
pub fn query_entity_totals(summary: &Summary, entity: &str, period: Period) -> TotalsLookup {
    summary.get(entity, period).into()
}

/// Totals of every entity that has a bucket for `period`.
#[must_use]
pub fn totals_for_period(summary: &Summary, period: Period) -> BTreeMap<String, Measures> {
    summary
        .iter()
        .filter(|(_, p, _)| *p == period)
        .map(|(entity, _, measures)| (entity.to_string(), measures.clone()))
        .collect()
}

/// Per-entity totals summed over every period.
#[must_use]
pub fn collapse_periods(summary: &Summary) -> BTreeMap<String, Measures> {
    let mut totals: BTreeMap<String, Measures> = BTreeMap::new();
    for (entity, _, measures) in summary.iter() {
        add_into(totals.entry(entity.to_string()).or_default(), measures);
    }
    totals
}

/// Per-period totals summed over every entity.
#[must_use]
pub fn collapse_entities(summary: &Summary) -> BTreeMap<Period, Measures> {
    let mut totals: BTreeMap<Period, Measures> = BTreeMap::new();
    for (_, period, measures) in summary.iter() {
        add_into(totals.entry(period).or_default(), measures);
    }
    totals
}

fn add_into(target: &mut Measures, measures: &Measures) {
    for (name, value) in measures {
        *target.entry(name.clone()).or_insert(0.0) += value;
    }
}

/// Distinct entity names, sorted.
#[must_use]
pub fn entities(summary: &Summary) -> Vec<String> {
    summary
        .iter()
        .map(|(entity, _, _)| entity)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct periods, in chronological order.
#[must_use]
pub fn periods(summary: &Summary) -> Vec<Period> {
    summary
        .iter()
        .map(|(_, period, _)| period)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Value range of `values`, `None` when there are none.
#[must_use]
pub fn measure_extent(values: impl IntoIterator<Item = f64>) -> Option<Extent> {
    Extent::from_values(values)
}

/// Value range of one measure across per-entity totals. Entities without
/// the measure are skipped.
#[must_use]
pub fn totals_extent(totals: &BTreeMap<String, Measures>, measure: &str) -> Option<Extent> {
    measure_extent(totals.values().filter_map(|m| m.get(measure).copied()))
}

/// Left-joins `right` onto `left` by period alone.
///
/// Every bucket of `left` is kept. The listed `right_measures`, summed over
/// all of `right`'s entities for the same period, are added to it; they are
/// left out when `right` has no bucket for that period.
#[must_use]
pub fn merge_by_period(left: &Summary, right: &Summary, right_measures: &[&str]) -> Summary {
    let right_by_period = collapse_entities(right);
    let mut merged = Summary::new();

    for (entity, period, measures) in left.iter() {
        let mut combined = measures.clone();
        if let Some(other) = right_by_period.get(&period) {
            for name in right_measures {
                combined.insert(
                    (*name).to_string(),
                    other.get(*name).copied().unwrap_or(0.0),
                );
            }
        }
        merged.insert(entity, period, combined);
    }

    merged
}
