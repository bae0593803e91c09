//! Loaded dashboard data and the interface the rendering layer reads from.

use std::collections::BTreeMap;
use std::sync::Arc;

use idp_map_analytics::derived::{DisplacementFields, with_net_displacement};
use idp_map_analytics::{aggregate_by_entity_and_period, query, query_entity_totals, views};
use idp_map_analytics_models::{
    BarChartView, Extent, HeatmapView, Measures, Period, PeriodExtractor, Summary,
    TotalsLookup,
};
use idp_map_dataset::definition::{DatasetDefinition, LoadedDataset};
use idp_map_geography::join_table;
use idp_map_geography_models::{GeometryDocument, JoinedGeometry};

use crate::config::{MapMeasure, NET, YEARLY_ARRIVALS, YEARLY_DEPARTURES};

/// Entity name of the national conflict series.
pub const NATIONAL: &str = "Afghanistan";

/// A loaded dataset together with its definition.
#[derive(Debug, Clone)]
pub struct DatasetInput {
    /// How the dataset was read.
    pub definition: DatasetDefinition,
    /// What was read.
    pub loaded: LoadedDataset,
}

impl DatasetInput {
    fn summarize(&self) -> Summary {
        let extractor = self.definition.period_extractor();
        aggregate_by_entity_and_period(
            &self.loaded.records,
            &self.definition.entity,
            |record| extractor.extract(record),
            &self.definition.measures(),
        )
    }
}

/// Every input of one dashboard, already aggregated. Immutable once built.
#[derive(Debug, Clone)]
pub struct DashboardData {
    yearly: Arc<Summary>,
    all_time: Arc<Summary>,
    conflict: Arc<Summary>,
    conflict_yearly: Arc<Summary>,
    geometry: Arc<GeometryDocument>,
    geometry_key: String,
    coercion_issues: BTreeMap<String, usize>,
}

impl DashboardData {
    /// Aggregates the loaded inputs.
    ///
    /// `yearly` is the per-province, per-year table, `province_totals` the
    /// all-time table, `settlements` the settlement-level flows (summed to a
    /// per-province net figure) and `conflict` the national monthly series.
    #[must_use]
    pub fn new(
        yearly: &DatasetInput,
        province_totals: &DatasetInput,
        settlements: &DatasetInput,
        conflict: &DatasetInput,
        geometry: GeometryDocument,
        geometry_key: impl Into<String>,
    ) -> Self {
        let yearly_summary = with_yearly_net(&yearly.summarize());

        let settlement_net = aggregate_by_entity_and_period(
            &with_net_displacement(
                &settlements.loaded.records,
                &DisplacementFields::default(),
                NET,
            ),
            &settlements.definition.entity,
            |_| Period::All,
            &[NET],
        );
        let mut all_time = province_totals.summarize();
        for (entity, period, measures) in settlement_net.iter() {
            if all_time.get(entity, period).is_none() {
                log::debug!(
                    "[{}] No all-time totals for {entity}, skipping its net",
                    settlements.loaded.id
                );
                continue;
            }
            let bucket = all_time.bucket_mut(entity, period, &[]);
            bucket.insert(NET.to_string(), measures.get(NET).copied().unwrap_or(0.0));
        }

        let conflict_fields = conflict.definition.measures();
        let conflict_yearly = match conflict.definition.period_extractor() {
            PeriodExtractor::DateMonth { field } => {
                let by_year = PeriodExtractor::DateYear { field };
                aggregate_by_entity_and_period(
                    &conflict.loaded.records,
                    &conflict.definition.entity,
                    |record| by_year.extract(record),
                    &conflict_fields,
                )
            }
            _ => conflict.summarize(),
        };

        let coercion_issues = [yearly, province_totals, settlements, conflict]
            .iter()
            .map(|input| (input.loaded.id.clone(), input.loaded.issues.len()))
            .collect();

        log::info!(
            "Dashboard ready: {} yearly buckets, {} provinces all-time, {} conflict months, {} boundaries",
            yearly_summary.len(),
            all_time.len(),
            conflict.loaded.records.len(),
            geometry.len()
        );

        Self {
            yearly: Arc::new(yearly_summary),
            all_time: Arc::new(all_time),
            conflict: Arc::new(conflict.summarize()),
            conflict_yearly: Arc::new(conflict_yearly),
            geometry: Arc::new(geometry),
            geometry_key: geometry_key.into(),
            coercion_issues,
        }
    }

    /// The summary that holds `period`: the all-time table for
    /// [`Period::All`], the yearly table otherwise.
    #[must_use]
    pub fn summary_for(&self, period: Period) -> &Summary {
        if period == Period::All {
            &self.all_time
        } else {
            &self.yearly
        }
    }

    /// Totals of one province in one period.
    #[must_use]
    pub fn totals_for_entity_and_period(&self, entity: &str, period: Period) -> TotalsLookup {
        query_entity_totals(self.summary_for(period), entity, period)
    }

    /// Totals of every province that has data for `period`.
    #[must_use]
    pub fn all_entity_totals_for_period(&self, period: Period) -> BTreeMap<String, Measures> {
        query::totals_for_period(self.summary_for(period), period)
    }

    /// Province boundaries annotated with `measure` for `period`.
    #[must_use]
    pub fn annotated_geometry(&self, period: Period, measure: MapMeasure) -> JoinedGeometry {
        join_table(
            &self.geometry,
            &self.all_entity_totals_for_period(period),
            &self.geometry_key,
            measure.field(period),
        )
    }

    /// Color-scale domain of `measure` across provinces for `period`.
    #[must_use]
    pub fn map_extent(&self, period: Period, measure: MapMeasure) -> Option<Extent> {
        query::totals_extent(
            &self.all_entity_totals_for_period(period),
            measure.field(period),
        )
    }

    /// Arrivals and departures of one province in one period.
    #[must_use]
    pub fn bar_chart(&self, province: &str, period: Period) -> BarChartView {
        views::bar_chart(
            self.summary_for(period),
            province,
            period,
            &[
                MapMeasure::Arrivals.field(period),
                MapMeasure::Departures.field(period),
            ],
        )
    }

    /// Month-by-year heatmap of the national conflict series.
    #[must_use]
    pub fn heatmap(&self, measure: &str) -> HeatmapView {
        views::heatmap(&self.conflict, NATIONAL, measure)
    }

    /// National yearly conflict figures joined with national IDP arrivals
    /// and departures for the same years.
    #[must_use]
    pub fn national_trend(&self) -> Summary {
        let national_idps = aggregate_national(&self.yearly);
        query::merge_by_period(
            &self.conflict_yearly,
            &national_idps,
            &[YEARLY_ARRIVALS, YEARLY_DEPARTURES],
        )
    }

    /// Province names with yearly data, sorted.
    #[must_use]
    pub fn provinces(&self) -> Vec<String> {
        query::entities(&self.yearly)
    }

    /// Selectable periods: every yearly period, then [`Period::All`].
    #[must_use]
    pub fn periods(&self) -> Vec<Period> {
        let mut periods = query::periods(&self.yearly);
        periods.retain(|period| *period != Period::Undated);
        periods.push(Period::All);
        periods
    }

    /// The boundaries, unannotated.
    #[must_use]
    pub fn geometry(&self) -> &GeometryDocument {
        &self.geometry
    }

    /// Number of defaulted values per dataset id.
    #[must_use]
    pub const fn coercion_issues(&self) -> &BTreeMap<String, usize> {
        &self.coercion_issues
    }
}

/// Adds a `net` measure (arrivals minus departures) to every bucket.
fn with_yearly_net(summary: &Summary) -> Summary {
    let mut out = Summary::new();
    for (entity, period, measures) in summary.iter() {
        let mut measures = measures.clone();
        let net = measures.get(YEARLY_ARRIVALS).copied().unwrap_or(0.0)
            - measures.get(YEARLY_DEPARTURES).copied().unwrap_or(0.0);
        measures.insert(NET.to_string(), net);
        out.insert(entity, period, measures);
    }
    out
}

/// Sums every province into a single national entity per period.
fn aggregate_national(summary: &Summary) -> Summary {
    let mut out = Summary::new();
    for (period, measures) in query::collapse_entities(summary) {
        out.insert(NATIONAL, period, measures);
    }
    out
}


#[cfg(test)]
mod tests {
    use idp_map_analytics_models::Bar;
    use idp_map_dataset::registry;
    use idp_map_geography::load_geojson;

    use super::fixtures::{self, dashboard};
    use super::*;

    #[test]
    fn yearly_lookup_distinguishes_missing_from_zero() {
        let data = dashboard();

        let kabul_2022 = data.totals_for_entity_and_period("Kabul", Period::Year(2022));
        assert_eq!(kabul_2022.measure("arrivals"), Some(0.0));

        let kabul_2021 = data.totals_for_entity_and_period("Kabul", Period::Year(2021));
        assert_eq!(kabul_2021.measure("arrivals"), Some(100.0));
        assert_eq!(kabul_2021.measure("departures"), Some(0.0));

        assert_eq!(
            data.totals_for_entity_and_period("Kandahar", Period::Year(2021)),
            TotalsLookup::NotFound
        );
        assert_eq!(
            data.totals_for_entity_and_period("Kabul", Period::Year(2019)),
            TotalsLookup::NotFound
        );
    }

    #[test]
    fn all_time_totals_include_settlement_net() {
        let data = dashboard();
        let totals = data.all_entity_totals_for_period(Period::All);

        assert_eq!(totals["Kabul"]["Arrival IDPs"], 600.0);
        assert_eq!(totals["Kabul"]["net"], 67.0);
        assert_eq!(totals["Herat"]["net"], 5.0);
        assert_eq!(totals["Ghazni"].get("net"), None);
    }

    #[test]
    fn settlement_only_province_has_no_all_time_totals() {
        let settlements = "\
ADM1NameEnglish,Settlement,Arrival IDPs,Fled IDPs,Returned IDPs,Outmigrants,Returnees from Abroad
Kabul,A,100,30,10,5,2
Nuristan,Z,4,1,0,0,0
";
        let data = DashboardData::new(
            &fixtures::input(registry::IDP_BY_YEAR, fixtures::IDP_BY_YEAR_CSV),
            &fixtures::input(registry::PROVINCE_TOTALS, fixtures::PROVINCE_TOTALS_CSV),
            &fixtures::input(registry::SETTLEMENTS, settlements),
            &fixtures::input(registry::CONFLICT_MONTHLY, fixtures::CONFLICT_CSV),
            load_geojson(&fixtures::geojson()).unwrap(),
            "shapeName",
        );

        assert_eq!(
            data.totals_for_entity_and_period("Nuristan", Period::All),
            TotalsLookup::NotFound
        );
        assert!(matches!(
            data.bar_chart("Nuristan", Period::All),
            BarChartView::NoData { .. }
        ));
        assert_eq!(
            data.totals_for_entity_and_period("Kabul", Period::All)
                .measure("net"),
            Some(77.0)
        );
    }

    #[test]
    fn range_period_is_its_own_bucket() {
        let data = dashboard();
        let lookup = data.totals_for_entity_and_period(
            "Kabul",
            Period::Range {
                start: 2012,
                end: 2018,
            },
        );
        assert_eq!(lookup.measure("arrivals"), Some(500.0));
        assert_eq!(lookup.measure("net"), Some(480.0));
    }

    #[test]
    fn map_leaves_unmatched_provinces_unannotated() {
        let data = dashboard();
        let joined = data.annotated_geometry(Period::Year(2021), MapMeasure::Arrivals);

        assert_eq!(joined.feature("Kabul").unwrap().value, Some(100.0));
        assert_eq!(joined.feature("Herat").unwrap().value, Some(30.0));
        assert_eq!(joined.feature("Kandahar").unwrap().value, None);
        assert_eq!(joined.report.unmatched_features, vec!["Kandahar"]);

        let all_time = data.annotated_geometry(Period::All, MapMeasure::Departures);
        assert_eq!(all_time.feature("Kabul").unwrap().value, Some(30.0));
        assert_eq!(all_time.report.unmatched_entities, vec!["Ghazni"]);
    }

    #[test]
    fn map_extent_covers_all_provinces() {
        let data = dashboard();
        let extent = data.map_extent(Period::All, MapMeasure::Arrivals).unwrap();
        assert_eq!((extent.min, extent.max), (10.0, 600.0));
        assert_eq!(data.map_extent(Period::Year(1990), MapMeasure::Arrivals), None);
    }

    #[test]
    fn bar_chart_reports_no_data_for_missing_year() {
        let data = dashboard();

        assert!(matches!(
            data.bar_chart("Kabul", Period::Year(2020)),
            BarChartView::NoData { .. }
        ));
        match data.bar_chart("Kabul", Period::Year(2022)) {
            BarChartView::Bars { bars, .. } => assert_eq!(
                bars,
                vec![
                    Bar {
                        measure: "arrivals".to_string(),
                        value: 0.0
                    },
                    Bar {
                        measure: "departures".to_string(),
                        value: 0.0
                    },
                ]
            ),
            other => panic!("expected bars, got {other:?}"),
        }
    }

    #[test]
    fn heatmap_and_trend_use_national_series() {
        let data = dashboard();

        let view = data.heatmap("Fatalities");
        assert_eq!(view.cells.len(), 3);
        assert_eq!(view.cells[2].value, 0.0);

        let trend = data.national_trend();
        let y2021 = trend.get(NATIONAL, Period::Year(2021)).unwrap();
        assert_eq!(y2021["Events"], 14.0);
        assert_eq!(y2021["arrivals"], 130.0);
    }

    #[test]
    fn selectors_and_issue_counts() {
        let data = dashboard();
        assert_eq!(data.provinces(), vec!["Herat", "Kabul"]);
        assert_eq!(data.periods().last(), Some(&Period::All));
        assert_eq!(data.coercion_issues()["idp_by_year"], 3);
        assert_eq!(data.coercion_issues()["conflict_monthly"], 1);
    }
}
