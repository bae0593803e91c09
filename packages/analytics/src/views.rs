//! Chart-ready views built from a [`Summary`].

use idp_map_analytics_models::{
    Bar, BarChartView, Extent, HeatmapCell, HeatmapView, Period, Summary, TotalsLookup,
};

use crate::query::query_entity_totals;

/// Bars for one province and period, one per listed measure.
///
/// A province with no bucket for the period yields
/// [`BarChartView::NoData`]; a bucket that summed to zero still yields bars.
#[must_use]
pub fn bar_chart(summary: &Summary, entity: &str, period: Period, measures: &[&str]) -> BarChartView {
    match query_entity_totals(summary, entity, period) {
        TotalsLookup::NotFound => BarChartView::NoData {
            entity: entity.to_string(),
            period,
        },
        TotalsLookup::Found(totals) => BarChartView::Bars {
            entity: entity.to_string(),
            period,
            bars: measures
                .iter()
                .map(|measure| Bar {
                    measure: (*measure).to_string(),
                    value: totals.get(*measure).copied().unwrap_or(0.0),
                })
                .collect(),
        },
    }
}

/// Year-by-month cells of one entity's monthly buckets, colored by
/// `measure`.
///
/// Only month buckets contribute; yearly and undated buckets are ignored.
#[must_use]
pub fn heatmap(summary: &Summary, entity: &str, measure: &str) -> HeatmapView {
    let cells: Vec<HeatmapCell> = summary
        .entity(entity)
        .into_iter()
        .flatten()
        .filter_map(|(period, measures)| match *period {
            Period::YearMonth { year, month } => Some(HeatmapCell {
                year,
                month,
                value: measures.get(measure).copied().unwrap_or(0.0),
                measures: measures.clone(),
            }),
            _ => None,
        })
        .collect();

    let extent = Extent::from_values(cells.iter().map(|cell| cell.value));

    HeatmapView {
        measure: measure.to_string(),
        cells,
        extent,
    }
}

#[cfg(test)]
mod tests {
    use idp_map_analytics_models::Measures;

    use super::*;

    fn measures(pairs: &[(&str, f64)]) -> Measures {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn missing_province_year_has_no_data() {
        let mut summary = Summary::new();
        summary.insert("Kabul", Period::Year(2021), measures(&[("arrivals", 1.0)]));

        let view = bar_chart(&summary, "Kabul", Period::Year(2020), &["arrivals", "departures"]);
        assert_eq!(
            view,
            BarChartView::NoData {
                entity: "Kabul".to_string(),
                period: Period::Year(2020),
            }
        );
    }

    #[test]
    fn zero_bucket_still_has_bars() {
        let mut summary = Summary::new();
        summary.insert(
            "Kabul",
            Period::Year(2021),
            measures(&[("arrivals", 0.0), ("departures", 0.0)]),
        );

        let BarChartView::Bars { bars, .. } =
            bar_chart(&summary, "Kabul", Period::Year(2021), &["arrivals", "departures"])
        else {
            panic!("expected bars");
        };
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|bar| bar.value == 0.0));
        assert_eq!(bars[1].measure, "departures");
    }

    #[test]
    fn bar_chart_serializes_with_status_tag() {
        let mut summary = Summary::new();
        summary.insert("Kabul", Period::Year(2021), measures(&[("arrivals", 3.0)]));

        let json = serde_json::to_value(bar_chart(
            &summary,
            "Kabul",
            Period::Year(2021),
            &["arrivals"],
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "bars",
                "entity": "Kabul",
                "period": "2021",
                "bars": [{ "measure": "arrivals", "value": 3.0 }],
            })
        );
    }

    #[test]
    fn heatmap_keeps_only_month_buckets() {
        let mut summary = Summary::new();
        for (month, fatalities) in [(1, 12.0), (2, 40.0), (3, 7.0)] {
            summary.insert(
                "Afghanistan",
                Period::YearMonth {
                    year: 2019,
                    month,
                },
                measures(&[("Fatalities", fatalities), ("Events", 1.0)]),
            );
        }
        summary.insert("Afghanistan", Period::Undated, measures(&[("Fatalities", 999.0)]));

        let view = heatmap(&summary, "Afghanistan", "Fatalities");

        assert_eq!(view.cells.len(), 3);
        assert_eq!(view.cells[1].month, 2);
        assert_eq!(view.cells[1].measures["Events"], 1.0);
        let extent = view.extent.unwrap();
        assert_eq!((extent.min, extent.max), (7.0, 40.0));
    }

    #[test]
    fn heatmap_of_unknown_entity_is_empty() {
        let view = heatmap(&Summary::new(), "Nowhere", "Fatalities");
        assert!(view.cells.is_empty());
        assert_eq!(view.extent, None);
    }
}
