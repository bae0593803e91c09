//! Selection state of one dashboard session.

use std::sync::Arc;

use idp_map_analytics_models::{BarChartView, Extent, Period};
use idp_map_geography_models::JoinedGeometry;
use serde::{Deserialize, Serialize};

use crate::SessionError;
use crate::config::{DashboardConfig, MapMeasure};
use crate::data::DashboardData;
use crate::generation::{RequestGenerations, RequestTicket};

/// What the user is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Province shown in the bar chart.
    pub province: String,
    /// Period shown in the map and bar chart.
    pub period: Period,
    /// Measure the map is colored by.
    pub measure: MapMeasure,
}

impl Selection {
    /// The selection a session opens with.
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            province: config.default_province.clone(),
            period: config.default_period,
            measure: config.default_measure,
        }
    }
}

/// Everything rendered for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    /// The selection this view was computed for.
    pub selection: Selection,
    /// Province bar chart.
    pub bar_chart: BarChartView,
    /// Annotated province boundaries.
    pub map: JoinedGeometry,
    /// Color-scale domain of the map.
    pub extent: Option<Extent>,
}

impl SelectionView {
    /// Computes the view of `selection` from `data`.
    #[must_use]
    pub fn render(data: &DashboardData, selection: Selection) -> Self {
        Self {
            bar_chart: data.bar_chart(&selection.province, selection.period),
            map: data.annotated_geometry(selection.period, selection.measure),
            extent: data.map_extent(selection.period, selection.measure),
            selection,
        }
    }
}

/// A pending view computation, tagged with the generation it belongs to.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    /// Generation of the selection change that issued this request.
    pub ticket: RequestTicket,
    /// Selection to render.
    pub selection: Selection,
    data: Arc<DashboardData>,
}

impl ViewRequest {
    /// Renders the view on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Join`] if the rendering task panics.
    pub async fn run(self) -> Result<(RequestTicket, SelectionView), SessionError> {
        let Self {
            ticket,
            selection,
            data,
        } = self;
        let view =
            tokio::task::spawn_blocking(move || SelectionView::render(&data, selection)).await?;
        Ok((ticket, view))
    }
}

/// One user's dashboard session.
///
/// Each selection change returns a [`ViewRequest`]. Requests may finish in
/// any order; [`Session::complete`] only accepts the result of the latest
/// one.
#[derive(Debug)]
pub struct Session {
    data: Arc<DashboardData>,
    selection: Selection,
    generations: RequestGenerations,
    view: Option<SelectionView>,
}

impl Session {
    /// Opens a session on `data` with an initial selection.
    #[must_use]
    pub fn new(data: Arc<DashboardData>, selection: Selection) -> Self {
        Self {
            data,
            selection,
            generations: RequestGenerations::new(),
            view: None,
        }
    }

    /// The current selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The most recently accepted view, if any.
    #[must_use]
    pub const fn view(&self) -> Option<&SelectionView> {
        self.view.as_ref()
    }

    /// Requests a view of the current selection.
    #[must_use]
    pub fn request(&self) -> ViewRequest {
        ViewRequest {
            ticket: self.generations.next(),
            selection: self.selection.clone(),
            data: Arc::clone(&self.data),
        }
    }

    /// Selects a province.
    #[must_use]
    pub fn select_province(&mut self, province: impl Into<String>) -> ViewRequest {
        self.selection.province = province.into();
        self.request()
    }

    /// Selects a period.
    #[must_use]
    pub fn select_period(&mut self, period: Period) -> ViewRequest {
        self.selection.period = period;
        self.request()
    }

    /// Selects the map measure.
    #[must_use]
    pub fn select_measure(&mut self, measure: MapMeasure) -> ViewRequest {
        self.selection.measure = measure;
        self.request()
    }

    /// Accepts `view` if `ticket` is still the latest generation.
    ///
    /// Returns whether the view was accepted. A stale view is dropped.
    pub fn complete(&mut self, ticket: RequestTicket, view: SelectionView) -> bool {
        if !self.generations.is_current(ticket) {
            log::debug!(
                "Discarding stale view for generation {} (current {})",
                ticket.generation(),
                self.generations.current().generation()
            );
            return false;
        }
        self.view = Some(view);
        true
    }

    /// Renders the current selection and accepts the result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Join`] if the rendering task panics.
    pub async fn refresh(&mut self) -> Result<Option<&SelectionView>, SessionError> {
        let (ticket, view) = self.request().run().await?;
        self.complete(ticket, view);
        Ok(self.view.as_ref())
    }
}
