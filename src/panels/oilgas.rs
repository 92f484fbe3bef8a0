//! Well production, offset wells and the field overview map.

use crate::chart::layout::{Axis, Layout, Margin};
use crate::chart::trace::{ColorBar, ColorSpec, Colorscale, Heatmap, Marker, Scatter, ScatterMapbox};
use crate::chart::Chart;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::DashboardError;
use crate::panels::palette::{self, ramp, MONTH_RAMP};
use crate::panels::{base_layout, map_layout, spline};
use crate::reshape::aggregate::{quantile, Aggregator};
use crate::reshape::band::offset_band;
use crate::reshape::reshape_with;
use crate::source::query::{FieldFilter, RecordQuery};
use crate::source::RecordSource;
use crate::types::geo::{Geofence, LatLon};
use crate::types::observation::Observation;
use crate::types::series::{BucketKey, Series};
use crate::types::units::{round_to, Conversion, DAYS_PER_MONTH};
use futures_util::future::join;
use log::warn;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;

pub const WELL_COLLECTION: &str = "petroleum.doggr";

/// Monthly production and injection fields of a well, in plotting order.
pub const PRODUCTION_FIELDS: [&str; 12] = [
    "oil", "water", "gas", "steam", "cyclic", "water_i", "gas_i", "oilgrav", "pcsg", "ptbg", "btu",
    "pinjsurf",
];

/// Fields that are rates or properties rather than monthly volumes, and so are
/// not converted to daily averages.
const NOT_VOLUMES: [&str; 5] = ["oilgrav", "pcsg", "ptbg", "btu", "pinjsurf"];

/// Center of the field overview map, the San Joaquin basin.
const FIELD_MAP_CENTER: LatLon = LatLon(36.0, -119.0);

/// A well's header document and its production chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WellReport {
    pub header: Observation,
    pub production: Chart,
}

/// A neighbouring well and its distance from the subject well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offset {
    pub api: String,
    pub distance_km: f64,
}

/// Heatmaps and confidence bands of the wells around a subject well.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OffsetFigures {
    pub oil: Chart,
    pub steam: Chart,
    pub water: Chart,
    pub oil_ci: Chart,
    pub steam_ci: Chart,
    pub water_ci: Chart,
    /// Closest first, the subject well included.
    pub offsets: Vec<Offset>,
}

/// Well page: the well itself and its offsets, fetched concurrently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WellPage {
    pub well: WellReport,
    pub offsets: OffsetFigures,
    pub cyclic_jobs: Chart,
}

/// Cumulative volumes of one well, a row of the field table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellSummary {
    pub field: String,
    pub lease: String,
    pub well: String,
    pub operator: String,
    pub api: String,
    pub oil_cum: i64,
    pub water_cum: i64,
    pub gas_cum: i64,
    pub wtrstm_cum: i64,
}

/// The field overview map and the table behind it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMap {
    pub map: Chart,
    pub wells: Vec<WellSummary>,
}

/// Panels over the well database. Obtained via [`Dashboard::oilgas()`].
pub struct OilGasPanels<'a, S: RecordSource> {
    dashboard: &'a Dashboard<S>,
}

impl<'a, S: RecordSource> OilGasPanels<'a, S> {
    pub(crate) fn new(dashboard: &'a Dashboard<S>) -> Self {
        Self { dashboard }
    }

    async fn header(&self, api: &str) -> Result<Observation, DashboardError> {
        let query = RecordQuery::new(WELL_COLLECTION).filter("api", FieldFilter::Eq(api.into()));
        self.dashboard.fetch_one(query, "api", api).await
    }

    /// The well's header and its production/injection history as daily rates.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] if no well has this API number.
    pub async fn well(&self, api: &str) -> Result<WellReport, DashboardError> {
        let header = self.header(api).await?;
        let production = production_chart(&header, self.dashboard.config());
        Ok(WellReport { header, production })
    }

    /// Incremental oil of each cyclic steam job of the well.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] if no well has this API number.
    pub async fn cyclic_jobs(&self, api: &str) -> Result<Chart, DashboardError> {
        let header = self.header(api).await?;
        Ok(cyclic_jobs_chart(&header, self.dashboard.config()))
    }

    /// Wells within `radius_km` of the well: production heatmaps ordered by
    /// distance and interquartile bands across the group.
    ///
    /// Candidates are read from a `radius_km / 100` degree box around the well and
    /// then filtered by great-circle distance.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] if no well has this API number.
    pub async fn offsets(
        &self,
        api: &str,
        radius_km: f64,
    ) -> Result<OffsetFigures, DashboardError> {
        let header = self.header(api).await?;
        let Some(center) = LatLon::from_observation(&header, "latitude", "longitude") else {
            warn!("Well {api} has no location, skipping offsets");
            return Ok(OffsetFigures::default());
        };
        let degrees = radius_km / 100.0;
        let query = RecordQuery::new(WELL_COLLECTION)
            .filter("latitude", FieldFilter::Gt((center.lat() - degrees).into()))
            .filter("latitude", FieldFilter::Lt((center.lat() + degrees).into()))
            .filter("longitude", FieldFilter::Gt((center.lon() - degrees).into()))
            .filter("longitude", FieldFilter::Lt((center.lon() + degrees).into()));
        let candidates = self.dashboard.fetch_or_empty(&query).await;
        let neighbours =
            Geofence::km(center, radius_km).select(&candidates, "latitude", "longitude");
        Ok(offset_figures(api, &neighbours, self.dashboard.config()))
    }

    /// Everything the well page shows.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] if no well has this API number.
    pub async fn page(&self, api: &str, radius_km: f64) -> Result<WellPage, DashboardError> {
        let (well, offsets) = join(self.well(api), self.offsets(api, radius_km)).await;
        let well = well?;
        let cyclic_jobs = cyclic_jobs_chart(&well.header, self.dashboard.config());
        Ok(WellPage {
            well,
            offsets: offsets?,
            cyclic_jobs,
        })
    }

    /// Map of every well colored by cumulative volumes, with the table behind it.
    pub async fn field_map(&self) -> FieldMap {
        let query = RecordQuery::new(WELL_COLLECTION)
            .exclude("prodinj")
            .exclude("cyclic_jobs");
        let wells = self.dashboard.fetch_or_empty(&query).await;
        field_map(&wells, self.dashboard.config())
    }
}

/// The monthly `prodinj` entries of a well, each tagged with the well's API
/// number. Missing production fields are filled with `0`.
fn production_records(header: &Observation) -> Vec<Observation> {
    let api = header.text("api").unwrap_or_default();
    header
        .documents("prodinj")
        .map(|month| {
            let mut month = month.clone();
            for field in PRODUCTION_FIELDS {
                if month.number(field).is_none() {
                    month.insert(field, 0.0);
                }
            }
            month.insert("api", api);
            month
        })
        .collect()
}

fn field_conversion(field: &str) -> Conversion {
    if NOT_VOLUMES.contains(&field) {
        Conversion::Identity
    } else {
        Conversion::MONTHLY_TO_DAILY
    }
}

fn monthly(records: &[Observation], field: &str) -> Series {
    reshape_with(records)
        .group_key("date")
        .value_key(field)
        .aggregator(Aggregator::Last)
        .conversion(field_conversion(field))
        .call()
}

fn production_chart(header: &Observation, config: &DashboardConfig) -> Chart {
    let records = production_records(header);
    let layout = Layout {
        hovermode: Some("closest".to_string()),
        showlegend: Some(true),
        yaxis: Some(Axis::default().log()),
        ..base_layout(config)
    }
    .horizontal_legend()
    .set("uirevision", true);

    PRODUCTION_FIELDS
        .iter()
        .fold(Chart::new(layout), |chart, field| {
            let color = config.series_color(field).unwrap_or("#8c8c8c");
            let trace = Scatter::from_series(&monthly(&records, field));
            chart.with_trace(trace.lines(spline(config, color)))
        })
}

/// Monthly oil of a job indexed by months from the job start, converted to
/// daily rates.
fn job_oil(job: &Observation) -> Vec<(i64, f64)> {
    let Some(oil) = job.document("prod.oil") else {
        return Vec::new();
    };
    let mut points: Vec<(i64, f64)> = oil
        .iter()
        .filter_map(|(month, value)| {
            Some((month.parse().ok()?, value.as_f64()? / DAYS_PER_MONTH))
        })
        .collect();
    points.sort_by_key(|(month, _)| *month);
    points
}

fn cyclic_jobs_chart(header: &Observation, config: &DashboardConfig) -> Chart {
    let mut jobs: Vec<&Observation> = header.documents("cyclic_jobs").collect();
    jobs.sort_by(|a, b| {
        let number = |job: &Observation| job.number("number").unwrap_or(0.0);
        number(a).total_cmp(&number(b))
    });
    let colors = ramp(&MONTH_RAMP, jobs.len());

    let layout = Layout {
        font: base_layout(config).font,
        margin: Some(Margin::new(0.0, 0.0, 0.0, 0.0)),
        xaxis: Some(Axis::titled("Month").set("anchor", "y")),
        yaxis: Some(Axis::titled("Incremental Oil (bbls)").domain(0.575, 1.0).set("anchor", "x")),
        yaxis2: Some(Axis::titled("Incremental Oil (bbls)").domain(0.0, 0.425).set("anchor", "x2")),
        ..Layout::default()
    }
    .set(
        "xaxis2",
        json!({ "title": "Cyclic Volume (bbls)", "anchor": "y2" }),
    );

    let mut chart = Chart::new(layout);
    for (job, color) in jobs.into_iter().zip(&colors) {
        let oil = job_oil(job);
        let at = |month: i64| oil.iter().find(|(m, _)| *m == month).map(|(_, v)| *v);
        let Some(baseline) = at(0) else {
            continue;
        };
        let name: String = job.text("start").unwrap_or_default().chars().take(10).collect();
        let group = job.number("number").map(|n| n.to_string()).unwrap_or_default();

        chart.push(
            Scatter {
                name: name.clone(),
                x: oil.iter().map(|(m, _)| BucketKey::number(*m as f64)).collect(),
                y: oil.iter().map(|(_, v)| v - baseline).collect(),
                legendgroup: Some(group.clone()),
                ..Scatter::default()
            }
            .lines(spline(config, color)),
        );

        if let (Some(total), Some(after), Some(before)) = (job.number("total"), at(1), at(-1)) {
            chart.push(
                Scatter {
                    name,
                    x: vec![BucketKey::number(total)],
                    y: vec![after - before],
                    showlegend: Some(false),
                    legendgroup: Some(group),
                    ..Scatter::default()
                }
                .markers(Marker::solid(10.0, color.as_str()))
                .on_xaxis("x2")
                .on_yaxis("y2"),
            );
        }
    }
    chart
}

/// Heatmap row label, e.g. `"0.412 km - 0402912345"`.
fn distance_label(distance_km: f64, api: &str) -> String {
    format!("{} km - {}", round_to(distance_km, 3), api)
}

fn offset_figures(
    api: &str,
    neighbours: &[(f64, &Observation)],
    config: &DashboardConfig,
) -> OffsetFigures {
    let offsets: Vec<Offset> = neighbours
        .iter()
        .map(|(distance, well)| Offset {
            api: well.text("api").unwrap_or_default().to_string(),
            distance_km: *distance,
        })
        .collect();
    let production: Vec<Vec<Observation>> = neighbours
        .iter()
        .map(|(_, well)| production_records(well))
        .collect();
    let all: Vec<Observation> = production.iter().flatten().cloned().collect();

    let heatmap_layout = Layout {
        margin: Some(Margin::new(150.0, 10.0, 10.0, 30.0)),
        yaxis: Some(Axis::default().reversed()),
        showlegend: Some(false),
        ..base_layout(config)
    };
    let heatmap = |field: &str, colorscale: Colorscale| {
        let rows: Vec<Series> = production.iter().map(|records| monthly(records, field)).collect();
        let dates: BTreeSet<BucketKey> = rows.iter().flat_map(|s| s.xs()).collect();
        let dates: Vec<BucketKey> = dates.into_iter().collect();
        let trace = Heatmap {
            x: dates.clone(),
            y: offsets
                .iter()
                .map(|o| distance_label(o.distance_km, &o.api))
                .collect(),
            z: rows
                .iter()
                .map(|series| dates.iter().map(|d| series.get(d)).collect())
                .collect(),
            colorscale: Some(colorscale),
            ..Heatmap::default()
        };
        Chart::new(heatmap_layout.clone()).with_trace(trace)
    };

    let band_layout = Layout {
        showlegend: Some(true),
        yaxis: Some(Axis::default().log()),
        ..base_layout(config)
    }
    .horizontal_legend();
    let band = |field: &str, colorscale: Colorscale| {
        let band = offset_band(&all, "date", "api", field, api);
        let color = |n| colorscale.color(n).unwrap_or("#8c8c8c");
        Chart::new(band_layout.clone())
            .with_trace(Scatter::from_series(&band.upper).lines(spline(config, color(0))))
            .with_trace(
                Scatter::from_series(&band.lower)
                    .lines(spline(config, color(0)))
                    .fill("tonexty"),
            )
            .with_trace(Scatter::from_series(&band.count).lines(spline(config, "#8c8c8c")))
            .with_trace(Scatter::from_series(&band.sum).lines(spline(config, color(1))))
            .with_trace(Scatter::from_series(&band.current).lines(spline(config, color(2))))
    };

    OffsetFigures {
        oil: heatmap("oil", palette::oil()),
        steam: heatmap("steam", palette::steam()),
        water: heatmap("water", palette::water()),
        oil_ci: band("oil", palette::oil()),
        steam_ci: band("steam", palette::steam()),
        water_ci: band("water", palette::water()),
        offsets,
    }
}

/// Wells with a positive cumulative `field` as a map trace colored between the
/// 1st and 75th percentile.
fn volume_trace(
    wells: &[(LatLon, WellSummary)],
    name: &str,
    volume: fn(&WellSummary) -> i64,
    size: f64,
    colorscale: Colorscale,
    visible: serde_json::Value,
) -> ScatterMapbox {
    let mut trace = ScatterMapbox::markers(name);
    let mut values = Vec::new();
    for (at, summary) in wells {
        let v = volume(summary);
        if v > 0 {
            trace.push(at.lat(), at.lon(), Some(v.to_string()));
            values.push(v as f64);
        }
    }
    let marker = Marker {
        size: Some(size),
        cmin: quantile(&values, 0.01),
        cmax: quantile(&values, 0.75),
        color: Some(ColorSpec::PerPoint(values)),
        colorscale: Some(colorscale),
        colorbar: Some(ColorBar {
            title: name.to_string(),
        }),
        ..Marker::default()
    };
    ScatterMapbox {
        visible: Some(visible),
        ..trace.with_marker(marker)
    }
}

fn field_map(records: &[Observation], config: &DashboardConfig) -> FieldMap {
    let text = |r: &Observation, key: &str| r.text(key).unwrap_or_default().to_string();
    let cum = |r: &Observation, key: &str| r.number(key).map(|v| v as i64).unwrap_or(0);
    let wells: Vec<(LatLon, WellSummary)> = records
        .iter()
        .filter_map(|r| {
            let at = LatLon::from_observation(r, "latitude", "longitude")?;
            Some((
                at,
                WellSummary {
                    field: text(r, "field"),
                    lease: text(r, "lease"),
                    well: text(r, "well"),
                    operator: text(r, "operator"),
                    api: text(r, "api"),
                    oil_cum: cum(r, "oil_cum"),
                    water_cum: cum(r, "water_cum"),
                    gas_cum: cum(r, "gas_cum"),
                    wtrstm_cum: cum(r, "wtrstm_cum"),
                },
            ))
        })
        .collect();

    let mut all_wells = ScatterMapbox::markers("wells").with_marker(Marker::solid(4.0, "black"));
    for (at, summary) in &wells {
        all_wells.push(at.lat(), at.lon(), Some(summary.api.clone()));
    }
    all_wells.visible = Some(json!(true));

    let layout = Layout {
        showlegend: Some(true),
        ..map_layout(config, FIELD_MAP_CENTER, 5.0)
    }
    .horizontal_legend();
    let map = Chart::new(layout)
        .with_trace(volume_trace(
            &wells,
            "water",
            |w| w.water_cum,
            13.0,
            palette::water(),
            json!("legendonly"),
        ))
        .with_trace(volume_trace(&wells, "oil", |w| w.oil_cum, 10.0, palette::oil(), json!(true)))
        .with_trace(volume_trace(
            &wells,
            "steam",
            |w| w.wtrstm_cum,
            7.0,
            palette::steam(),
            json!("legendonly"),
        ))
        .with_trace(volume_trace(
            &wells,
            "gas",
            |w| w.gas_cum,
            7.0,
            palette::gas(),
            json!("legendonly"),
        ))
        .with_trace(all_wells);

    FieldMap {
        map,
        wells: wells.into_iter().map(|(_, summary)| summary).collect(),
    }
}
