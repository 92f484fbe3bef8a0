//! Personal weather station figures and the aviation weather (AWC) map.

use crate::chart::layout::{Axis, Font, Layout, Margin, Polar, Scene};
use crate::chart::trace::{
    BarPolar, ColorBar, ColorSpec, Colorscale, Line, Marker, Scatter, ScatterMapbox, Surface,
};
use crate::chart::Chart;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::DashboardError;
use crate::frame::surface::mean_surface;
use crate::panels::{base_layout, map_layout, palette, percentile_range, resolve_window, spline};
use crate::reshape::aggregate::Aggregator;
use crate::reshape::deltas::accumulate_counter;
use crate::reshape::derived::{with_cloud_base, with_derived_field};
use crate::reshape::wind_rose::{wind_rose, WIND_SPEED_CATEGORIES};
use crate::reshape::{reshape_with, ValueBounds};
use crate::source::query::{FieldFilter, RecordQuery, SortOrder};
use crate::source::RecordSource;
use crate::types::geo::LatLon;
use crate::types::observation::Observation;
use crate::types::series::Series;
use crate::types::units::Conversion;
use bon::bon;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

pub const WX_COLLECTION: &str = "wx.raw";
pub const AWC_COLLECTION: &str = "wx.awc";

const OBSERVED_AT: &str = "observation_time_rfc822";

/// Wind rose bar colors, calm first.
const WIND_ROSE_COLORS: [&str; 6] = [
    "#3366ff", "#009999", "#00cc00", "#bfff00", "#ffcc00", "#ffff00",
];

/// The figures of the station page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherFigures {
    /// Temperature, heat index, windchill and dew point.
    pub td: Chart,
    /// Pressure and humidity.
    pub pr: Chart,
    /// Precipitation rate and accumulation.
    pub pc: Chart,
    /// Estimated cloud base.
    pub cb: Chart,
    /// Wind direction, speed and gust.
    pub wd: Chart,
    /// Solar radiation and UV.
    pub su: Chart,
    /// Wind rose.
    pub wr: Chart,
    /// Temperature / dew point / humidity surface.
    pub thp: Chart,
}

/// Panels over station observations (`wx.raw`) and METAR reports (`wx.awc`).
/// Obtained via [`Dashboard::weather()`].
pub struct WeatherPanels<'a, S: RecordSource> {
    dashboard: &'a Dashboard<S>,
}

#[bon]
impl<'a, S: RecordSource> WeatherPanels<'a, S> {
    pub(crate) fn new(dashboard: &'a Dashboard<S>) -> Self {
        Self { dashboard }
    }

    /// All station figures over the window.
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `station` - The station id, e.g. `"KTXHOUST1941"`.
    ///
    /// # Builder Methods
    ///
    /// * `.time(&str)` (required): window token.
    /// * `.now(DateTime<Utc>)`: end of the window, defaults to the current time.
    ///
    /// Raw values below the configured sensor floor are missing, and so is a
    /// negative pressure. An empty window yields figures without points.
    ///
    /// # Errors
    ///
    /// [`DashboardError::TimeWindow`] for an invalid token and
    /// [`DashboardError::Polars`] if the humidity surface cannot be computed.
    #[builder(start_fn = station)]
    #[doc(hidden)]
    pub async fn build_station(
        &self,
        #[builder(start_fn)] station: &str,
        time: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<WeatherFigures, DashboardError> {
        let window = resolve_window(time, now)?;
        let query = RecordQuery::new(WX_COLLECTION)
            .filter("station_id", FieldFilter::Eq(station.into()))
            .within(OBSERVED_AT, &window)
            .sort(OBSERVED_AT, SortOrder::Ascending);
        let records = self.dashboard.fetch_or_empty(&query).await;
        station_figures(&records, self.dashboard.config())
    }

    /// The newest observation of `station`.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] when the station has no observations.
    pub async fn latest(&self, station: &str) -> Result<Observation, DashboardError> {
        let query = RecordQuery::new(WX_COLLECTION)
            .filter("station_id", FieldFilter::Eq(station.into()))
            .sort(OBSERVED_AT, SortOrder::Descending)
            .exclude("_id");
        self.dashboard.fetch_one(query, "station_id", station).await
    }

    /// Map of the latest METAR reports colored by `prop`.
    ///
    /// # Arguments (Initial Builder Method)
    ///
    /// * `prop` - The report field to show. `flight_category` and `sky_cover_0`
    ///   draw one trace per category. `temp_dewpoint_spread` and `age` (minutes
    ///   since the observation) are derived. Anything else is a numeric field
    ///   mapped onto a colorscale.
    ///
    /// # Builder Methods
    ///
    /// * `.lat(f64)`, `.lon(f64)`: map center, defaults to the continental US.
    /// * `.zoom(f64)`: defaults to `3`.
    /// * `.now(DateTime<Utc>)`: reference time of `age`.
    #[builder(start_fn = awc_map)]
    #[doc(hidden)]
    pub async fn build_awc_map(
        &self,
        #[builder(start_fn)] prop: &str,
        lat: Option<f64>,
        lon: Option<f64>,
        zoom: Option<f64>,
        now: Option<DateTime<Utc>>,
    ) -> Result<Chart, DashboardError> {
        let records = self
            .dashboard
            .fetch_or_empty(&RecordQuery::new(AWC_COLLECTION))
            .await;
        let center = LatLon(lat.unwrap_or(38.0), lon.unwrap_or(-96.0));
        Ok(awc_chart(
            &records,
            prop,
            now.unwrap_or_else(Utc::now),
            map_layout(self.dashboard.config(), center, zoom.unwrap_or(3.0)),
        ))
    }
}

/// Last reading of `key` per observation time.
fn timeline(
    records: &[Observation],
    key: &str,
    bounds: ValueBounds,
    conversion: Conversion,
) -> Series {
    reshape_with(records)
        .group_key(OBSERVED_AT)
        .value_key(key)
        .aggregator(Aggregator::Last)
        .bounds(bounds)
        .conversion(conversion)
        .call()
}

fn line(series: Series, name: &str, color: &str, config: &DashboardConfig) -> Scatter {
    Scatter::from_series(&series.with_name(name)).lines(spline(config, color))
}

fn observed_span(records: &[Observation]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let times = records.iter().filter_map(|r| r.timestamp(OBSERVED_AT));
    let (min, max) = times.fold(None, |span, t| match span {
        None => Some((t, t)),
        Some((lo, hi)) => Some((t.min(lo), t.max(hi))),
    })?;
    Some((min, max))
}

/// Two y axes sharing the observation time axis.
fn dual_axis_layout(
    config: &DashboardConfig,
    span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    yaxis: Axis,
    yaxis2: Option<Axis>,
) -> Layout {
    let mut xaxis = Axis::default().date();
    if let Some((start, end)) = span {
        xaxis = xaxis.range(start, end);
    }
    Layout {
        showlegend: Some(false),
        hovermode: Some("closest".to_string()),
        xaxis: Some(xaxis),
        yaxis: Some(yaxis.domain(0.02, 0.98).fixed()),
        yaxis2: yaxis2.map(|axis| axis.overlay("y", "right").fixed()),
        ..base_layout(config)
    }
}

fn range_of(series: &[&Series]) -> Option<(f64, f64)> {
    let min = series.iter().filter_map(|s| s.min_y()).reduce(f64::min)?;
    let max = series.iter().filter_map(|s| s.max_y()).reduce(f64::max)?;
    Some((min, max))
}

fn station_figures(
    records: &[Observation],
    config: &DashboardConfig,
) -> Result<WeatherFigures, DashboardError> {
    let valid = ValueBounds::at_least(config.sensor_floor);
    let same = Conversion::Identity;
    let span = observed_span(records);

    let temp = timeline(records, "temp_f", valid, same);
    let dew = timeline(records, "dewpoint_f", valid, same);
    let mut td_y = Axis::titled("Temperature (F)");
    let mut td_y2 = Axis::titled("Dewpoint (F)");
    if let Some((min, max)) = range_of(&[&temp, &dew]) {
        td_y = td_y.range(min - 1.0, max + 1.0);
        td_y2 = td_y2.range(min - 1.0, max + 1.0);
    }
    let td = Chart::new(dual_axis_layout(config, span, td_y, Some(td_y2)))
        .with_trace(line(temp, "Temperature (F)", "rgb(255, 95, 63)", config))
        .with_trace(line(
            timeline(records, "heat_index_f", valid, same),
            "Heat Index (F)",
            "#F42ED0",
            config,
        ))
        .with_trace(line(
            timeline(records, "windchill_f", valid, same),
            "Windchill (F)",
            "#2EE8F4",
            config,
        ))
        .with_trace(line(dew, "Dewpoint (F)", "rgb(63, 127, 255)", config).on_yaxis("y2"));

    let pr = Chart::new(dual_axis_layout(
        config,
        span,
        Axis::titled("Pressure (inHg)"),
        Some(Axis::titled("Humidity (%)")),
    ))
    .with_trace(line(
        timeline(records, "pressure_in", ValueBounds::at_least(0.0), same),
        "Pressure (inHg)",
        "rgb(255, 127, 63)",
        config,
    ))
    .with_trace(
        line(
            timeline(records, "relative_humidity", valid, same),
            "Humidity (%)",
            "rgb(127, 255, 63)",
            config,
        )
        .on_yaxis("y2"),
    );

    let precip_today = timeline(records, "precip_today_in", valid, same);
    let pc = Chart::new(dual_axis_layout(
        config,
        span,
        Axis::titled("Precip (in/hr)"),
        Some(Axis::titled("Precip Cumulative (in)")),
    ))
    .with_trace(line(
        timeline(records, "precip_1hr_in", valid, same),
        "Precip (in/hr)",
        "rgb(31, 190, 255)",
        config,
    ))
    .with_trace(
        line(
            accumulate_counter(&precip_today),
            "Precip Cumulative (in)",
            "rgb(63, 255, 255)",
            config,
        )
        .on_yaxis("y2"),
    );

    let with_base = with_cloud_base(records, config.sensor_floor);
    let cb = Chart::new(dual_axis_layout(
        config,
        span,
        Axis::titled("Minimum Cloudbase (ft)"),
        None,
    ))
    .with_trace(line(
        timeline(&with_base, "cloudbase", ValueBounds::UNBOUNDED, same),
        "Minimum Cloudbase (ft)",
        "rgb(90, 66, 245)",
        config,
    ));

    let wd = wind_figure(records, config, span);

    let su = Chart::new(dual_axis_layout(
        config,
        span,
        Axis::titled("Solar Radiation (W/m<sup>2</sup>)"),
        Some(Axis::titled("UV")),
    ))
    .with_trace(line(
        timeline(records, "solar_radiation", valid, same),
        "Solar Radiation (W/m<sup>2</sup>)",
        "rgb(255, 63, 127)",
        config,
    ))
    .with_trace(
        line(timeline(records, "UV", valid, same), "UV", "rgb(255, 190, 63)", config)
            .on_yaxis("y2"),
    );

    let wr = wind_rose_figure(records, config);
    let thp = humidity_surface(records, config)?;

    Ok(WeatherFigures {
        td,
        pr,
        pc,
        cb,
        wd,
        su,
        wr,
        thp,
    })
}

fn wind_figure(
    records: &[Observation],
    config: &DashboardConfig,
    span: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Chart {
    let valid = ValueBounds::at_least(config.sensor_floor);
    // A direction reported with no wind is meaningless.
    let moving: Vec<Observation> = records
        .iter()
        .filter(|r| r.number("wind_mph") != Some(0.0))
        .cloned()
        .collect();
    let direction = timeline(&moving, "wind_degrees", valid, Conversion::Identity);
    let gust = timeline(records, "wind_gust_mph", valid, Conversion::MPH_TO_KNOTS);
    let speed = timeline(records, "wind_mph", valid, Conversion::MPH_TO_KNOTS);

    let mut y2 = Axis::titled("Wind Speed / Gust (kts)");
    if let Some(max) = gust.max_y() {
        y2 = y2.range(0.0, max);
    }
    let marker = Marker {
        symbol: Some("x".to_string()),
        ..Marker::solid(8.0, "rgb(190, 63, 255)")
    };
    Chart::new(dual_axis_layout(
        config,
        span,
        Axis::titled("Wind Direction (degrees)").range(0.0, 360.0),
        Some(y2),
    ))
    .with_trace(
        Scatter::from_series(&direction.with_name("Wind Direction (degrees)")).markers(marker),
    )
    .with_trace(line(gust, "Wind Gust (kts)", "rgb(31, 190, 15)", config).on_yaxis("y2"))
    .with_trace(line(speed, "Wind Speed (kts)", "rgb(127, 255, 31)", config).on_yaxis("y2"))
}

fn wind_rose_figure(records: &[Observation], config: &DashboardConfig) -> Chart {
    let valid: Vec<Observation> = records
        .iter()
        .filter(|r| r.number("wind_mph").is_some_and(|v| v >= config.sensor_floor))
        .cloned()
        .collect();
    let rose = wind_rose(&valid, "wind_degrees", "wind_mph");
    let outer = rose.last().and_then(Series::max_y).unwrap_or(0.0);

    let layout = Layout {
        font: Some(Font::family(&config.font_family)),
        polar: Some(Polar {
            radialaxis: Some(
                Axis::default()
                    .range(0.0, outer)
                    .set("showline", false)
                    .set("showticklabels", false)
                    .set("ticks", ""),
            ),
            angularaxis: Some(
                Axis::default()
                    .set("rotation", 90)
                    .set("direction", "clockwise"),
            ),
        }),
        ..Layout::default()
    }
    .set("hoverlabel", json!({ "font": { "family": config.font_family } }));

    let mut chart = Chart::new(layout);
    // Widest band first so the narrower ones draw on top.
    for (index, series) in rose.iter().enumerate().rev() {
        let category = WIND_SPEED_CATEGORIES[index];
        let color = WIND_ROSE_COLORS[index];
        let name = if index == 0 {
            category.to_string()
        } else {
            format!("{category} mph")
        };
        chart.push(BarPolar {
            name,
            width: Some(10.0),
            base: Some(0.0),
            marker: Some(Marker {
                color: Some(color.into()),
                line: Some(Line::default().with_color(color)),
                ..Marker::default()
            }),
            ..BarPolar::from_series(series)
        });
    }
    chart
}

fn humidity_surface(
    records: &[Observation],
    config: &DashboardConfig,
) -> Result<Chart, DashboardError> {
    let keys = ["temp_f", "dewpoint_f", "relative_humidity"];
    let usable: Vec<Observation> = records
        .iter()
        .filter(|r| {
            keys.iter()
                .all(|k| r.number(k).is_some_and(|v| v >= config.sensor_floor))
        })
        .cloned()
        .collect();
    let grid = mean_surface(&usable, keys[0], keys[1], keys[2])?;

    let scene_axis = |title: &str, color: &str| {
        Axis::titled(title)
            .set("tickfont", json!({ "family": config.font_family, "size": 10 }))
            .set("titlefont", json!({ "family": config.font_family, "color": color }))
    };
    let layout = Layout {
        autosize: Some(true),
        margin: Some(Margin::new(10.0, 10.0, 10.0, 10.0)),
        scene: Some(Scene {
            xaxis: Some(scene_axis("Temperature (F)", "rgb(255, 95, 63)").of_type("linear")),
            yaxis: Some(scene_axis("Dewpoint (F)", "rgb(255, 127, 63)").set("tickangle", 1)),
            zaxis: Some(scene_axis("Humidity (%)", "rgb(63, 127, 255)")),
            aspectmode: Some("cube".to_string()),
        }),
        ..Layout::default()
    }
    .set("hoverlabel", json!({ "font": { "family": config.font_family } }));

    Ok(Chart::new(layout).with_trace(Surface {
        colorscale: Some(palette::normal()),
        ..Surface::from(grid)
    }))
}

/// Category values and marker colors of the categorical AWC props, and whether
/// the map shows a legend for them.
fn awc_categories(prop: &str) -> Option<(&'static [(&'static str, &'static str)], bool)> {
    const FLIGHT: [(&str, &str); 4] = [
        ("VFR", "#3fff3f"),
        ("MVFR", "#3f7fff"),
        ("IFR", "#ff3f3f"),
        ("LIFR", "#ff3fff"),
    ];
    const SKY: [(&str, &str); 6] = [
        ("CLR", "#3fbfff"),
        ("FEW", "#7fcfff"),
        ("SCT", "#bfdfff"),
        ("BKN", "#bfbfbf"),
        ("OVC", "#7f7f7f"),
        ("OVX", "#3f3f3f"),
    ];
    match prop {
        "flight_category" => Some((&FLIGHT, false)),
        "sky_cover_0" => Some((&SKY, true)),
        _ => None,
    }
}

/// Fixed colorscale and range of the numeric AWC props that have one.
fn awc_scale(prop: &str) -> Option<(Colorscale, f64, f64)> {
    let scale = match prop {
        "wind_dir_degrees" => (palette::circle(), 0.0, 359.0),
        "visibility_statute_mi" => (palette::red_green(), 0.0, 10.0),
        "cloud_base_ft_agl_0" => (palette::red_green(), 0.0, 2000.0),
        "age" => (palette::green_red(), 0.0, 60.0),
        "temp_dewpoint_spread" => (palette::red_green(), 0.0, 5.0),
        "temp_c_delta" | "dewpoint_c_delta" => (palette::updown(), -3.0, 3.0),
        "altim_in_hg_delta" => (palette::updown(), -0.03, 0.03),
        "wind_speed_kt_delta" | "wind_gust_kt_delta" => (palette::updown(), -5.0, 5.0),
        "cloud_base_ft_agl_0_delta" => (palette::updown(), -1000.0, 1000.0),
        _ => return None,
    };
    Some(scale)
}

fn with_awc_derived(records: &[Observation], prop: &str, now: DateTime<Utc>) -> Vec<Observation> {
    match prop {
        "temp_dewpoint_spread" => with_derived_field(records, prop, |r| {
            Some(r.number("temp_c")? - r.number("dewpoint_c")?)
        }),
        "age" => with_derived_field(records, prop, |r| {
            let observed = r.timestamp("observation_time")?;
            Some((now - observed).num_minutes() as f64)
        }),
        _ => records.to_vec(),
    }
}

fn awc_chart(records: &[Observation], prop: &str, now: DateTime<Utc>, layout: Layout) -> Chart {
    let records: Vec<Observation> = with_awc_derived(records, prop, now)
        .into_iter()
        .filter(|r| r.get(prop).is_some_and(|v| !v.is_null()))
        .collect();
    let located = records.iter().filter_map(|r| {
        LatLon::from_observation(r, "latitude", "longitude").map(|at| (at, r))
    });
    let raw_text = |r: &Observation| Some(r.text("raw_text").unwrap_or_default().to_string());

    if let Some((categories, legend)) = awc_categories(prop) {
        let mut traces: Vec<ScatterMapbox> = categories
            .iter()
            .map(|(name, color)| {
                ScatterMapbox::markers(*name).with_marker(Marker::solid(10.0, *color))
            })
            .collect();
        for (at, record) in located {
            let category = record.text(prop);
            if let Some(i) = categories.iter().position(|(name, _)| Some(*name) == category) {
                traces[i].push(at.lat(), at.lon(), raw_text(record));
            }
        }
        let layout = Layout {
            showlegend: Some(legend),
            ..layout
        };
        return traces
            .into_iter()
            .fold(Chart::new(layout), |chart, trace| chart.with_trace(trace));
    }

    let mut trace = ScatterMapbox::markers(prop);
    let mut values = Vec::new();
    for (at, record) in located {
        if let Some(value) = record.number(prop) {
            trace.push(at.lat(), at.lon(), raw_text(record));
            values.push(value);
        }
    }
    let (colorscale, range) = match awc_scale(prop) {
        Some((scale, cmin, cmax)) => (scale, Some((cmin, cmax))),
        None => (palette::normal(), percentile_range(&values)),
    };
    let marker = Marker {
        size: Some(10.0),
        color: Some(ColorSpec::PerPoint(values)),
        colorscale: Some(colorscale),
        cmin: range.map(|(lo, _)| lo),
        cmax: range.map(|(_, hi)| hi),
        colorbar: Some(ColorBar {
            title: prop.to_string(),
        }),
        ..Marker::default()
    };
    Chart::new(layout).with_trace(trace.with_marker(marker))
}
