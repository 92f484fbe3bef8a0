mod chart;
mod config;
mod dashboard;
mod error;
mod frame;
pub mod panels;
mod reshape;
mod source;
mod types;
mod utils;

pub use dashboard::*;
pub use error::DashboardError;

pub use config::{DashboardConfig, DEFAULT_FONT_FAMILY, DEFAULT_HOME, DEFAULT_MAP_STYLE};

pub use types::geo::*;
pub use types::observation::*;
pub use types::series::*;
pub use types::time_window::*;
pub use types::units::*;

pub use reshape::aggregate::{quantile, Aggregator};
pub use reshape::band::{offset_band, ConfidenceBand};
pub use reshape::deltas::{accumulate_counter, deltas, rate_per};
pub use reshape::derived::{cloud_base_ft, with_cloud_base, with_derived_field};
pub use reshape::grouping::{compass_sector, Grouping, MONTH_LABEL_FORMAT};
pub use reshape::wind_rose::{
    speed_category, wind_rose, WIND_SECTOR_DEGREES, WIND_SPEED_CATEGORIES,
};
pub use reshape::{grid_rows, partition, reshape, reshape_with, BucketOrder, ValueBounds};

pub use frame::surface::{mean_surface, SurfaceGrid, SURFACE_SENTINEL};
pub use frame::{records_to_frame, ColumnKind, ObservationFrameExt};

pub use source::error::SourceError;
pub use source::json_dir::JsonDirSource;
pub use source::memory::InMemorySource;
pub use source::query::{FieldFilter, RecordQuery, SortOrder};
pub use source::RecordSource;

pub use chart::layout::*;
pub use chart::trace::*;
pub use chart::Chart;
