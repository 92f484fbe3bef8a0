//! Photo galleries laid out as thumbnail grids, with maps of where the photos
//! were taken.

use crate::chart::trace::{Marker, ScatterMapbox};
use crate::chart::Chart;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::DashboardError;
use crate::panels::map_layout;
use crate::reshape::grid_rows;
use crate::source::query::{FieldFilter, RecordQuery};
use crate::source::RecordSource;
use crate::types::geo::LatLon;
use crate::types::observation::{FieldValue, Observation};
use log::debug;
use serde::Serialize;

pub const GALLERY_COLLECTION: &str = "flickr.galleries";
pub const PHOTO_COLLECTION: &str = "flickr.photos";

const MARKER_COLOR: &str = "#2EF4F1";
const GALLERY_ZOOM: f64 = 4.0;
const PHOTO_ZOOM: f64 = 13.0;

/// One gallery thumbnail of the overview grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryFrame {
    /// `"<title> - <photo count>"`.
    pub caption: String,
    pub thumb: String,
    pub link: String,
}

/// One photo thumbnail of a gallery grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoFrame {
    pub thumb: String,
    pub link: String,
}

/// A gallery's photo grid, the map of its photos and its header counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryPage {
    pub rows: Vec<Vec<PhotoFrame>>,
    pub map: Chart,
    pub title: String,
    pub count_photos: i64,
    pub count_views: i64,
}

/// A single photo document and, when it carries a location, a map of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoPage {
    pub photo: Observation,
    pub map: Option<Chart>,
}

/// Panels over the photo collections. Obtained via [`Dashboard::gallery()`].
pub struct GalleryPanels<'a, S: RecordSource> {
    dashboard: &'a Dashboard<S>,
}

impl<'a, S: RecordSource> GalleryPanels<'a, S> {
    pub(crate) fn new(dashboard: &'a Dashboard<S>) -> Self {
        Self { dashboard }
    }

    /// Every gallery as a thumbnail, `width` to a row. The photo lists are not
    /// fetched.
    pub async fn gallery_rows(&self, width: usize) -> Vec<Vec<GalleryFrame>> {
        let query = RecordQuery::new(GALLERY_COLLECTION).exclude("photos");
        let galleries = self.dashboard.fetch_or_empty(&query).await;
        let frames = galleries
            .iter()
            .map(|gallery| GalleryFrame {
                caption: format!(
                    "{} - {}",
                    gallery.text("title").unwrap_or_default(),
                    count(gallery, "count_photos")
                ),
                thumb: gallery.text("primary").unwrap_or_default().to_string(),
                link: format!("/gallery/{}", gallery.text("id").unwrap_or_default()),
            })
            .collect();
        grid_rows(frames, width)
    }

    /// The photos of gallery `id`, `width` to a row, and a map of the ones with a
    /// location centered on their mean position.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] if there is no gallery with this id.
    pub async fn photo_rows(&self, id: &str, width: usize) -> Result<GalleryPage, DashboardError> {
        let query = RecordQuery::new(GALLERY_COLLECTION).filter("id", FieldFilter::Eq(id.into()));
        let gallery = self.dashboard.fetch_one(query, "id", id).await?;
        Ok(gallery_page(&gallery, width, self.dashboard.config()))
    }

    /// Photo `id` without its storage id, plus a map when it has a location.
    ///
    /// # Errors
    ///
    /// [`DashboardError::NotFound`] if there is no photo with this id.
    pub async fn photo(&self, id: &str) -> Result<PhotoPage, DashboardError> {
        let query = RecordQuery::new(PHOTO_COLLECTION)
            .filter("id", FieldFilter::Eq(id.into()))
            .exclude("_id");
        let photo = self.dashboard.fetch_one(query, "id", id).await?;
        let map = LatLon::from_observation(&photo, "location.latitude", "location.longitude")
            .map(|at| location_map(&[at], at, PHOTO_ZOOM, self.dashboard.config()));
        if map.is_none() {
            debug!("Photo {id} has no location");
        }
        Ok(PhotoPage { photo, map })
    }
}

/// Counters are stored as numbers or numeric text.
fn count(record: &Observation, key: &str) -> i64 {
    record.number(key).map(|n| n as i64).unwrap_or(0)
}

fn location_map(points: &[LatLon], center: LatLon, zoom: f64, config: &DashboardConfig) -> Chart {
    let mut trace = ScatterMapbox::markers("").with_marker(Marker::solid(10.0, MARKER_COLOR));
    for at in points {
        trace.push(at.lat(), at.lon(), None);
    }
    Chart::new(map_layout(config, center, zoom)).with_trace(trace)
}

fn gallery_page(gallery: &Observation, width: usize, config: &DashboardConfig) -> GalleryPage {
    let photos: Vec<(&str, &Observation)> = gallery
        .document("photos")
        .into_iter()
        .flat_map(Observation::iter)
        .filter_map(|(id, photo)| match photo {
            FieldValue::Document(doc) => Some((id, doc)),
            _ => None,
        })
        .collect();

    let frames = photos
        .iter()
        .map(|(id, photo)| PhotoFrame {
            thumb: photo.text("thumb").unwrap_or_default().to_string(),
            link: format!("/photo/{id}"),
        })
        .collect();
    let located: Vec<LatLon> = photos
        .iter()
        .filter_map(|(_, photo)| LatLon::from_observation(photo, "latitude", "longitude"))
        .collect();
    let center = mean_position(&located).unwrap_or(config.home);

    GalleryPage {
        rows: grid_rows(frames, width),
        map: location_map(&located, center, GALLERY_ZOOM, config),
        title: gallery.text("title").unwrap_or_default().to_string(),
        count_photos: count(gallery, "count_photos"),
        count_views: count(gallery, "count_views"),
    }
}

fn mean_position(points: &[LatLon]) -> Option<LatLon> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(LatLon::lat).sum::<f64>() / n;
    let lon = points.iter().map(LatLon::lon).sum::<f64>() / n;
    Some(LatLon(lat, lon))
}
