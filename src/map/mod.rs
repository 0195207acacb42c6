use geojson::{Feature, FeatureCollection};
use thiserror::Error;

mod headless;
pub use headless::*;

use crate::shared::geo::{Coordinate, Viewport};

/// Source and layer identifiers shared between the session controller and
/// every map surface. Both sides address them by these exact strings.
pub const STATION_SOURCE: &str = "stations";
pub const STATION_LAYER: &str = "stations-layer";
pub const ROUTE_SOURCE: &str = "route";
pub const ROUTE_LAYER: &str = "route-line";

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Map is not initialized")]
    NotInitialized,
    #[error("Unknown source: {0}")]
    UnknownSource(String),
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),
    #[error("Unknown marker: {0:?}")]
    UnknownMarker(MarkerId),
    #[error("Unknown popup: {0:?}")]
    UnknownPopup(PopupId),
}

/// Platform events a surface can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Load,
    MoveEnd,
    PointerMove,
    Click,
}

/// Handle to one attached listener, kept so teardown can detach listeners
/// individually instead of leaning on instance destruction to drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupId(pub u64);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub color: String,
    pub label: Option<String>,
}

impl Marker {
    pub fn new(coordinate: Coordinate, color: impl Into<String>) -> Self {
        Self {
            coordinate,
            color: color.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub coordinate: Coordinate,
    pub html: String,
    pub offset: i32,
    pub class: String,
}

impl Popup {
    pub fn new(coordinate: Coordinate, html: impl Into<String>) -> Self {
        Self {
            coordinate,
            html: html.into(),
            offset: 0,
            class: "default-popup".into(),
        }
    }

    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }
}

/// Paint for the two layer shapes the planner draws.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerPaint {
    Circle { radius: f64, color: String },
    /// Round join and cap.
    Line { width: f64, color: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub paint: LayerPaint,
}

/// Base style of the underlying map: one raster tile source.
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub tile_url: String,
    pub attribution: String,
    pub glyphs: String,
    pub zoom: f64,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            tile_url: "https://a.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "© OpenStreetMap contributors".into(),
            glyphs: "https://demotiles.maplibre.org/font/{fontstack}/{range}.pbf".into(),
            zoom: 14.0,
        }
    }
}

/// Everything a surface needs to come up: base style, initial center, and at
/// most one initial source and layer.
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    pub style: MapStyle,
    pub center: Coordinate,
    pub source: Option<(String, FeatureCollection)>,
    pub layer: Option<LayerSpec>,
}

/// Capability object over the rendering engine.
///
/// The engine itself (tiles, WebGL, DOM) stays behind this seam; the session
/// controller composes a surface instead of inheriting map behavior. Sources
/// are upserted by `set_source_data`, so replacing a route means writing the
/// same source id again.
pub trait MapSurface {
    fn init(&mut self, options: MapOptions) -> Result<(), MapError>;
    fn is_initialized(&self) -> bool;

    fn set_source_data(&mut self, source: &str, data: FeatureCollection) -> Result<(), MapError>;
    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), MapError>;
    fn has_layer(&self, id: &str) -> bool;
    fn remove_layer(&mut self, id: &str) -> Result<(), MapError>;

    fn add_marker(&mut self, marker: Marker) -> Result<MarkerId, MapError>;
    fn remove_marker(&mut self, id: MarkerId) -> Result<(), MapError>;
    fn show_popup(&mut self, popup: Popup) -> Result<PopupId, MapError>;
    fn move_popup(
        &mut self,
        id: PopupId,
        coordinate: Coordinate,
        html: String,
    ) -> Result<(), MapError>;
    fn remove_popup(&mut self, id: PopupId) -> Result<(), MapError>;
    fn set_cursor(&mut self, cursor: Cursor);

    fn viewport(&self) -> Result<Viewport, MapError>;
    /// Rendered station features under the given point; the engine's
    /// hit-testing, so the planner never re-implements picking.
    fn stations_at(&self, at: &Coordinate) -> Vec<Feature>;

    fn attach(&mut self, kind: EventKind) -> ListenerHandle;
    fn detach_all(&mut self);

    /// Destroys the underlying instance. Must tolerate repeated calls.
    fn remove(&mut self);
}
