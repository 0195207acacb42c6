use std::collections::HashMap;

use geojson::{Feature, FeatureCollection};
use tracing::debug;

use crate::{
    map::{
        Cursor, EventKind, LayerSpec, ListenerHandle, MapError, MapOptions, MapSurface, Marker,
        MarkerId, Popup, PopupId, STATION_SOURCE,
    },
    shared::geo::{BoundingBox, Coordinate, Distance, Viewport},
};

/// How far a rendered station feature may sit from a query point and still
/// count as hit. Hit-testing here is geographic; a real GL binding projects
/// to screen space instead.
const HIT_RADIUS: Distance = Distance::meters(50.0);

/// Default viewport half-width in degrees, roughly a zoom-14 screen.
const VIEW_HALF_WIDTH_DEG: f64 = 0.01;

/// In-memory map surface.
///
/// Holds the exact state a rendering engine would: sources, layers, markers,
/// popups, cursor, viewport, attached listeners. Tests and the CLI run the
/// whole session against it; it is also the reference for real GL bindings.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    initialized: bool,
    sources: HashMap<String, FeatureCollection>,
    layers: Vec<LayerSpec>,
    markers: HashMap<u64, Marker>,
    popups: HashMap<u64, Popup>,
    listeners: Vec<(ListenerHandle, EventKind)>,
    cursor: Cursor,
    viewport: Viewport,
    next_id: u64,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Default::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Pans/zooms the fake camera; tests drive viewport changes with this
    /// before dispatching a move-end event.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn pan_to(&mut self, center: Coordinate) {
        self.viewport = Viewport {
            center,
            bounds: BoundingBox::around(&center, VIEW_HALF_WIDTH_DEG),
        };
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn markers(&self) -> Vec<&Marker> {
        self.markers.values().collect()
    }

    pub fn popups(&self) -> Vec<&Popup> {
        self.popups.values().collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn ensure_initialized(&self) -> Result<(), MapError> {
        if self.initialized {
            Ok(())
        } else {
            Err(MapError::NotInitialized)
        }
    }
}

impl MapSurface for HeadlessMap {
    fn init(&mut self, options: MapOptions) -> Result<(), MapError> {
        // Re-init without a teardown would leak listeners on a real engine;
        // mirror that contract by detaching first.
        self.detach_all();
        self.sources.clear();
        self.layers.clear();
        self.markers.clear();
        self.popups.clear();
        self.cursor = Cursor::Default;
        self.viewport = Viewport {
            center: options.center,
            bounds: BoundingBox::around(&options.center, VIEW_HALF_WIDTH_DEG),
        };
        self.initialized = true;

        if let Some((id, data)) = options.source {
            self.sources.insert(id, data);
        }
        if let Some(layer) = options.layer {
            self.add_layer(layer)?;
        }
        debug!("Headless map initialized at {}", options.center);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn set_source_data(&mut self, source: &str, data: FeatureCollection) -> Result<(), MapError> {
        self.ensure_initialized()?;
        self.sources.insert(source.to_string(), data);
        Ok(())
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), MapError> {
        self.ensure_initialized()?;
        if !self.sources.contains_key(&spec.source) {
            return Err(MapError::UnknownSource(spec.source));
        }
        if let Some(existing) = self.layers.iter_mut().find(|layer| layer.id == spec.id) {
            *existing = spec;
        } else {
            self.layers.push(spec);
        }
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        self.ensure_initialized()?;
        let before = self.layers.len();
        self.layers.retain(|layer| layer.id != id);
        if self.layers.len() == before {
            return Err(MapError::UnknownLayer(id.to_string()));
        }
        Ok(())
    }

    fn add_marker(&mut self, marker: Marker) -> Result<MarkerId, MapError> {
        self.ensure_initialized()?;
        let id = self.next_id();
        self.markers.insert(id, marker);
        Ok(MarkerId(id))
    }

    fn remove_marker(&mut self, id: MarkerId) -> Result<(), MapError> {
        self.markers
            .remove(&id.0)
            .map(|_| ())
            .ok_or(MapError::UnknownMarker(id))
    }

    fn show_popup(&mut self, popup: Popup) -> Result<PopupId, MapError> {
        self.ensure_initialized()?;
        let id = self.next_id();
        self.popups.insert(id, popup);
        Ok(PopupId(id))
    }

    fn move_popup(
        &mut self,
        id: PopupId,
        coordinate: Coordinate,
        html: String,
    ) -> Result<(), MapError> {
        let popup = self.popups.get_mut(&id.0).ok_or(MapError::UnknownPopup(id))?;
        popup.coordinate = coordinate;
        popup.html = html;
        Ok(())
    }

    fn remove_popup(&mut self, id: PopupId) -> Result<(), MapError> {
        self.popups
            .remove(&id.0)
            .map(|_| ())
            .ok_or(MapError::UnknownPopup(id))
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn viewport(&self) -> Result<Viewport, MapError> {
        self.ensure_initialized()?;
        Ok(self.viewport)
    }

    fn stations_at(&self, at: &Coordinate) -> Vec<Feature> {
        let Some(collection) = self.sources.get(STATION_SOURCE) else {
            return Vec::new();
        };
        collection
            .features
            .iter()
            .filter(|feature| {
                feature
                    .geometry
                    .as_ref()
                    .and_then(|geometry| match &geometry.value {
                        geojson::Value::Point(position) => Coordinate::from_position(position),
                        _ => None,
                    })
                    .is_some_and(|coord| coord.distance_to(at) <= HIT_RADIUS)
            })
            .cloned()
            .collect()
    }

    fn attach(&mut self, kind: EventKind) -> ListenerHandle {
        let handle = ListenerHandle(self.next_id());
        self.listeners.push((handle, kind));
        handle
    }

    fn detach_all(&mut self) {
        if !self.listeners.is_empty() {
            debug!("Detaching {} listeners", self.listeners.len());
        }
        self.listeners.clear();
    }

    fn remove(&mut self) {
        self.detach_all();
        self.sources.clear();
        self.layers.clear();
        self.markers.clear();
        self.popups.clear();
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{Station, to_feature_collection};

    fn init_map() -> HeadlessMap {
        let mut map = HeadlessMap::new();
        map.init(MapOptions {
            center: Coordinate::new(121.56, 25.04),
            ..Default::default()
        })
        .unwrap();
        map
    }

    #[test]
    fn uninitialized_map_has_no_viewport_test() {
        let map = HeadlessMap::new();
        assert!(map.viewport().is_err());
    }

    #[test]
    fn layer_requires_source_test() {
        let mut map = init_map();
        let spec = LayerSpec {
            id: "orphan".into(),
            source: "missing".into(),
            paint: crate::map::LayerPaint::Circle {
                radius: 7.0,
                color: "#ffef02".into(),
            },
        };
        assert!(matches!(
            map.add_layer(spec),
            Err(MapError::UnknownSource(_))
        ));
    }

    #[test]
    fn hit_testing_test() {
        let mut map = init_map();
        let station = Station {
            name: "City Hall".into(),
            bikes_available: 1,
            docks_available: 1,
            capacity: 2,
            coordinate: Coordinate::new(121.56, 25.04),
        };
        map.set_source_data(STATION_SOURCE, to_feature_collection(&[station]))
            .unwrap();

        assert_eq!(map.stations_at(&Coordinate::new(121.56, 25.04)).len(), 1);
        // ~1.1 km east of the station.
        assert!(map.stations_at(&Coordinate::new(121.57, 25.04)).is_empty());
    }

    #[test]
    fn detach_all_empties_registry_test() {
        let mut map = init_map();
        map.attach(EventKind::Load);
        map.attach(EventKind::Click);
        assert_eq!(map.listener_count(), 2);
        map.detach_all();
        assert_eq!(map.listener_count(), 0);
    }
}
