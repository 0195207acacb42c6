use std::sync::Arc;

use geojson::FeatureCollection;
use tracing::{debug, error};

use crate::{
    config::Config,
    map::{
        Cursor, EventKind, LayerPaint, LayerSpec, MapError, MapOptions, MapStyle, MapSurface,
        Marker, MarkerId, Popup, PopupId, ROUTE_LAYER, ROUTE_SOURCE, STATION_LAYER,
        STATION_SOURCE,
    },
    route::{Profile, RouteProvider, empty_route, route_summary},
    shared::geo::Coordinate,
    station::{Station, StationProvider, filter_nearby, nearest_station, to_feature_collection},
};

const START_MARKER_COLOR: &str = "#f87171";
const MID_MARKER_COLOR: &str = "#ffef02";
const END_MARKER_COLOR: &str = "#0ca5e9";
const ROUTE_COLOR: &str = "#3b82f6";
const STATION_CIRCLE_RADIUS: f64 = 7.0;
const ROUTE_LINE_WIDTH: f64 = 6.0;
const MID_POPUP_HTML: &str = r#"<div class="mid-station-glyph">🚲</div>"#;

/// Lifecycle of one map session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Destroyed,
}

/// Why a route is being recomputed: a fresh plan picks the mid-station
/// itself, a selection change reuses the one the user chose.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    #[default]
    Fresh,
    SelectionChanged,
}

/// Platform events the shell forwards into the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    Loaded,
    MoveEnd,
    PointerMove { at: Coordinate },
    Click { at: Coordinate },
}

/// The mid-trip station the session currently has chosen, owned by the
/// controller and published to subscribers on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub coordinate: Coordinate,
    pub name: Arc<str>,
    pub bikes_available: u32,
    pub docks_available: u32,
}

impl From<&Station> for Selection {
    fn from(station: &Station) -> Self {
        Self {
            coordinate: station.coordinate,
            name: station.name.clone(),
            bikes_available: station.bikes_available,
            docks_available: station.docks_available,
        }
    }
}

/// What the route layer is currently showing.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum RouteStatus {
    #[default]
    Pending,
    Rendered { distance_m: f64, duration_s: f64 },
    NoRoute,
}

/// The two trip endpoints, fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct Trip {
    pub start: Coordinate,
    pub end: Coordinate,
    pub destination_label: String,
}

impl Trip {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self {
            start,
            end,
            destination_label: "Destination".into(),
        }
    }

    pub fn with_destination_label(mut self, label: impl Into<String>) -> Self {
        self.destination_label = label.into();
        self
    }
}

/// Monotonic request tokens, one series per operation kind. A response whose
/// token is no longer current is stale and must not touch session state.
#[derive(Debug, Default)]
struct TokenSeries {
    issued: u64,
}

impl TokenSeries {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn is_current(&self, token: u64) -> bool {
        token == self.issued
    }
}

type AlertSink = Box<dyn Fn(&str)>;
type SelectionListener = Box<dyn Fn(&Selection)>;
type RouteStatusListener = Box<dyn Fn(&RouteStatus)>;

/// Orchestrates one trip-planning map session: owns the station inventory,
/// the current selection, the trip markers, and the route layer, and reacts
/// to the events the shell forwards from the platform.
///
/// Composes a [`MapSurface`] plus station and route providers; everything is
/// generic so tests run the full session headless with canned data.
pub struct SessionController<M, S, R> {
    map: M,
    stations: S,
    routes: R,
    config: Config,
    trip: Trip,

    phase: Phase,
    all_stations: Option<Vec<Station>>,
    nearby: Vec<Station>,
    selection: Option<Selection>,
    route_status: RouteStatus,

    start_marker: Option<MarkerId>,
    mid_marker: Option<MarkerId>,
    end_marker: Option<MarkerId>,
    mid_popup: Option<PopupId>,
    hover_popup: Option<PopupId>,

    station_tokens: TokenSeries,
    route_tokens: TokenSeries,

    alert_sink: AlertSink,
    selection_listeners: Vec<SelectionListener>,
    route_listeners: Vec<RouteStatusListener>,
}

impl<M, S, R> SessionController<M, S, R>
where
    M: MapSurface,
    S: StationProvider,
    R: RouteProvider,
{
    pub fn new(map: M, stations: S, routes: R, config: Config, trip: Trip) -> Self {
        Self {
            map,
            stations,
            routes,
            config,
            trip,
            phase: Phase::default(),
            all_stations: None,
            nearby: Vec::new(),
            selection: None,
            route_status: RouteStatus::default(),
            start_marker: None,
            mid_marker: None,
            end_marker: None,
            mid_popup: None,
            hover_popup: None,
            station_tokens: TokenSeries::default(),
            route_tokens: TokenSeries::default(),
            alert_sink: Box::new(|message| error!("{message}")),
            selection_listeners: Vec::new(),
            route_listeners: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn route_status(&self) -> RouteStatus {
        self.route_status
    }

    /// Stations currently in the search pool (within the configured radius
    /// of the viewport center).
    pub fn nearby(&self) -> &[Station] {
        &self.nearby
    }

    pub fn surface(&self) -> &M {
        &self.map
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Replaces the default alert sink (which logs) with one the shell
    /// surfaces to the user. The sink receives the raw error text.
    pub fn on_alert(&mut self, sink: impl Fn(&str) + 'static) {
        self.alert_sink = Box::new(sink);
    }

    pub fn on_selection_change(&mut self, listener: impl Fn(&Selection) + 'static) {
        self.selection_listeners.push(Box::new(listener));
    }

    pub fn on_route_status(&mut self, listener: impl Fn(&RouteStatus) + 'static) {
        self.route_listeners.push(Box::new(listener));
    }

    /// Brings the map up: base style, empty station source, station layer,
    /// and the event subscriptions teardown will detach.
    pub fn load_map(&mut self) -> Result<(), MapError> {
        let options = MapOptions {
            style: MapStyle {
                zoom: self.config.default_zoom,
                ..Default::default()
            },
            center: self.trip.start,
            source: Some((STATION_SOURCE.into(), to_feature_collection(&[]))),
            layer: Some(LayerSpec {
                id: STATION_LAYER.into(),
                source: STATION_SOURCE.into(),
                paint: LayerPaint::Circle {
                    radius: STATION_CIRCLE_RADIUS,
                    color: MID_MARKER_COLOR.into(),
                },
            }),
        };
        self.map.init(options)?;
        // Init wipes the surface, so ids held from a previous lifecycle are
        // gone with it.
        self.start_marker = None;
        self.mid_marker = None;
        self.end_marker = None;
        self.mid_popup = None;
        self.hover_popup = None;
        for kind in [
            EventKind::Load,
            EventKind::MoveEnd,
            EventKind::PointerMove,
            EventKind::Click,
        ] {
            self.map.attach(kind);
        }
        self.phase = Phase::Loading;
        Ok(())
    }

    /// Single entry point for platform events. Events that do not fit the
    /// current phase are dropped.
    pub async fn handle_event(&mut self, event: MapEvent) {
        match (self.phase, event) {
            (Phase::Loading, MapEvent::Loaded) => self.on_loaded().await,
            (Phase::Ready, MapEvent::MoveEnd) => {
                if let Err(err) = self.refresh_visible() {
                    self.raise_alert(&err.to_string());
                }
            }
            (Phase::Ready, MapEvent::PointerMove { at }) => {
                if let Err(err) = self.on_pointer_move(&at) {
                    self.raise_alert(&err.to_string());
                }
            }
            (Phase::Ready, MapEvent::Click { at }) => self.on_click(at).await,
            (phase, event) => debug!("Ignoring {event:?} in phase {phase:?}"),
        }
    }

    /// Tears the session down: markers, popups, listeners, map instance.
    /// Safe to call repeatedly and before the map ever finished loading.
    pub fn destroy(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        for marker in [
            self.start_marker.take(),
            self.mid_marker.take(),
            self.end_marker.take(),
        ]
        .into_iter()
        .flatten()
        {
            let _ = self.map.remove_marker(marker);
        }
        for popup in [self.mid_popup.take(), self.hover_popup.take()]
            .into_iter()
            .flatten()
        {
            let _ = self.map.remove_popup(popup);
        }
        self.map.detach_all();
        self.map.remove();
        self.phase = Phase::Destroyed;
    }

    async fn on_loaded(&mut self) {
        self.phase = Phase::Ready;
        let token = self.station_tokens.issue();
        let fetched = self.stations.fetch_all().await;
        if !self.station_tokens.is_current(token) {
            debug!("Dropping stale station inventory response");
            return;
        }
        self.all_stations = Some(fetched);
        if let Err(err) = self.refresh_visible() {
            self.raise_alert(&err.to_string());
        }
        self.update_route(RouteMode::Fresh).await;
    }

    /// Rebuilds the nearby search pool around the viewport center and pushes
    /// the stations inside the bounds into the station source.
    fn refresh_visible(&mut self) -> Result<(), MapError> {
        let Some(all) = &self.all_stations else {
            return Ok(());
        };
        let viewport = self.map.viewport()?;
        self.nearby = filter_nearby(all, &viewport.center, self.config.nearby_radius);
        let in_bounds: Vec<Station> = self
            .nearby
            .iter()
            .filter(|station| viewport.bounds.contains(&station.coordinate))
            .cloned()
            .collect();
        self.map
            .set_source_data(STATION_SOURCE, to_feature_collection(&in_bounds))
    }

    fn on_pointer_move(&mut self, at: &Coordinate) -> Result<(), MapError> {
        let hits = self.map.stations_at(at);
        self.map.set_cursor(if hits.is_empty() {
            Cursor::Default
        } else {
            Cursor::Pointer
        });

        let Some(station) = hits.first().and_then(Station::from_feature) else {
            if let Some(popup) = self.hover_popup.take() {
                self.map.remove_popup(popup)?;
            }
            return Ok(());
        };

        let html = hover_html(&station);
        match self.hover_popup {
            Some(popup) => self.map.move_popup(popup, station.coordinate, html)?,
            None => {
                let popup = self.map.show_popup(
                    Popup::new(station.coordinate, html)
                        .with_offset(20)
                        .with_class("hover-popup"),
                )?;
                self.hover_popup = Some(popup);
            }
        }
        Ok(())
    }

    async fn on_click(&mut self, at: Coordinate) {
        let hits = self.map.stations_at(&at);
        let Some(station) = hits.first().and_then(Station::from_feature) else {
            self.map.set_cursor(Cursor::Default);
            if let Err(err) = self.refresh_visible() {
                self.raise_alert(&err.to_string());
            }
            return;
        };
        self.set_selection(Selection::from(&station));
        self.update_route(RouteMode::SelectionChanged).await;
    }

    /// Recomputes and re-renders the start → station → end route.
    pub async fn update_route(&mut self, mode: RouteMode) {
        if let Err(err) = self.try_update_route(mode).await {
            self.raise_alert(&err.to_string());
        }
    }

    async fn try_update_route(&mut self, mode: RouteMode) -> Result<(), MapError> {
        let Some(mid) = self.resolve_mid_station(mode) else {
            // Nothing loaded to route through; leave the map as it is.
            return Ok(());
        };
        self.set_selection(Selection::from(&mid));
        self.place_trip_markers(&mid, mode)?;

        let token = self.route_tokens.issue();
        let waypoints = [self.trip.start, mid.coordinate, self.trip.end];
        let route = self.routes.fetch_route(Profile::Cycling, &waypoints).await;
        if !self.route_tokens.is_current(token) {
            debug!("Dropping stale route response");
            return Ok(());
        }
        self.render_route(route)
    }

    /// Picks the mid-trip station. A changed selection is resolved back to a
    /// full inventory record by coordinate match; otherwise (or when the
    /// selection no longer resolves) the nearest station to the trip start
    /// wins, preferring stations with bikes left.
    fn resolve_mid_station(&self, mode: RouteMode) -> Option<Station> {
        if mode == RouteMode::SelectionChanged
            && let (Some(selection), Some(all)) = (&self.selection, &self.all_stations)
            && let Some(station) = all
                .iter()
                .find(|station| station.coordinate == selection.coordinate)
        {
            return Some(station.clone());
        }
        nearest_station(&self.nearby, &self.trip.start).cloned()
    }

    fn place_trip_markers(&mut self, mid: &Station, mode: RouteMode) -> Result<(), MapError> {
        match mode {
            RouteMode::SelectionChanged => {
                if let Some(popup) = self.mid_popup.take() {
                    self.map.remove_popup(popup)?;
                }
                if let Some(marker) = self.mid_marker.take() {
                    self.map.remove_marker(marker)?;
                }
            }
            RouteMode::Fresh => {
                self.clear_trip_markers()?;
                let start = Marker::new(self.trip.start, START_MARKER_COLOR)
                    .with_label("Current location");
                let end = Marker::new(self.trip.end, END_MARKER_COLOR)
                    .with_label(self.trip.destination_label.clone());
                self.start_marker = Some(self.map.add_marker(start)?);
                self.end_marker = Some(self.map.add_marker(end)?);
            }
        }

        self.mid_marker = Some(
            self.map
                .add_marker(Marker::new(mid.coordinate, MID_MARKER_COLOR))?,
        );
        self.mid_popup = Some(self.map.show_popup(
            Popup::new(mid.coordinate, MID_POPUP_HTML).with_class("mid-station-popup"),
        )?);
        Ok(())
    }

    fn clear_trip_markers(&mut self) -> Result<(), MapError> {
        for marker in [
            self.start_marker.take(),
            self.mid_marker.take(),
            self.end_marker.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.map.remove_marker(marker)?;
        }
        if let Some(popup) = self.mid_popup.take() {
            self.map.remove_popup(popup)?;
        }
        Ok(())
    }

    /// Renders a recomputed route, or clears the layer and reports `NoRoute`
    /// when the provider came back empty.
    fn render_route(&mut self, route: FeatureCollection) -> Result<(), MapError> {
        if route.features.is_empty() {
            self.map.set_source_data(ROUTE_SOURCE, empty_route())?;
            self.set_route_status(RouteStatus::NoRoute);
            return Ok(());
        }

        let summary = route_summary(&route);
        self.map.set_source_data(ROUTE_SOURCE, route)?;
        if !self.map.has_layer(ROUTE_LAYER) {
            self.map.add_layer(LayerSpec {
                id: ROUTE_LAYER.into(),
                source: ROUTE_SOURCE.into(),
                paint: LayerPaint::Line {
                    width: ROUTE_LINE_WIDTH,
                    color: ROUTE_COLOR.into(),
                },
            })?;
        }
        let (distance_m, duration_s) = summary.unwrap_or_default();
        self.set_route_status(RouteStatus::Rendered {
            distance_m,
            duration_s,
        });
        Ok(())
    }

    fn set_selection(&mut self, selection: Selection) {
        for listener in &self.selection_listeners {
            listener(&selection);
        }
        self.selection = Some(selection);
    }

    fn set_route_status(&mut self, status: RouteStatus) {
        for listener in &self.route_listeners {
            listener(&status);
        }
        self.route_status = status;
    }

    fn raise_alert(&self, message: &str) {
        (self.alert_sink)(message);
    }
}

fn hover_html(station: &Station) -> String {
    format!(
        "Bikes: {}<br/>Docks: {}",
        station.bikes_available, station.docks_available
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_series_test() {
        let mut tokens = TokenSeries::default();
        let first = tokens.issue();
        assert!(tokens.is_current(first));

        // A newer request makes the older token stale.
        let second = tokens.issue();
        assert!(!tokens.is_current(first));
        assert!(tokens.is_current(second));
    }

    #[test]
    fn hover_html_test() {
        let station = Station {
            name: "City Hall".into(),
            bikes_available: 4,
            docks_available: 6,
            capacity: 10,
            coordinate: Coordinate::new(121.56, 25.04),
        };
        assert_eq!(hover_html(&station), "Bikes: 4<br/>Docks: 6");
    }
}
