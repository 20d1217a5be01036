use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};

use fleetmap_shared::{
    domain::{Geofence, GeofenceDraft, LatLng, Shape, Vehicle, VehicleAlert, Violation},
    Alert, Push,
};
use futures::StreamExt;
use gloo::{
    console,
    dialogs::alert,
    net::{
        self,
        http::Request,
        websocket::{futures::WebSocket, Message},
    },
    timers::future::sleep,
};
use serde::de::DeserializeOwned;
use sycamore::futures::spawn_local;
use wasm_bindgen::JsValue;

use crate::{
    draw::{DrawKind, DrawTool, DEFAULT_CIRCLE_RADIUS},
    leaflet::{self, Area, Marker, Trail},
    state::Stores,
};

const GEOFENCE_POLYGON_COLOR: &str = "#4CAF50";
const GEOFENCE_CIRCLE_COLOR: &str = "#2196F3";
const PREVIEW_COLOR: &str = "#FFC107";
const TRAIL_COLOR: &str = "#0000FF";
const TRAIL_SELECTED_COLOR: &str = "#FF0000";

const ALERT_BANNER_SECS: u64 = 5;

fn marker_color(vehicle: &Vehicle) -> &'static str {
    match vehicle.alert {
        Some(VehicleAlert::Breakdown) => "#f44336",
        Some(VehicleAlert::Idle) => "#FFC107",
        None => "#4CAF50",
    }
}

async fn get_json<T: DeserializeOwned>(path: &str) -> Result<T, net::Error> {
    Request::get(&crate::api_url(path)).send().await?.json().await
}

pub async fn fetch_vehicles() -> Result<Vec<Vehicle>, net::Error> {
    get_json("/api/locations").await
}

pub async fn fetch_geofences() -> Result<Vec<Geofence>, net::Error> {
    get_json("/api/geofences").await
}

pub async fn fetch_violations() -> Result<Vec<Violation>, net::Error> {
    get_json("/api/violations").await
}

pub async fn create_geofence(draft: &GeofenceDraft) -> Result<bool, net::Error> {
    let response = Request::post(&crate::api_url("/api/geofences"))
        .json(draft)?
        .send()
        .await?;
    Ok(response.ok())
}

pub async fn delete_geofence(id: &str) -> Result<bool, net::Error> {
    let response = Request::delete(&crate::api_url(&format!("/api/geofences/{id}")))
        .send()
        .await?;
    Ok(response.ok())
}

pub async fn resolve_violation(id: &str) -> Result<bool, net::Error> {
    let response = Request::patch(&crate::api_url(&format!("/api/violations/{id}/resolve")))
        .send()
        .await?;
    Ok(response.ok())
}

/// Everything drawn on the map, keyed by backend id. Dropping an entry
/// removes its layer, so replacing a map entry swaps the layer in place.
pub struct MapScene {
    markers: BTreeMap<String, Marker>,
    trails: BTreeMap<String, Trail>,
    areas: BTreeMap<String, Area>,
    preview: Option<Area>,
    fitted: bool,
}

impl MapScene {
    pub fn new() -> Self {
        Self {
            markers: BTreeMap::new(),
            trails: BTreeMap::new(),
            areas: BTreeMap::new(),
            preview: None,
            fitted: false,
        }
    }

    /// Rebuilds markers for the current batch and extends the trails. The
    /// viewport is fitted to the fleet once, on the first non-empty batch.
    fn sync_vehicles(&mut self, stores: &Stores, select: &Rc<dyn Fn(String)>) {
        let fleet = stores.fleet.get();
        self.markers.clear();
        for vehicle in &fleet.vehicles {
            let title = format!("{} - {}", vehicle.address, vehicle.status);
            let id = vehicle.id.clone();
            let select = select.clone();
            let marker = Marker::new(
                vehicle.lat,
                vehicle.lng,
                title,
                marker_color(vehicle),
                move || (*select)(id.clone()),
            );
            self.markers.insert(vehicle.id.clone(), marker);
        }

        let selected = stores.selected.get();
        self.sync_trails(stores, (*selected).as_deref());

        if !self.fitted {
            if let Some((sw, ne)) = fleet.bounds() {
                leaflet::fit(sw.lat, sw.lng, ne.lat, ne.lng);
                self.fitted = true;
            }
        }
    }

    /// Rebuilds every trail from the accumulated routes; the selected
    /// vehicle's trail is drawn on top in the highlight style.
    fn sync_trails(&mut self, stores: &Stores, selected: Option<&str>) {
        let fleet = stores.fleet.get();
        self.trails.clear();
        for (id, route) in &fleet.routes {
            if selected == Some(id.as_str()) {
                continue;
            }
            self.trails.insert(id.clone(), trail_for(route, false));
        }
        if let Some(id) = selected {
            if let Some(route) = fleet.route(id) {
                self.trails.insert(id.to_owned(), trail_for(route, true));
            }
        }
    }

    pub fn sync_geofences(&mut self, fences: &[Geofence]) {
        self.areas.clear();
        for fence in fences {
            let popup = popup_html(fence);
            let area = match &fence.shape {
                Shape::Polygon { coordinates } => {
                    let area = Area::polygon(GEOFENCE_POLYGON_COLOR, popup);
                    for [lng, lat] in coordinates {
                        area.push(*lat, *lng);
                    }
                    area
                }
                Shape::Circle {
                    coordinates: [lng, lat],
                    radius,
                } => Area::circle(
                    *lat,
                    *lng,
                    radius.unwrap_or(DEFAULT_CIRCLE_RADIUS),
                    GEOFENCE_CIRCLE_COLOR,
                    popup,
                ),
            };
            self.areas.insert(fence.id.clone(), area);
        }
    }

    /// Mirrors the in-progress candidate shape on the map.
    pub fn sync_preview(&mut self, draw: &DrawTool) {
        self.preview = match draw {
            DrawTool::Drawing { kind, points } if !points.is_empty() => match kind {
                DrawKind::Polygon => {
                    let area = Area::polygon(PREVIEW_COLOR, String::new());
                    for p in points {
                        area.push(p.lat, p.lng);
                    }
                    Some(area)
                }
                DrawKind::Circle => points.first().map(|center| {
                    Area::circle(
                        center.lat,
                        center.lng,
                        DEFAULT_CIRCLE_RADIUS,
                        PREVIEW_COLOR,
                        String::new(),
                    )
                }),
            },
            _ => None,
        };
    }
}

fn trail_for(route: &[LatLng], selected: bool) -> Trail {
    let trail = if selected {
        Trail::new(TRAIL_SELECTED_COLOR, 4.0, 0.8)
    } else {
        Trail::new(TRAIL_COLOR, 2.0, 0.5)
    };
    for p in route {
        trail.push(p.lat, p.lng);
    }
    trail
}

fn popup_html(fence: &Geofence) -> String {
    let created = fence
        .created_at
        .as_deref()
        .map(|ts| format!("<br>Created: {}", format_date(ts)))
        .unwrap_or_default();
    format!(
        "<b>{}</b><br>Type: {}{created}",
        fence.name,
        fence.shape.kind()
    )
}

fn format_date(ts: &str) -> String {
    let ms = js_sys::Date::parse(ts);
    if ms.is_nan() {
        return ts.to_owned();
    }
    String::from(js_sys::Date::new(&JsValue::from_f64(ms)).to_date_string())
}

fn select_callback(stores: &Stores, scene: &Rc<RefCell<MapScene>>) -> Rc<dyn Fn(String)> {
    let stores = stores.clone();
    let scene = scene.clone();
    Rc::new(move |id| select_vehicle(&stores, &scene, Some(id)))
}

/// Applies one vehicle batch: reconciles state, then redraws the scene.
pub fn apply_vehicles(stores: &Stores, scene: &Rc<RefCell<MapScene>>, batch: Vec<Vehicle>) {
    stores.fleet.modify().apply_batch(batch);
    let select = select_callback(stores, scene);
    scene.borrow_mut().sync_vehicles(stores, &select);
}

pub fn select_vehicle(stores: &Stores, scene: &Rc<RefCell<MapScene>>, id: Option<String>) {
    stores.selected.set(id);
    let selected = stores.selected.get();
    scene
        .borrow_mut()
        .sync_trails(stores, (*selected).as_deref());
}

/// Forwards a map click to the drawing tool and refreshes the preview.
pub fn draw_click(stores: &Stores, scene: &Rc<RefCell<MapScene>>, point: LatLng) {
    if !stores.draw.get().is_drawing() {
        return;
    }
    stores.draw.modify().click(point);
    scene.borrow_mut().sync_preview(&stores.draw.get());
}

pub async fn refresh_geofences(stores: &Stores, scene: &Rc<RefCell<MapScene>>) {
    match fetch_geofences().await {
        Ok(fences) => {
            scene.borrow_mut().sync_geofences(&fences);
            stores.geofences.set(fences);
        }
        Err(err) => console::error!(format!("fetching geofences failed: {err}")),
    }
}

pub async fn refresh_violations(stores: &Stores) {
    match fetch_violations().await {
        Ok(violations) => stores.violations.set(violations),
        Err(err) => console::error!(format!("fetching violations failed: {err}")),
    }
}

/// Shows the banner alert and hides it again after a few seconds, unless a
/// newer alert replaced it in the meantime.
fn show_alert(stores: &Stores, incoming: Alert) {
    stores.alert.set(Some(incoming.clone()));
    let stores = stores.clone();
    spawn_local(async move {
        sleep(Duration::from_secs(ALERT_BANNER_SECS)).await;
        if (*stores.alert.get()).as_ref() == Some(&incoming) {
            stores.alert.set(None);
        }
    });
}

/// Consumes the realtime channel until it closes. Vehicle frames feed the
/// reconciliation path; alert frames raise the banner and refresh the
/// violation list.
pub async fn read_push(ws: WebSocket, stores: Stores, scene: Rc<RefCell<MapScene>>) {
    let mut read = ws;
    while let Some(frame) = read.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Bytes(_)) => {
                console::warn!("ignoring binary push frame");
                continue;
            }
            Err(_) => break,
        };
        match serde_json::from_str::<Push>(&text) {
            Ok(Push::VehicleUpdate(batch)) => apply_vehicles(&stores, &scene, batch),
            Ok(Push::GeofenceAlert(incoming)) => {
                show_alert(&stores, incoming);
                let stores = stores.clone();
                spawn_local(async move { refresh_violations(&stores).await });
            }
            Err(err) => console::error!(format!("bad push frame: {err}")),
        }
    }

    let local_time = String::from(js_sys::Date::new_0().to_time_string());
    alert(&format!(
        "live connection lost: refresh the page for new data!\n{local_time}"
    ));
}
