use std::{cell::RefCell, rc::Rc};

use fleetmap_shared::domain::LatLng;
use gloo::{console, net::websocket::futures::WebSocket, utils::window};
use sycamore::futures::spawn_local;

use crate::{comms::MapScene, state::Stores};

mod comms;
mod draw;
mod leaflet;
mod panels;
mod state;

const HTTP_PROTOCOL: &str = "http";
const API_PORT: &str = "3001";

// Dublin
const DEFAULT_LAT: f64 = 53.3498053;
const DEFAULT_LNG: f64 = -6.2603097;
const DEFAULT_ZOOM: f64 = 7.0;

/// Backend base URL: compile-time override, else the page's own host on the
/// backend port.
pub(crate) fn api_base() -> String {
    if let Some(base) = option_env!("FLEETMAP_API_BASE") {
        return base.trim_end_matches('/').to_owned();
    }
    let host = window()
        .location()
        .hostname()
        .unwrap_or_else(|_| "localhost".to_owned());
    format!("{HTTP_PROTOCOL}://{host}:{API_PORT}")
}

pub(crate) fn api_url(path: &str) -> String {
    format!("{}{path}", api_base())
}

pub(crate) fn push_url() -> String {
    format!("{}/push", api_base().replacen("http", "ws", 1))
}

fn main() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    leaflet::init(DEFAULT_LAT, DEFAULT_LNG, DEFAULT_ZOOM);

    let stores = Stores::new();
    let scene = Rc::new(RefCell::new(MapScene::new()));

    {
        let stores = stores.clone();
        let scene = scene.clone();
        leaflet::on_click(move |lat, lng| {
            comms::draw_click(&stores, &scene, LatLng { lat, lng });
        });
    }

    panels::mount(&stores, &scene);

    spawn_local(async move {
        match comms::fetch_vehicles().await {
            Ok(batch) => comms::apply_vehicles(&stores, &scene, batch),
            Err(err) => console::error!(format!("initial /api/locations fetch failed: {err}")),
        }
        comms::refresh_geofences(&stores, &scene).await;
        comms::refresh_violations(&stores).await;

        match WebSocket::open(&push_url()) {
            Ok(ws) => comms::read_push(ws, stores, scene).await,
            Err(err) => console::error!(format!("opening the live channel failed: {err}")),
        }
    });
}
