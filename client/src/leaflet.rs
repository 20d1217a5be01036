use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen(module = "/map.js")]
extern "C" {
    fn init_map(lat: f64, lng: f64, zoom: f64);
    fn map_on_click(callback: &js_sys::Function);
    fn fit_bounds(south: f64, west: f64, north: f64, east: f64);

    type JsMarker;

    fn add_marker(
        lat: f64,
        lng: f64,
        title: String,
        color: String,
        on_click: &js_sys::Function,
    ) -> JsMarker;
    #[wasm_bindgen(js_name = remove_layer)]
    fn remove_marker(marker: &JsMarker);

    type JsTrail;

    fn new_trail(color: String, weight: f64, opacity: f64) -> JsTrail;
    fn trail_push(trail: &JsTrail, lat: f64, lng: f64);
    #[wasm_bindgen(js_name = remove_layer)]
    fn remove_trail(trail: &JsTrail);

    type JsArea;

    fn new_polygon(color: String, popup: String) -> JsArea;
    fn area_push(area: &JsArea, lat: f64, lng: f64);
    fn new_circle(lat: f64, lng: f64, radius: f64, color: String, popup: String) -> JsArea;
    #[wasm_bindgen(js_name = remove_layer)]
    fn remove_area(area: &JsArea);
}

pub fn init(lat: f64, lng: f64, zoom: f64) {
    init_map(lat, lng, zoom);
}

/// Registers the single map click handler. The closure lives for the page.
pub fn on_click(handler: impl FnMut(f64, f64) + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(f64, f64)>);
    map_on_click(closure.as_ref().unchecked_ref());
    closure.forget();
}

pub fn fit(south: f64, west: f64, north: f64, east: f64) {
    fit_bounds(south, west, north, east);
}

pub struct Marker {
    inner: JsMarker,
    // keeps the click callback alive as long as the layer exists
    _on_click: Closure<dyn FnMut()>,
}

impl Marker {
    pub fn new(lat: f64, lng: f64, title: String, color: &str, on_click: impl FnMut() + 'static) -> Self {
        let on_click = Closure::wrap(Box::new(on_click) as Box<dyn FnMut()>);
        let inner = add_marker(lat, lng, title, color.to_owned(), on_click.as_ref().unchecked_ref());
        Self {
            inner,
            _on_click: on_click,
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        remove_marker(&self.inner)
    }
}

pub struct Trail(JsTrail);

impl Trail {
    pub fn new(color: &str, weight: f64, opacity: f64) -> Self {
        Self(new_trail(color.to_owned(), weight, opacity))
    }
    pub fn push(&self, lat: f64, lng: f64) {
        trail_push(&self.0, lat, lng)
    }
}

impl Drop for Trail {
    fn drop(&mut self) {
        remove_trail(&self.0)
    }
}

/// A geofence layer: polygon or circle, with an info popup.
pub struct Area(JsArea);

impl Area {
    pub fn polygon(color: &str, popup: String) -> Self {
        Self(new_polygon(color.to_owned(), popup))
    }
    pub fn circle(lat: f64, lng: f64, radius: f64, color: &str, popup: String) -> Self {
        Self(new_circle(lat, lng, radius, color.to_owned(), popup))
    }
    pub fn push(&self, lat: f64, lng: f64) {
        area_push(&self.0, lat, lng)
    }
}

impl Drop for Area {
    fn drop(&mut self) {
        remove_area(&self.0)
    }
}
