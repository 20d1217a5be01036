use std::{cell::RefCell, rc::Rc};

use fleetmap_shared::domain::{GeofenceDraft, VehicleStatus, Violation, ViolationKind};
use gloo::{
    console,
    dialogs::{alert, prompt},
    utils::document,
};
use sycamore::{futures::spawn_local_scoped, prelude::*, web::DomNode};
use wasm_bindgen::JsValue;
use web_sys::Element;

use crate::{
    comms::{self, MapScene},
    draw::{DrawError, DrawKind, DrawTool},
    state::Stores,
};

pub fn mount(stores: &Stores, scene: &Rc<RefCell<MapScene>>) {
    control_panel(stores.clone(), scene.clone());
    geofence_manager(stores.clone(), scene.clone());
    violations_dashboard(stores.clone());
    alert_banner(stores.clone());
    vehicle_table(stores.clone());
}

fn get_element(name: &str) -> Element {
    document()
        .get_element_by_id(name)
        .expect(&format!("there is a {name} element"))
}

fn control_panel(stores: Stores, scene: Rc<RefCell<MapScene>>) {
    let panel = get_element("control_panel");

    sycamore::render_to(
        |cx| {
            let stores = create_ref(cx, stores);
            let scene = create_ref(cx, scene);
            let vehicles = create_memo(cx, move || (*stores.fleet.get()).vehicles.clone());
            let manager_label = create_memo(cx, move || {
                if *stores.show_manager.get() {
                    "Hide Geofence Manager"
                } else {
                    "Show Geofence Manager"
                }
            });
            let violations_label = create_memo(cx, move || {
                if *stores.show_violations.get() {
                    "Hide Violations"
                } else {
                    "Show Violations"
                }
            });

            view! { cx,
                h2 { "Fleet Management" }
                div(class="field") {
                    strong { "Active vehicles: " (vehicles.get().len()) }
                }
                Keyed(
                    iterable=vehicles,
                    view=move |cx, vehicle| {
                        let id = create_ref(cx, vehicle.id.clone());
                        let label = format!("{} - {}", vehicle.id, vehicle.status);
                        let dot = match vehicle.status {
                            VehicleStatus::Breakdown => "dot breakdown",
                            VehicleStatus::Idle => "dot idle",
                            VehicleStatus::Moving => "dot moving",
                        };
                        view! { cx,
                            div(class="vehicle-row", on:click=move |_| {
                                comms::select_vehicle(stores, scene, Some(id.clone()));
                            }) {
                                span(class=dot) " " (label)
                            }
                        }
                    },
                    key=|vehicle| (vehicle.id.clone(), vehicle.status, vehicle.alert),
                )
                div(class="field") {
                    button(on:click=move |_| {
                        stores.show_manager.set(!*stores.show_manager.get());
                    }) { (manager_label.get()) }
                    button(on:click=move |_| {
                        stores.show_violations.set(!*stores.show_violations.get());
                    }) { (violations_label.get()) }
                }
            }
        },
        &panel,
    );
}

fn geofence_manager(stores: Stores, scene: Rc<RefCell<MapScene>>) {
    let panel = get_element("geofence_manager");

    sycamore::render_to(
        |cx| {
            let stores = create_ref(cx, stores);
            let scene = create_ref(cx, scene);
            let fences = create_memo(cx, move || (*stores.geofences.get()).clone());

            view! { cx,
                (if *stores.show_manager.get() {
                    view! { cx,
                        div(class="panel") {
                            h3 { "Geofence Manager" }
                            (draw_controls(cx, stores, scene))
                            h4 { (format!("Geofences ({})", stores.geofences.get().len())) }
                            div(class="fence-list") {
                                Keyed(
                                    iterable=fences,
                                    view=move |cx, fence| {
                                        let id = create_ref(cx, fence.id.clone());
                                        let name = fence.name.clone();
                                        let kind = fence.shape.kind();
                                        view! { cx,
                                            div(class="fence-row") {
                                                div(class="fence-name") { (name) }
                                                div(class="fence-kind") { (kind) }
                                                button(on:click=move |_| {
                                                    spawn_local_scoped(cx, async move {
                                                        match comms::delete_geofence(id).await {
                                                            Ok(true) => comms::refresh_geofences(stores, scene).await,
                                                            Ok(false) => console::error!("backend refused to delete geofence"),
                                                            Err(err) => console::error!(format!("deleting geofence failed: {err}")),
                                                        }
                                                    });
                                                }) { "Delete" }
                                            }
                                        }
                                    },
                                    key=|fence| fence.id.clone(),
                                )
                            }
                        }
                    }
                } else {
                    View::empty()
                })
            }
        },
        &panel,
    );
}

fn draw_controls<'cx>(
    cx: BoundedScope<'cx, 'cx>,
    stores: &'cx Stores,
    scene: &'cx Rc<RefCell<MapScene>>,
) -> View<DomNode> {
    match &*stores.draw.get() {
        DrawTool::Idle => view! { cx,
            div(class="field") {
                button(on:click=move |_| begin_drawing(stores, scene, DrawKind::Polygon)) {
                    "Draw Polygon"
                }
                button(on:click=move |_| begin_drawing(stores, scene, DrawKind::Circle)) {
                    "Draw Circle"
                }
            }
        },
        DrawTool::Drawing { kind, points } => {
            let status = format!("Drawing {kind}... ({} points)", points.len());
            view! { cx,
                div(class="field") {
                    p { (status) }
                    button(on:click=move |_| finish_drawing(cx, stores, scene)) { "Finish" }
                    button(on:click=move |_| cancel_drawing(stores, scene)) { "Cancel" }
                }
            }
        }
    }
}

fn begin_drawing(stores: &Stores, scene: &Rc<RefCell<MapScene>>, kind: DrawKind) {
    stores.draw.modify().begin(kind);
    scene.borrow_mut().sync_preview(&stores.draw.get());
}

fn cancel_drawing(stores: &Stores, scene: &Rc<RefCell<MapScene>>) {
    stores.draw.modify().cancel();
    scene.borrow_mut().sync_preview(&stores.draw.get());
}

fn finish_drawing<'cx>(
    cx: BoundedScope<'cx, 'cx>,
    stores: &'cx Stores,
    scene: &'cx Rc<RefCell<MapScene>>,
) {
    let shape = match stores.draw.modify().finish() {
        Ok(shape) => shape,
        Err(DrawError::TooFewPoints) => {
            alert("Polygon needs at least 3 points");
            return;
        }
        Err(DrawError::NoCenter) => {
            alert("Click the map to place the circle center");
            return;
        }
        Err(DrawError::NotDrawing) => return,
    };
    scene.borrow_mut().sync_preview(&stores.draw.get());

    // an unnamed candidate is dropped silently, like the rest of the flow
    let Some(name) = prompt("Enter geofence name:", None)
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
    else {
        return;
    };

    let draft = GeofenceDraft {
        name,
        shape,
        alert_on_entry: true,
        alert_on_exit: true,
    };
    spawn_local_scoped(cx, async move {
        match comms::create_geofence(&draft).await {
            Ok(true) => comms::refresh_geofences(stores, scene).await,
            Ok(false) => console::error!("backend refused to create geofence"),
            Err(err) => console::error!(format!("creating geofence failed: {err}")),
        }
    });
}

fn violations_dashboard(stores: Stores) {
    let panel = get_element("violations_dashboard");

    sycamore::render_to(
        |cx| {
            let stores = create_ref(cx, stores);
            let recent = create_memo(cx, move || {
                stores
                    .violations
                    .get()
                    .iter()
                    .take(10)
                    .cloned()
                    .collect::<Vec<_>>()
            });

            view! { cx,
                (if *stores.show_violations.get() {
                    view! { cx,
                        div(class="panel") {
                            h3 { (format!("Recent Violations ({})", stores.violations.get().len())) }
                            (if recent.get().is_empty() {
                                view! { cx, div(class="empty") { "No recent violations" } }
                            } else {
                                view! { cx,
                                    Keyed(
                                        iterable=recent,
                                        view=move |cx, violation| violation_row(cx, stores, violation),
                                        key=|violation| (violation.id.clone(), violation.resolved),
                                    )
                                }
                            })
                        }
                    }
                } else {
                    View::empty()
                })
            }
        },
        &panel,
    );
}

fn violation_row<'cx>(
    cx: BoundedScope<'cx, 'cx>,
    stores: &'cx Stores,
    violation: Violation,
) -> View<DomNode> {
    let kind = match violation.violation_type {
        ViolationKind::Entry => "entry",
        ViolationKind::Exit => "exit",
    };
    let class = if violation.resolved {
        "violation resolved"
    } else {
        match violation.violation_type {
            ViolationKind::Entry => "violation entry",
            ViolationKind::Exit => "violation exit",
        }
    };
    let id = create_ref(cx, violation.id.clone());
    let resolved = violation.resolved;
    let headline = violation.vehicle_id.clone();
    let detail = format!("{} ({kind})", violation.geofence_name);
    let when = format_timestamp(&violation.timestamp);

    view! { cx,
        div(class=class) {
            div(class="violation-head") {
                strong { (headline) }
                (if !resolved {
                    view! { cx,
                        button(on:click=move |_| {
                            spawn_local_scoped(cx, async move {
                                match comms::resolve_violation(id).await {
                                    Ok(true) => comms::refresh_violations(stores).await,
                                    Ok(false) => console::error!("backend refused to resolve violation"),
                                    Err(err) => console::error!(format!("resolving violation failed: {err}")),
                                }
                            });
                        }) { "Resolve" }
                    }
                } else {
                    view! { cx, span(class="resolved-note") { "Resolved" } }
                })
            }
            div { (detail) }
            div(class="muted") { (when) }
        }
    }
}

fn alert_banner(stores: Stores) {
    let host = get_element("alert_banner");

    sycamore::render_to(
        |cx| {
            let stores = create_ref(cx, stores);
            view! { cx,
                (match (*stores.alert.get()).clone() {
                    Some(active) => {
                        let class = match active.kind {
                            ViolationKind::Entry => "alert-banner entry",
                            ViolationKind::Exit => "alert-banner exit",
                        };
                        view! { cx, div(class=class) { (active.message) } }
                    }
                    None => View::empty(),
                })
            }
        },
        &host,
    );
}

fn vehicle_table(stores: Stores) {
    let host = get_element("vehicle_table");

    sycamore::render_to(
        |cx| {
            let stores = create_ref(cx, stores);
            let vehicles = create_memo(cx, move || (*stores.fleet.get()).vehicles.clone());

            view! { cx,
                h2 { "Vehicle Status" }
                table {
                    thead {
                        tr {
                            th { "ID" }
                            th { "Address" }
                            th { "Status" }
                            th { "Last Updated" }
                        }
                    }
                    tbody {
                        Keyed(
                            iterable=vehicles,
                            view=|cx, vehicle| {
                                let id = vehicle.id.clone();
                                let address = vehicle.address.clone();
                                let status = vehicle.status.to_string();
                                let when = format_time(&vehicle.last_updated);
                                view! { cx,
                                    tr {
                                        td { (id) }
                                        td { (address) }
                                        td { (status) }
                                        td { (when) }
                                    }
                                }
                            },
                            key=|vehicle| (vehicle.id.clone(), vehicle.last_updated.clone()),
                        )
                    }
                }
            }
        },
        &host,
    );
}

fn format_timestamp(ts: &str) -> String {
    let ms = js_sys::Date::parse(ts);
    if ms.is_nan() {
        return ts.to_owned();
    }
    let date = js_sys::Date::new(&JsValue::from_f64(ms));
    String::from(date.to_locale_string("en-GB", &JsValue::UNDEFINED))
}

fn format_time(ts: &str) -> String {
    let ms = js_sys::Date::parse(ts);
    if ms.is_nan() {
        return ts.to_owned();
    }
    let date = js_sys::Date::new(&JsValue::from_f64(ms));
    String::from(date.to_locale_time_string("en-GB"))
}
