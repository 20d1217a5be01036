use std::collections::BTreeMap;

use fleetmap_shared::domain::{Geofence, LatLng, Vehicle, Violation};
use fleetmap_shared::Alert;
use sycamore::reactive::{create_rc_signal, RcSignal};

use crate::draw::DrawTool;

/// Current vehicle list plus the accumulated route per vehicle id.
///
/// The vehicle list is replaced wholesale on every batch; routes only ever
/// grow. A vehicle missing from a batch keeps its route, so trails survive
/// gaps in the feed. Routes are never trimmed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fleet {
    pub vehicles: Vec<Vehicle>,
    pub routes: BTreeMap<String, Vec<LatLng>>,
}

impl Fleet {
    /// The single reconciliation path: both the startup fetch and every
    /// realtime frame go through here.
    pub fn apply_batch(&mut self, batch: Vec<Vehicle>) {
        for vehicle in &batch {
            self.routes
                .entry(vehicle.id.clone())
                .or_default()
                .push(vehicle.position());
        }
        self.vehicles = batch;
    }

    pub fn route(&self, id: &str) -> Option<&[LatLng]> {
        self.routes.get(id).map(Vec::as_slice)
    }

    /// South-west and north-east corners over the current vehicles, for the
    /// one-shot viewport fit.
    pub fn bounds(&self) -> Option<(LatLng, LatLng)> {
        let first = self.vehicles.first()?;
        let (mut sw, mut ne) = (first.position(), first.position());
        for v in &self.vehicles[1..] {
            sw.lat = sw.lat.min(v.lat);
            sw.lng = sw.lng.min(v.lng);
            ne.lat = ne.lat.max(v.lat);
            ne.lng = ne.lng.max(v.lng);
        }
        Some((sw, ne))
    }
}

/// All reactive state, shared between the panels, the map scene and the
/// network tasks. Cloning is cheap; every field is an `RcSignal`.
#[derive(Clone)]
pub struct Stores {
    pub fleet: RcSignal<Fleet>,
    pub geofences: RcSignal<Vec<Geofence>>,
    pub violations: RcSignal<Vec<Violation>>,
    pub alert: RcSignal<Option<Alert>>,
    pub selected: RcSignal<Option<String>>,
    pub draw: RcSignal<DrawTool>,
    pub show_manager: RcSignal<bool>,
    pub show_violations: RcSignal<bool>,
}

impl Stores {
    pub fn new() -> Self {
        Self {
            fleet: create_rc_signal(Fleet::default()),
            geofences: create_rc_signal(Vec::new()),
            violations: create_rc_signal(Vec::new()),
            alert: create_rc_signal(None),
            selected: create_rc_signal(None),
            draw: create_rc_signal(DrawTool::default()),
            show_manager: create_rc_signal(false),
            show_violations: create_rc_signal(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetmap_shared::domain::VehicleStatus;
    use sycamore::prelude::*;

    fn vehicle(id: &str, lat: f64, lng: f64) -> Vehicle {
        Vehicle {
            id: id.to_string(),
            lat,
            lng,
            status: VehicleStatus::Moving,
            address: String::new(),
            last_updated: String::new(),
            alert: None,
        }
    }

    #[test]
    fn batch_appends_to_existing_routes() {
        let mut fleet = Fleet::default();
        fleet.apply_batch(vec![vehicle("t1", 1.0, 2.0)]);
        fleet.apply_batch(vec![vehicle("t1", 1.5, 2.5)]);

        let route = fleet.route("t1").unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0], LatLng { lat: 1.0, lng: 2.0 });
        assert_eq!(route[1], LatLng { lat: 1.5, lng: 2.5 });
    }

    #[test]
    fn new_vehicle_gets_a_fresh_route() {
        let mut fleet = Fleet::default();
        fleet.apply_batch(vec![vehicle("t1", 1.0, 2.0)]);
        fleet.apply_batch(vec![vehicle("t1", 1.1, 2.1), vehicle("t2", 9.0, 9.0)]);

        assert_eq!(fleet.route("t1").unwrap().len(), 2);
        assert_eq!(fleet.route("t2").unwrap().len(), 1);
    }

    #[test]
    fn absent_vehicles_are_not_pruned() {
        let mut fleet = Fleet::default();
        fleet.apply_batch(vec![vehicle("t1", 1.0, 2.0), vehicle("t2", 9.0, 9.0)]);
        fleet.apply_batch(vec![vehicle("t2", 9.1, 9.1)]);

        // t1 dropped out of the live list but its trail remains
        assert_eq!(fleet.vehicles.len(), 1);
        assert_eq!(fleet.route("t1").unwrap().len(), 1);
        assert_eq!(fleet.route("t2").unwrap().len(), 2);
    }

    #[test]
    fn stationary_vehicles_still_extend_their_route() {
        let mut fleet = Fleet::default();
        fleet.apply_batch(vec![vehicle("t1", 1.0, 2.0)]);
        fleet.apply_batch(vec![vehicle("t1", 1.0, 2.0)]);

        assert_eq!(fleet.route("t1").unwrap().len(), 2);
    }

    #[test]
    fn bounds_cover_all_vehicles() {
        let mut fleet = Fleet::default();
        assert_eq!(fleet.bounds(), None);

        fleet.apply_batch(vec![
            vehicle("a", 1.0, -3.0),
            vehicle("b", 4.0, 2.0),
            vehicle("c", -2.0, 0.5),
        ]);
        let (sw, ne) = fleet.bounds().unwrap();
        assert_eq!(sw, LatLng { lat: -2.0, lng: -3.0 });
        assert_eq!(ne, LatLng { lat: 4.0, lng: 2.0 });
    }

    #[test]
    fn batches_propagate_through_signals() {
        create_scope_immediate(|cx| {
            let fleet = create_rc_signal(Fleet::default());
            let points = {
                let fleet = fleet.clone();
                create_memo(cx, move || {
                    fleet.get().routes.values().map(Vec::len).sum::<usize>()
                })
            };
            assert_eq!(*points.get(), 0);

            fleet.modify().apply_batch(vec![vehicle("t1", 1.0, 2.0)]);
            assert_eq!(*points.get(), 1);

            fleet.modify().apply_batch(vec![vehicle("t1", 1.5, 2.5)]);
            assert_eq!(*points.get(), 2);
        });
    }
}
