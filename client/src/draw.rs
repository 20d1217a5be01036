use std::fmt;

use fleetmap_shared::domain::{LatLng, Shape};

/// Radius assigned to circle geofences at creation; the backend accepts an
/// explicit radius but the drawing tool has no way to capture one.
pub const DEFAULT_CIRCLE_RADIUS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Polygon,
    Circle,
}

impl fmt::Display for DrawKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DrawKind::Polygon => write!(f, "polygon"),
            DrawKind::Circle => write!(f, "circle"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DrawError {
    NotDrawing,
    TooFewPoints,
    NoCenter,
}

/// Captures map clicks into a candidate geofence shape.
///
/// Polygons collect a vertex per click; circles keep only the most recent
/// click as their center. `finish` validates, converts to the wire shape and
/// resets; on a validation error the tool stays armed so the user can keep
/// clicking.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawTool {
    #[default]
    Idle,
    Drawing {
        kind: DrawKind,
        points: Vec<LatLng>,
    },
}

impl DrawTool {
    pub fn begin(&mut self, kind: DrawKind) {
        *self = DrawTool::Drawing {
            kind,
            points: Vec::new(),
        };
    }

    pub fn click(&mut self, point: LatLng) {
        let DrawTool::Drawing { kind, points } = self else {
            return;
        };
        match kind {
            DrawKind::Polygon => points.push(point),
            DrawKind::Circle => {
                points.clear();
                points.push(point);
            }
        }
    }

    pub fn cancel(&mut self) {
        *self = DrawTool::Idle;
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, DrawTool::Drawing { .. })
    }

    pub fn finish(&mut self) -> Result<Shape, DrawError> {
        let DrawTool::Drawing { kind, points } = self else {
            return Err(DrawError::NotDrawing);
        };
        let shape = match kind {
            DrawKind::Polygon => {
                if points.len() < 3 {
                    return Err(DrawError::TooFewPoints);
                }
                Shape::Polygon {
                    coordinates: points.iter().map(|p| [p.lng, p.lat]).collect(),
                }
            }
            DrawKind::Circle => {
                let center = points.first().ok_or(DrawError::NoCenter)?;
                Shape::Circle {
                    coordinates: [center.lng, center.lat],
                    radius: Some(DEFAULT_CIRCLE_RADIUS),
                }
            }
        };
        *self = DrawTool::Idle;
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> LatLng {
        LatLng { lat, lng }
    }

    #[test]
    fn clicks_are_ignored_while_idle() {
        let mut tool = DrawTool::default();
        tool.click(pt(1.0, 2.0));
        assert_eq!(tool, DrawTool::Idle);
        assert_eq!(tool.finish(), Err(DrawError::NotDrawing));
    }

    #[test]
    fn polygon_requires_three_vertices() {
        let mut tool = DrawTool::default();
        tool.begin(DrawKind::Polygon);
        tool.click(pt(0.0, 0.0));
        tool.click(pt(0.0, 1.0));

        assert_eq!(tool.finish(), Err(DrawError::TooFewPoints));
        // still armed: the user can keep adding vertices
        assert!(tool.is_drawing());

        tool.click(pt(1.0, 1.0));
        let shape = tool.finish().unwrap();
        assert_eq!(
            shape,
            Shape::Polygon {
                coordinates: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
            }
        );
        assert_eq!(tool, DrawTool::Idle);
    }

    #[test]
    fn circle_keeps_the_last_center_only() {
        let mut tool = DrawTool::default();
        tool.begin(DrawKind::Circle);
        assert_eq!(tool.finish(), Err(DrawError::NoCenter));

        tool.click(pt(53.0, -6.0));
        tool.click(pt(54.0, -7.0));
        let shape = tool.finish().unwrap();
        assert_eq!(
            shape,
            Shape::Circle {
                coordinates: [-7.0, 54.0],
                radius: Some(DEFAULT_CIRCLE_RADIUS),
            }
        );
    }

    #[test]
    fn begin_discards_a_previous_candidate() {
        let mut tool = DrawTool::default();
        tool.begin(DrawKind::Polygon);
        tool.click(pt(0.0, 0.0));
        tool.begin(DrawKind::Circle);
        assert_eq!(
            tool,
            DrawTool::Drawing {
                kind: DrawKind::Circle,
                points: vec![],
            }
        );
    }

    #[test]
    fn cancel_resets_unconditionally() {
        let mut tool = DrawTool::default();
        tool.begin(DrawKind::Polygon);
        tool.click(pt(0.0, 0.0));
        tool.cancel();
        assert_eq!(tool, DrawTool::Idle);

        tool.cancel();
        assert_eq!(tool, DrawTool::Idle);
    }
}
