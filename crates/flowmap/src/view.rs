use flowmap_geo::{Location, Point, Projection};
use serde::{Deserialize, Serialize};

/// The live map viewport as reported by the map control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Location,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl MapView {
    /// Screen pixel of `loc`, origin at the viewport's top-left corner.
    pub fn pixel(&self, loc: Location) -> Point {
        let proj = Projection::at_zoom(self.zoom);
        proj.offset(self.center, loc)
            .add(Point::new(self.width / 2.0, self.height / 2.0))
    }
}

/// Placement of reference-zoom geometry on screen: translate to the anchor, then scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupTransform {
    pub translate: Point,
    pub scale: f64,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            translate: Point::default(),
            scale: 1.0,
        }
    }
}

impl GroupTransform {
    pub fn new(anchor: Location, view: &MapView, projection: &Projection) -> Self {
        Self {
            translate: view.pixel(anchor),
            scale: projection.scale_factor(view.zoom),
        }
    }

    /// Stroke width to set inside the scaled group so it shows as `pixels` on screen.
    pub fn stroke(&self, pixels: f64) -> f64 {
        if self.scale > 0.0 {
            pixels / self.scale
        } else {
            pixels
        }
    }
}
