use crate::location::{Location, Point};
use crate::projection::{Projection, REFERENCE_ZOOM, unwrap_longitude};
use serde::{Deserialize, Serialize};

/// Deepest zoom `fit_view` will pick, so a single point does not zoom to street level.
const MAX_FIT_ZOOM: f64 = 18.0;

/// Extent around an anchor, in reference-zoom pixels. All four sides are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margin {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Margin {
    /// Grows the margin to cover `p`, a point relative to the anchor.
    pub fn include(&mut self, p: Point) {
        self.north = self.north.max(-p.y);
        self.south = self.south.max(p.y);
        self.east = self.east.max(p.x);
        self.west = self.west.max(-p.x);
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut m = Self::default();
        for p in points {
            m.include(p);
        }
        m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub anchor: Location,
    pub margin: Margin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub center: Location,
    pub zoom: f64,
}

/// Picks the center and zoom that show every bound inside a `width` x `height` viewport,
/// keeping `padding` pixels free on each side.
pub fn fit_view(bounds: &[Bound], width: f64, height: f64, padding: f64) -> Option<View> {
    let first = bounds.first()?;
    let proj = Projection::reference();
    let origin = proj.to_pixel(first.anchor);

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for b in bounds {
        let off = proj.offset(first.anchor, b.anchor);
        min_x = min_x.min(off.x - b.margin.west);
        max_x = max_x.max(off.x + b.margin.east);
        min_y = min_y.min(off.y - b.margin.north);
        max_y = max_y.max(off.y + b.margin.south);
    }

    let mid = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let mut center = proj.from_pixel(origin.add(mid));
    center.longitude = unwrap_longitude(0.0, center.longitude);

    let avail_w = (width - 2.0 * padding).max(1.0);
    let avail_h = (height - 2.0 * padding).max(1.0);
    let span_w = max_x - min_x;
    let span_h = max_y - min_y;
    let kx = if span_w > 0.0 { avail_w / span_w } else { f64::INFINITY };
    let ky = if span_h > 0.0 { avail_h / span_h } else { f64::INFINITY };
    let k = kx.min(ky);
    let zoom = if k.is_finite() {
        (REFERENCE_ZOOM + k.log2()).clamp(0.0, MAX_FIT_ZOOM)
    } else {
        MAX_FIT_ZOOM
    };
    Some(View { center, zoom })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_covers_points_on_all_sides() {
        let m = Margin::from_points([Point::new(3.0, -2.0), Point::new(-1.0, 5.0)]);
        assert_eq!(m.north, 2.0);
        assert_eq!(m.south, 5.0);
        assert_eq!(m.east, 3.0);
        assert_eq!(m.west, 1.0);
    }

    #[test]
    fn single_point_fits_at_max_zoom() {
        let b = Bound {
            anchor: Location::new(2.35, 48.85),
            margin: Margin::default(),
        };
        let v = fit_view(&[b], 800.0, 600.0, 10.0).expect("view");
        assert_eq!(v.zoom, MAX_FIT_ZOOM);
        assert!((v.center.longitude - 2.35).abs() < 1e-9);
    }
}
