//! Spherical (Web) Mercator at a fixed reference zoom.

use crate::bound::Margin;
use crate::location::{Location, Point};
use std::f64::consts::PI;

/// Zoom level at which all flow geometry is computed.
pub const REFERENCE_ZOOM: f64 = 20.0;
pub const TILE_SIZE: f64 = 256.0;

/// Mercator is undefined at the poles; latitudes are clamped to the usual tile limit.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    zoom: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self::reference()
    }
}

/// Result of projecting several locations relative to the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBatch {
    /// One point per input location, relative to the anchor pixel.
    pub points: Vec<Point>,
    pub anchor: Location,
    pub margin: Margin,
}

impl Projection {
    pub fn reference() -> Self {
        Self {
            zoom: REFERENCE_ZOOM,
        }
    }

    pub fn at_zoom(zoom: f64) -> Self {
        Self { zoom }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    /// Absolute pixel of `loc`. Longitudes outside `[-180, 180]` are projected linearly, which
    /// is what keeps unwrapped seam-crossing geometry continuous.
    pub fn to_pixel(&self, loc: Location) -> Point {
        let size = self.world_size();
        let x = (loc.longitude + 180.0) / 360.0 * size;
        let lat = loc.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let sin = lat.sin();
        let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * size;
        Point::new(x, y)
    }

    pub fn from_pixel(&self, p: Point) -> Location {
        let size = self.world_size();
        let longitude = p.x / size * 360.0 - 180.0;
        let n = PI - 2.0 * PI * p.y / size;
        let latitude = n.sinh().atan().to_degrees();
        Location::new(longitude, latitude)
    }

    /// Projects `locs` relative to the first location. Each longitude is unwrapped against
    /// the anchor so two points never sit more than half a world apart horizontally.
    pub fn to_pixel_batch(&self, locs: &[Location]) -> Option<PixelBatch> {
        let anchor = *locs.first()?;
        let origin = self.to_pixel(anchor);
        let mut margin = Margin::default();
        let mut points = Vec::with_capacity(locs.len());
        for loc in locs {
            let unwrapped = Location::new(
                unwrap_longitude(anchor.longitude, loc.longitude),
                loc.latitude,
            );
            let p = self.to_pixel(unwrapped).sub(origin);
            margin.include(p);
            points.push(p);
        }
        Some(PixelBatch {
            points,
            anchor,
            margin,
        })
    }

    /// Pixel of `loc` relative to `anchor`, unwrapped across the seam.
    pub fn offset(&self, anchor: Location, loc: Location) -> Point {
        let unwrapped = Location::new(
            unwrap_longitude(anchor.longitude, loc.longitude),
            loc.latitude,
        );
        self.to_pixel(unwrapped).sub(self.to_pixel(anchor))
    }

    /// Multiplier turning lengths computed by this projection into lengths at `zoom`.
    pub fn scale_factor(&self, zoom: f64) -> f64 {
        2f64.powf(zoom - self.zoom)
    }
}

/// Shifts `longitude` by whole turns so it lies within 180 degrees of `reference`. Values
/// already in range are returned as is, as is non-finite input; a shifted value that ends up
/// exactly half a turn away lands on the east side.
pub fn unwrap_longitude(reference: f64, longitude: f64) -> f64 {
    let delta = longitude - reference;
    if !delta.is_finite() || delta.abs() <= 180.0 {
        return longitude;
    }
    let turned = delta.rem_euclid(360.0);
    reference + if turned > 180.0 { turned - 360.0 } else { turned }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_longitude_picks_shorter_side() {
        assert_eq!(unwrap_longitude(179.0, -179.0), 181.0);
        assert_eq!(unwrap_longitude(-179.0, 179.0), -181.0);
        assert_eq!(unwrap_longitude(10.0, 20.0), 20.0);
        assert_eq!(unwrap_longitude(0.0, 540.0), 180.0);
        assert_eq!(unwrap_longitude(0.0, -540.0), 180.0);
        assert_eq!(unwrap_longitude(170.0, -190.0), 170.0);
    }

    #[test]
    fn unwrap_longitude_returns_for_huge_and_non_finite_input() {
        let huge = unwrap_longitude(0.0, 1e20);
        assert!((-180.0..=180.0).contains(&huge));
        assert!(unwrap_longitude(10.0, f64::NAN).is_nan());
        assert_eq!(unwrap_longitude(0.0, f64::INFINITY), f64::INFINITY);
        assert_eq!(unwrap_longitude(0.0, f64::NEG_INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn pixel_round_trips_through_inverse() {
        let p = Projection::at_zoom(3.0);
        let loc = Location::new(-73.98, 40.75);
        let back = p.from_pixel(p.to_pixel(loc));
        assert!((back.longitude - loc.longitude).abs() < 1e-9);
        assert!((back.latitude - loc.latitude).abs() < 1e-9);
    }
}
