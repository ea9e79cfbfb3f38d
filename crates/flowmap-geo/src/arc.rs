//! Great-circle interpolation.

use crate::location::Location;
use crate::projection::unwrap_longitude;

const MIN_SEGMENTS: usize = 10;
/// Angular length covered by one segment, in degrees.
const DEGREES_PER_SEGMENT: f64 = 2.0;

/// Number of segments for the arc between `a` and `b`: one per two degrees of arc, at least ten.
pub fn segment_count(a: Location, b: Location) -> usize {
    let degrees = central_angle(a, b).to_degrees();
    let n = (degrees / DEGREES_PER_SEGMENT).ceil();
    if n.is_finite() && n > MIN_SEGMENTS as f64 {
        n as usize
    } else {
        MIN_SEGMENTS
    }
}

/// `segments + 1` points along the great circle from `a` to `b`, endpoints included.
///
/// The two weights of every interior point are computed from integer step counts, so
/// `arc(b, a, n)` is exactly `arc(a, b, n)` reversed.
pub fn arc(a: Location, b: Location, segments: usize) -> Vec<Location> {
    let n = segments.max(1);
    let va = to_unit(a);
    let vb = to_unit(b);
    let omega = dot(va, vb).clamp(-1.0, 1.0).acos();
    let sin_omega = omega.sin();

    let mut out = Vec::with_capacity(n + 1);
    out.push(a);
    for i in 1..n {
        let ta = (n - i) as f64 / n as f64;
        let tb = i as f64 / n as f64;
        if sin_omega.abs() < 1e-9 {
            // Coincident or antipodal: the great circle is not unique.
            out.push(lerp(a, b, ta, tb));
            continue;
        }
        let wa = (ta * omega).sin() / sin_omega;
        let wb = (tb * omega).sin() / sin_omega;
        let v = [
            wa * va[0] + wb * vb[0],
            wa * va[1] + wb * vb[1],
            wa * va[2] + wb * vb[2],
        ];
        out.push(from_unit(v));
    }
    out.push(b);
    out
}

fn central_angle(a: Location, b: Location) -> f64 {
    dot(to_unit(a), to_unit(b)).clamp(-1.0, 1.0).acos()
}

fn to_unit(loc: Location) -> [f64; 3] {
    let lon = loc.longitude.to_radians();
    let lat = loc.latitude.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_unit(v: [f64; 3]) -> Location {
    let lon = v[1].atan2(v[0]).to_degrees();
    let lat = v[2].atan2(v[0].hypot(v[1])).to_degrees();
    Location::new(lon, lat)
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn lerp(a: Location, b: Location, ta: f64, tb: f64) -> Location {
    let b_lon = unwrap_longitude(a.longitude, b.longitude);
    Location::new(
        ta * a.longitude + tb * b_lon,
        ta * a.latitude + tb * b.latitude,
    )
}
