//! SVG path data assembly.
//!
//! Coordinates are written with at most three fractional digits and without trailing zeros,
//! so identical geometry always yields byte-identical `d` strings.

use crate::location::Point;
use std::fmt::Write as _;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathData {
    out: String,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.command('M');
        self.pair(p);
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.command('L');
        self.pair(p);
        self
    }

    pub fn quad_to(&mut self, ctrl: Point, p: Point) -> &mut Self {
        self.command('Q');
        self.pair(ctrl);
        self.out.push(' ');
        self.pair(p);
        self
    }

    /// Elliptical arc with equal radii, no x-axis rotation.
    pub fn arc_to(&mut self, radius: f64, large: bool, sweep: bool, p: Point) -> &mut Self {
        self.command('A');
        fmt_path_into(&mut self.out, radius);
        self.out.push(',');
        fmt_path_into(&mut self.out, radius);
        let _ = write!(
            &mut self.out,
            " 0 {} {} ",
            u8::from(large),
            u8::from(sweep)
        );
        self.pair(p);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.out.push('Z');
        self
    }

    pub fn polyline(points: &[Point]) -> Self {
        let mut d = Self::new();
        for (i, p) in points.iter().copied().enumerate() {
            if i == 0 {
                d.move_to(p);
            } else {
                d.line_to(p);
            }
        }
        d
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn command(&mut self, c: char) {
        self.out.push(c);
    }

    fn pair(&mut self, p: Point) {
        fmt_path_into(&mut self.out, p.x);
        self.out.push(',');
        fmt_path_into(&mut self.out, p.y);
    }
}

pub fn fmt_path(v: f64) -> String {
    let mut out = String::new();
    fmt_path_into(&mut out, v);
    out
}

pub fn fmt_path_into(out: &mut String, v: f64) {
    // Round half up at three decimals.
    if !v.is_finite() || v.abs() < 0.0005 {
        out.push('0');
        return;
    }

    let scaled = v * 1000.0;
    let k = (scaled + 0.5).floor() as i64;
    if k == 0 {
        out.push('0');
        return;
    }

    let neg = k.is_negative();
    let abs = k.unsigned_abs();
    let int_part = abs / 1000;
    let frac = abs % 1000;

    if neg {
        out.push('-');
    }
    let _ = write!(out, "{int_part}");
    if frac == 0 {
        return;
    }

    let digits = [
        b'0' + (frac / 100) as u8,
        b'0' + ((frac / 10) % 10) as u8,
        b'0' + (frac % 10) as u8,
    ];
    let mut end = 3usize;
    while end > 0 && digits[end - 1] == b'0' {
        end -= 1;
    }
    out.push('.');
    for &b in &digits[..end] {
        out.push(b as char);
    }
}
