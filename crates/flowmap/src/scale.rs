//! Color and width encodings as explicit value objects.

use crate::format::{ColorFormat, WidthFormat, WidthScaleKind};
use crate::rows::RowSource;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` or `#rgb`.
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        match hex.len() {
            6 => Some(Self(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
            3 => {
                let (r, g, b) = (digit(0, 1)?, digit(1, 1)?, digit(2, 1)?);
                Some(Self(r * 17, g * 17, b * 17))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    Single(String),
    /// Keys get palette colors in the order they are first seen.
    Categorical {
        mapping: IndexMap<String, String>,
        fallback: String,
    },
    Smooth {
        domain: (f64, f64),
        range: (Rgb, Rgb),
        fallback: String,
    },
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::Single(ColorFormat::default().default)
    }
}

impl ColorScale {
    pub fn build(rows: &dyn RowSource, format: &ColorFormat) -> Self {
        let fallback = format.default.clone();
        if rows.has_color_value() {
            let mut domain: Option<(f64, f64)> = None;
            for row in 0..rows.len() {
                if let Some(v) = rows.color_value(row).filter(|v| v.is_finite()) {
                    domain = Some(match domain {
                        None => (v, v),
                        Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    });
                }
            }
            let lo = Rgb::parse(&format.min).unwrap_or(Rgb(0xfe, 0xe0, 0xd2));
            let hi = Rgb::parse(&format.max).unwrap_or(Rgb(0xde, 0x2d, 0x26));
            return Self::Smooth {
                domain: domain.unwrap_or((0.0, 0.0)),
                range: (lo, hi),
                fallback,
            };
        }

        let mut mapping: IndexMap<String, String> = IndexMap::new();
        for row in 0..rows.len() {
            let Some(key) = rows.color_key(row) else {
                continue;
            };
            if mapping.contains_key(key) {
                continue;
            }
            let color = if format.palette.is_empty() {
                fallback.clone()
            } else {
                format.palette[mapping.len() % format.palette.len()].clone()
            };
            mapping.insert(key.to_string(), color);
        }
        if mapping.is_empty() {
            Self::Single(fallback)
        } else {
            Self::Categorical { mapping, fallback }
        }
    }

    pub fn is_smooth(&self) -> bool {
        matches!(self, Self::Smooth { .. })
    }

    pub fn color(&self, key: Option<&str>, value: Option<f64>) -> String {
        match self {
            Self::Single(c) => c.clone(),
            Self::Categorical { mapping, fallback } => key
                .and_then(|k| mapping.get(k))
                .unwrap_or(fallback)
                .clone(),
            Self::Smooth {
                domain: (lo, hi),
                range: (from, to),
                fallback,
            } => match value {
                Some(v) if v.is_finite() => {
                    let t = if hi > lo { (v - lo) / (hi - lo) } else { 1.0 };
                    from.lerp(*to, t).to_hex()
                }
                _ => fallback.clone(),
            },
        }
    }
}

/// Continuous power scale from weight to pixels, clamped to its domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    domain: (f64, f64),
    range: (f64, f64),
    exponent: f64,
}

/// The log option searches exponents from 0.1 upwards in steps of 0.1, at most five tries,
/// and keeps the first one under which a mid-domain weight stays this fraction of the pixel
/// range below the widest stroke. A heuristic, not an optimum.
const LOG_START_EXPONENT: f64 = 0.1;
const LOG_EXPONENT_STEP: f64 = 0.1;
const LOG_MAX_TRIES: usize = 5;
const LOG_MIN_SPREAD: f64 = 0.2;

impl PowScale {
    pub fn new(domain: (f64, f64), range: (f64, f64), exponent: f64) -> Self {
        Self {
            domain: (domain.0.max(0.0), domain.1.max(0.0)),
            range,
            exponent,
        }
    }

    pub fn linear(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self::new(domain, range, 1.0)
    }

    pub fn sqrt(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self::new(domain, range, 0.5)
    }

    pub fn log(domain: (f64, f64), range: (f64, f64)) -> Self {
        let mid = (domain.0 + domain.1) / 2.0;
        let mut scale = Self::new(domain, range, LOG_START_EXPONENT);
        for i in 0..LOG_MAX_TRIES {
            scale = Self::new(domain, range, LOG_START_EXPONENT + LOG_EXPONENT_STEP * i as f64);
            if range.1 - scale.apply(mid) >= LOG_MIN_SPREAD * (range.1 - range.0) {
                break;
            }
        }
        scale
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn apply(&self, weight: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 <= d0 {
            return r1;
        }
        let e = self.exponent;
        let t = (weight.max(0.0).powf(e) - d0.powf(e)) / (d1.powf(e) - d0.powf(e));
        r0 + t.clamp(0.0, 1.0) * (r1 - r0)
    }

    pub fn invert(&self, pixels: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 <= d0 || r1 == r0 {
            return d1;
        }
        let e = self.exponent;
        let t = ((pixels - r0) / (r1 - r0)).clamp(0.0, 1.0);
        (d0.powf(e) + t * (d1.powf(e) - d0.powf(e))).powf(1.0 / e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidthScale {
    /// No weight bound: every stroke has the same width.
    Fixed(f64),
    /// The host supplies a width per row; `fallback` covers rows without one.
    PerRow { fallback: f64 },
    Scaled(PowScale),
}

impl Default for WidthScale {
    fn default() -> Self {
        Self::Fixed(WidthFormat::default().fixed)
    }
}

impl WidthScale {
    /// `domain` is the global weight extent across every drawn path.
    pub fn build(rows: &dyn RowSource, format: &WidthFormat, domain: Option<(f64, f64)>) -> Self {
        if rows.has_width_value() {
            return Self::PerRow {
                fallback: format.fixed,
            };
        }
        let Some(domain) = domain.filter(|_| rows.has_weight()) else {
            return Self::Fixed(format.fixed);
        };
        let range = (format.min, format.max);
        Self::Scaled(match format.scale {
            WidthScaleKind::Linear => PowScale::linear(domain, range),
            WidthScaleKind::Sqrt => PowScale::sqrt(domain, range),
            WidthScaleKind::Log => PowScale::log(domain, range),
        })
    }
}
