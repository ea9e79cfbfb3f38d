//! Aggregate bubbles at origins and destinations.

use crate::context::Context;
use crate::event::Event;
use crate::format::BubbleFor;
use crate::model::Row;
use crate::visual::HighlightState;
use flowmap_geo::{Location, PathData, Point};
use indexmap::IndexMap;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PieKind {
    /// Rows leaving the address.
    Out,
    /// Rows arriving at the address.
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    /// Color key, or the color itself for smooth encodings.
    pub key: String,
    pub color: String,
    pub rows: Vec<Row>,
    pub weight: f64,
    /// Radians, clockwise on screen, 12 o'clock is `-PI / 2`.
    pub start_angle: f64,
    pub end_angle: f64,
    /// Relative to the pie center.
    pub d: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pie {
    pub addr: String,
    pub kind: PieKind,
    pub location: Location,
    pub rows: Vec<Row>,
    pub total: f64,
    pub radius: f64,
    /// Flat fill used when there are no wedges.
    pub fill: String,
    pub wedges: Vec<Wedge>,
    pub state: HighlightState,
}

pub const MIN_RADIUS: f64 = 4.0;

/// Slider value up to which the largest radius grows gently.
const SLIDER_KNEE: f64 = 70.0;
const SLIDER_MAX: f64 = 100.0;
const KNEE_RADIUS: f64 = 20.0;
const TOP_RADIUS: f64 = 60.0;

/// Steepness and midpoint of the logistic transfer curve.
const SIGMOID_SPAN: f64 = 4.0;
const SIGMOID_LEN: f64 = 0.5;

/// Count spread up to which unweighted pies grow linearly.
const LINEAR_COUNT_SPAN: f64 = 10.0;

/// Largest pie radius for a size slider value in `0..=100`.
pub fn max_radius(slider: f64) -> f64 {
    let s = slider.clamp(0.0, SLIDER_MAX);
    if s <= SLIDER_KNEE {
        MIN_RADIUS + (KNEE_RADIUS - MIN_RADIUS) * s / SLIDER_KNEE
    } else {
        KNEE_RADIUS + (TOP_RADIUS - KNEE_RADIUS) * (s - SLIDER_KNEE) / (SLIDER_MAX - SLIDER_KNEE)
    }
}

fn sigmoid(t: f64) -> f64 {
    1.0 / (1.0 + (-SIGMOID_SPAN * (t - SIGMOID_LEN)).exp())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusCurve {
    /// Weighted totals, spread through a logistic curve.
    Sigmoid,
    /// Row counts with a small spread.
    Linear,
    /// Row counts with a wide spread.
    Sqrt,
}

/// Pie total to pixel radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    pub domain: (f64, f64),
    pub max: f64,
    pub curve: RadiusCurve,
}

impl RadiusScale {
    pub fn new(domain: (f64, f64), slider: f64, weighted: bool) -> Self {
        let curve = if weighted {
            RadiusCurve::Sigmoid
        } else if domain.1 - domain.0 <= LINEAR_COUNT_SPAN {
            RadiusCurve::Linear
        } else {
            RadiusCurve::Sqrt
        };
        Self {
            domain,
            max: max_radius(slider),
            curve,
        }
    }

    pub fn apply(&self, total: f64) -> f64 {
        let (lo, hi) = self.domain;
        let t = if hi > lo {
            ((total - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let n = match self.curve {
            RadiusCurve::Linear => t,
            RadiusCurve::Sqrt => {
                let (a, b) = (lo.max(0.0).sqrt(), hi.max(0.0).sqrt());
                if b > a {
                    ((total.max(0.0).sqrt() - a) / (b - a)).clamp(0.0, 1.0)
                } else {
                    1.0
                }
            }
            RadiusCurve::Sigmoid => {
                let (g0, g1) = (sigmoid(0.0), sigmoid(1.0));
                (sigmoid(t) - g0) / (g1 - g0)
            }
        };
        MIN_RADIUS + (self.max - MIN_RADIUS) * n
    }
}

#[derive(Debug, Clone, Default)]
pub struct PieEngine {
    pies: IndexMap<(String, PieKind), Pie>,
    scale: Option<RadiusScale>,
}

impl PieEngine {
    /// Rebuilds every pie from `rows`, which should be the valid rows of rendered groups.
    pub fn reset(&mut self, ctx: &Context, rows: impl IntoIterator<Item = Row>) -> Event {
        self.pies.clear();
        let kinds: &[PieKind] = match ctx.format.bubble.for_ {
            BubbleFor::None => &[],
            BubbleFor::Out => &[PieKind::Out],
            BubbleFor::In => &[PieKind::In],
            BubbleFor::Both => &[PieKind::Out, PieKind::In],
        };
        let mut members: IndexMap<(String, PieKind), Vec<Row>> = IndexMap::new();
        for row in rows {
            for &kind in kinds {
                let addr = match kind {
                    PieKind::Out => ctx.rows.source(row),
                    PieKind::In => ctx.rows.target(row),
                };
                members.entry((addr.to_string(), kind)).or_default().push(row);
            }
        }
        for ((addr, kind), rows) in members {
            let Some(location) = ctx.locations.get(&addr) else {
                continue;
            };
            let total = rows.iter().map(|&r| ctx.weight(r)).sum();
            self.pies.insert(
                (addr.clone(), kind),
                Pie {
                    addr,
                    kind,
                    location,
                    rows,
                    total,
                    radius: MIN_RADIUS,
                    fill: ctx.format.color.default.clone(),
                    wedges: Vec::new(),
                    state: HighlightState::Full,
                },
            );
        }
        debug!(pies = self.pies.len(), "pies reset");
        self.resize(ctx);
        self.recolor(ctx);
        self.highlight(ctx);
        Event::PieChanged {
            pies: self.pies.keys().cloned().collect(),
        }
    }

    /// Recomputes radii after a size slider or weight change.
    pub fn resize(&mut self, ctx: &Context) {
        let domain = self.pies.values().fold(None, |acc, p| match acc {
            None => Some((p.total, p.total)),
            Some((lo, hi)) => Some((f64::min(lo, p.total), f64::max(hi, p.total))),
        });
        let Some(domain) = domain else {
            self.scale = None;
            return;
        };
        let scale = RadiusScale::new(domain, ctx.format.bubble.scale, ctx.rows.has_weight());
        for pie in self.pies.values_mut() {
            pie.radius = scale.apply(pie.total);
            if !pie.wedges.is_empty() {
                pie.wedges = wedges(pie.radius, pie.total, slices(ctx, &pie.rows));
            }
        }
        self.scale = Some(scale);
    }

    /// Recomputes fills and wedges from the current color scale.
    pub fn recolor(&mut self, ctx: &Context) {
        for pie in self.pies.values_mut() {
            let parts = slices(ctx, &pie.rows);
            let colored = parts.iter().filter(|s| s.weight > 0.0).count();
            if ctx.format.bubble.slice && colored > 1 {
                pie.wedges = wedges(pie.radius, pie.total, parts);
                pie.fill = ctx.format.color.default.clone();
            } else {
                pie.wedges.clear();
                pie.fill = parts
                    .into_iter()
                    .max_by(|a, b| a.weight.total_cmp(&b.weight))
                    .map_or_else(|| ctx.format.color.default.clone(), |s| s.color);
            }
        }
    }

    pub fn highlight(&mut self, ctx: &Context) {
        for pie in self.pies.values_mut() {
            let selected = pie.rows.iter().filter(|&&r| ctx.is_selected(r)).count();
            pie.state = if !ctx.has_selection() || selected == pie.rows.len() {
                HighlightState::Full
            } else if selected == 0 {
                HighlightState::Empty
            } else {
                HighlightState::Part
            };
        }
    }

    pub fn clear(&mut self) {
        self.pies.clear();
        self.scale = None;
    }

    pub fn pies(&self) -> impl Iterator<Item = &Pie> {
        self.pies.values()
    }

    pub fn get(&self, addr: &str, kind: PieKind) -> Option<&Pie> {
        self.pies.get(&(addr.to_string(), kind))
    }

    pub fn scale(&self) -> Option<&RadiusScale> {
        self.scale.as_ref()
    }

    pub fn len(&self) -> usize {
        self.pies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pies.is_empty()
    }
}

struct Slice {
    key: String,
    color: String,
    rows: Vec<Row>,
    weight: f64,
}

/// Rows of a pie grouped by color, in first-seen order.
fn slices(ctx: &Context, rows: &[Row]) -> Vec<Slice> {
    let mut out: IndexMap<String, Slice> = IndexMap::new();
    for &row in rows {
        let color = ctx.row_color(row);
        let key = ctx
            .rows
            .color_key(row)
            .map_or_else(|| color.clone(), str::to_string);
        let slice = out.entry(key.clone()).or_insert_with(|| Slice {
            key,
            color,
            rows: Vec::new(),
            weight: 0.0,
        });
        slice.rows.push(row);
        slice.weight += ctx.weight(row);
    }
    out.into_values().collect()
}

fn polar(radius: f64, angle: f64) -> Point {
    Point::new(radius * angle.cos(), radius * angle.sin())
}

fn wedges(radius: f64, total: f64, slices: Vec<Slice>) -> Vec<Wedge> {
    if total <= 0.0 {
        return Vec::new();
    }
    let mut angle = -FRAC_PI_2;
    let mut out = Vec::with_capacity(slices.len());
    for s in slices.into_iter().filter(|s| s.weight > 0.0) {
        let start = angle;
        let end = start + s.weight / total * TAU;
        angle = end;
        let mut d = PathData::new();
        d.move_to(Point::default())
            .line_to(polar(radius, start))
            .arc_to(radius, end - start > std::f64::consts::PI, true, polar(radius, end))
            .close();
        out.push(Wedge {
            key: s.key,
            color: s.color,
            rows: s.rows,
            weight: s.weight,
            start_angle: start,
            end_angle: end,
            d: d.finish(),
        });
    }
    out
}
