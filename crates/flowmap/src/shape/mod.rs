//! Geometry of one flow group, in reference-zoom pixels relative to the hub.
//!
//! The variant is picked once when the group is built and never re-dispatched.

mod flow;
mod line;

pub use flow::FlowShape;
pub use line::LineShape;

use crate::format::StyleKind;
use crate::model::{Path, PathId, Row};
use crate::view::{GroupTransform, MapView};
use flowmap_geo::{Bound, Location, Projection};
use rustc_hash::FxHashSet;

/// One far end of a group: the row and where its leaf address sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub row: Row,
    pub location: Location,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub enum Shape {
    Straight(LineShape),
    Arc(LineShape),
    Flow(FlowShape),
}

impl Shape {
    /// `None` when there is nothing to draw.
    pub fn build(
        style: StyleKind,
        hub: Location,
        targets: &[Target],
        projection: &Projection,
    ) -> Option<Self> {
        if targets.is_empty() {
            return None;
        }
        Some(match style {
            StyleKind::Straight => Self::Straight(LineShape::straight(hub, targets, projection)),
            StyleKind::Arc => Self::Arc(LineShape::arc(hub, targets, projection)),
            StyleKind::Flow => Self::Flow(FlowShape::new(hub, targets, projection)),
        })
    }

    pub fn style(&self) -> StyleKind {
        match self {
            Self::Straight(_) => StyleKind::Straight,
            Self::Arc(_) => StyleKind::Arc,
            Self::Flow(_) => StyleKind::Flow,
        }
    }

    pub fn anchor(&self) -> Location {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.anchor(),
            Self::Flow(f) => f.anchor(),
        }
    }

    /// Every drawable path, in draw order.
    pub fn paths(&self) -> &[Path] {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.paths(),
            Self::Flow(f) => f.paths(),
        }
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.path(id),
            Self::Flow(f) => f.path(id),
        }
    }

    /// Paths to overdraw so that exactly the selected rows show highlighted.
    pub fn highlight(&self, is_selected: impl Fn(Row) -> bool) -> Vec<Path> {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.highlight(is_selected),
            Self::Flow(f) => f.highlight(is_selected),
        }
    }

    /// Reassigns weights from `weight`; flow trunks are re-summed.
    pub fn reweight(&mut self, weight: impl Fn(Row) -> f64) {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.reweight(weight),
            Self::Flow(f) => f.reweight(weight),
        }
    }

    pub fn rewidth(&mut self, width: impl Fn(&Path) -> f64) {
        let paths = match self {
            Self::Straight(s) | Self::Arc(s) => s.paths_mut(),
            Self::Flow(f) => f.paths_mut(),
        };
        for path in paths {
            path.width = width(path);
        }
    }

    /// Smallest and largest path weight.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.paths().iter().fold(None, |acc, p| match acc {
            None => Some((p.weight, p.weight)),
            Some((lo, hi)) => Some((lo.min(p.weight), hi.max(p.weight))),
        })
    }

    /// Bound of the whole group, or of the given rows only.
    pub fn bound(&self, rows: Option<&FxHashSet<Row>>) -> Option<Bound> {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.bound(rows),
            Self::Flow(f) => f.bound(rows),
        }
    }

    /// Puts heavy lines first so light ones stay clickable on top. Flow trees keep their
    /// parent-first order.
    pub fn sort(&mut self) {
        match self {
            Self::Straight(s) | Self::Arc(s) => s.sort(),
            Self::Flow(_) => {}
        }
    }

    pub fn transform(&self, view: &MapView, projection: &Projection) -> GroupTransform {
        GroupTransform::new(self.anchor(), view, projection)
    }
}
