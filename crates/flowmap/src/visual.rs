//! One flow group on screen.

use crate::context::Context;
use crate::event::Event;
use crate::model::{Path, PathId, Row};
use crate::shape::{Shape, Target};
use crate::view::{GroupTransform, MapView};
use crate::{Error, Result};
use flowmap_geo::Bound;
use rustc_hash::FxHashSet;
use std::time::Duration;
use tracing::trace;

/// Delay before a hovered path is announced; sweeping across thin slivers stays quiet.
pub const HOVER_DELAY: Duration = Duration::from_millis(300);
/// Delay before a hover is cleared; a new hover inside it cancels the clear.
pub const LEAVE_DELAY: Duration = Duration::from_millis(100);

/// Ordered so that sorting ascending draws fully highlighted groups last, on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum HighlightState {
    #[default]
    Empty,
    Part,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnPath {
    pub id: PathId,
    pub leafs: Vec<Row>,
    pub d: String,
    pub stroke: String,
    /// Screen pixels; divide by the group scale when drawing inside the transformed group.
    pub width: f64,
    pub opacity: f64,
}

/// What the adapter draws for one group: every path, plus highlighted overdraw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub base: Vec<DrawnPath>,
    pub extra: Vec<DrawnPath>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.extra.is_empty()
    }

    fn ids(&self) -> Vec<PathId> {
        self.base.iter().chain(&self.extra).map(|p| p.id).collect()
    }
}

#[derive(Debug, Clone)]
pub struct VisualFlow {
    key: String,
    rows: Vec<Row>,
    shape: Option<Shape>,
    state: HighlightState,
    /// Overdraw paths while partially highlighted.
    extra: Vec<Path>,
    scene: Scene,
}

impl VisualFlow {
    pub fn new(key: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            key: key.into(),
            rows,
            shape: None,
            state: HighlightState::Empty,
            extra: Vec::new(),
            scene: Scene::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Every member row, valid or not.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn state(&self) -> HighlightState {
        self.state
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn valid_rows<'a>(&'a self, ctx: &'a Context) -> impl Iterator<Item = Row> + 'a {
        self.rows.iter().copied().filter(|&r| ctx.is_valid(r))
    }

    /// Rebuilds geometry from the current locations. Skipped in relocate mode; an unresolved
    /// hub leaves the group without a shape.
    pub fn rebuild(&mut self, ctx: &Context) {
        if ctx.format.advance.relocate {
            return;
        }
        let Some(hub) = self.rows.first().and_then(|&r| ctx.hub_location(r)) else {
            self.shape = None;
            return;
        };
        let targets: Vec<Target> = self
            .valid_rows(ctx)
            .filter_map(|row| {
                Some(Target {
                    row,
                    location: ctx.leaf_location(row)?,
                    weight: ctx.weight(row),
                })
            })
            .collect();
        self.shape = Shape::build(ctx.style, hub, &targets, &ctx.projection);
        if let Some(shape) = &mut self.shape {
            shape.sort();
        }
        let paths = self.shape.as_ref().map_or(0, |s| s.paths().len());
        trace!(key = %self.key, paths, "flow rebuilt");
    }

    /// Re-sums weights and returns the group's weight extent.
    pub fn reweight(&mut self, ctx: &Context) -> Option<(f64, f64)> {
        let shape = self.shape.as_mut()?;
        shape.reweight(|row| ctx.weight(row));
        shape.extent()
    }

    /// Applies new widths and/or colors. Colors are read at draw time, so recoloring is a
    /// plain redraw.
    pub fn reformat(&mut self, ctx: &Context, recolor: bool, rewidth: bool) -> Option<Event> {
        if rewidth {
            if let Some(shape) = &mut self.shape {
                shape.rewidth(|p| ctx.path_width(p));
            }
            for path in &mut self.extra {
                path.width = ctx.path_width(path);
            }
        }
        if recolor || rewidth {
            self.redraw(ctx)
        } else {
            None
        }
    }

    /// Recomputes the highlight state against the current selection.
    pub fn highlight(&mut self, ctx: &Context) -> Option<Event> {
        self.state = self.compute_state(ctx);
        self.extra = match (&self.shape, self.state) {
            (Some(shape), HighlightState::Part) => shape.highlight(|r| ctx.is_selected(r)),
            _ => Vec::new(),
        };
        self.redraw(ctx)
    }

    fn compute_state(&self, ctx: &Context) -> HighlightState {
        if self.shape.is_none() {
            return HighlightState::Empty;
        }
        let mut valid = 0;
        let mut selected = 0;
        for row in self.valid_rows(ctx) {
            valid += 1;
            if ctx.is_selected(row) {
                selected += 1;
            }
        }
        if valid == 0 {
            HighlightState::Empty
        } else if !ctx.has_selection() || selected == valid {
            HighlightState::Full
        } else if selected == 0 {
            HighlightState::Empty
        } else {
            HighlightState::Part
        }
    }

    /// Regenerates the scene; reports the new path set if it changed.
    fn redraw(&mut self, ctx: &Context) -> Option<Event> {
        let before = self.scene.ids();
        let base_opacity = if self.state == HighlightState::Full {
            1.0
        } else {
            ctx.format.color.dim
        };
        let draw = |p: &Path, opacity: f64| DrawnPath {
            id: p.id,
            leafs: p.leafs.clone(),
            d: p.d.clone(),
            stroke: ctx.path_color(p),
            width: p.width,
            opacity,
        };
        self.scene = match &self.shape {
            Some(shape) => Scene {
                base: shape.paths().iter().map(|p| draw(p, base_opacity)).collect(),
                extra: self.extra.iter().map(|p| draw(p, 1.0)).collect(),
            },
            None => Scene::default(),
        };
        let after = self.scene.ids();
        (before != after).then(|| Event::PathChanged {
            key: self.key.clone(),
            paths: after,
        })
    }

    pub fn bound(&self, rows: Option<&FxHashSet<Row>>) -> Option<Bound> {
        self.shape.as_ref()?.bound(rows)
    }

    pub fn transform(&self, ctx: &Context, view: &MapView) -> Option<GroupTransform> {
        Some(self.shape.as_ref()?.transform(view, &ctx.projection))
    }

    /// Rows underlying path `id`, from the base paths or the highlight overdraw.
    pub fn leafs_of(&self, id: PathId) -> Result<Vec<Row>> {
        self.shape
            .as_ref()
            .and_then(|s| s.path(id))
            .or_else(|| self.extra.iter().find(|p| p.id == id))
            .map(|p| p.leafs.clone())
            .ok_or_else(|| Error::UnknownPath {
                key: self.key.clone(),
            })
    }

    pub fn click(&self, id: PathId) -> Result<Event> {
        Ok(Event::Click {
            rows: self.leafs_of(id)?,
        })
    }
}
