use crate::context::Context;
use crate::event::Event;
use crate::model::{PathId, Row};
use crate::timer::{TaskId, Timers};
use crate::view::{GroupTransform, MapView};
use crate::visual::{HOVER_DELAY, LEAVE_DELAY, VisualFlow};
use crate::{Error, Result};
use flowmap_geo::Bound;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
enum HoverTask {
    Announce(Vec<Row>),
    Clear,
}

/// Hover debounce shared by all groups: one pointer, one pending announce, one pending clear.
#[derive(Debug, Clone, Default)]
struct Hover {
    timers: Timers<HoverTask>,
    enter: Option<TaskId>,
    leave: Option<TaskId>,
}

impl Hover {
    fn cancel_pending(&mut self) {
        for task in [self.enter.take(), self.leave.take()].into_iter().flatten() {
            self.timers.cancel(task);
        }
    }

    fn enter(&mut self, rows: Vec<Row>, now: Instant) {
        self.cancel_pending();
        let task = HoverTask::Announce(rows);
        self.enter = Some(self.timers.schedule(now, HOVER_DELAY, task));
    }

    fn leave(&mut self, now: Instant) {
        self.cancel_pending();
        self.leave = Some(self.timers.schedule(now, LEAVE_DELAY, HoverTask::Clear));
    }

    fn poll(&mut self, now: Instant) -> Vec<Event> {
        let mut fired = Vec::new();
        for (id, task) in self.timers.due(now) {
            if self.enter == Some(id) {
                self.enter = None;
            }
            if self.leave == Some(id) {
                self.leave = None;
            }
            fired.push(match task {
                HoverTask::Announce(rows) => Event::Hover { rows: Some(rows) },
                HoverTask::Clear => Event::Hover { rows: None },
            });
        }
        fired
    }
}

/// Every flow group currently admitted for rendering, in draw order.
#[derive(Debug, Clone, Default)]
pub struct FlowCollection {
    flows: IndexMap<String, VisualFlow>,
    hover: Hover,
}

impl FlowCollection {
    /// Admits new groups and builds their geometry. Keys already present are left alone.
    pub fn add(
        &mut self,
        ctx: &Context,
        groups: impl IntoIterator<Item = (String, Vec<Row>)>,
    ) -> Vec<String> {
        let mut added = Vec::new();
        for (key, rows) in groups {
            if self.flows.contains_key(&key) {
                continue;
            }
            let mut flow = VisualFlow::new(key.clone(), rows);
            flow.rebuild(ctx);
            self.flows.insert(key.clone(), flow);
            added.push(key);
        }
        if !added.is_empty() {
            debug!(count = added.len(), "flow groups added");
        }
        added
    }

    pub fn remove<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            if self.flows.shift_remove(key).is_none() {
                warn!(key, "remove of unknown flow group");
            }
        }
    }

    pub fn clear(&mut self) {
        self.flows.clear();
        self.hover = Hover::default();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.flows.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&VisualFlow> {
        self.flows.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisualFlow> {
        self.flows.values()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    fn flow(&self, key: &str) -> Result<&VisualFlow> {
        self.flows.get(key).ok_or_else(|| Error::UnknownGroup {
            key: key.to_string(),
        })
    }

    pub fn rebuild(&mut self, ctx: &Context) {
        for flow in self.flows.values_mut() {
            flow.rebuild(ctx);
        }
    }

    /// Re-sums weights everywhere and folds the global weight extent. Width scales must be
    /// built from this single domain so strokes compare across groups.
    pub fn reweight(&mut self, ctx: &Context) -> Option<(f64, f64)> {
        self.flows
            .values_mut()
            .filter_map(|f| f.reweight(ctx))
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }

    pub fn reformat(&mut self, ctx: &Context, recolor: bool, rewidth: bool) -> Vec<Event> {
        self.flows
            .values_mut()
            .filter_map(|f| f.reformat(ctx, recolor, rewidth))
            .collect()
    }

    pub fn highlight(&mut self, ctx: &Context) -> Vec<Event> {
        self.flows
            .values_mut()
            .filter_map(|f| f.highlight(ctx))
            .collect()
    }

    /// Stable sort by highlight state so full groups draw last.
    pub fn reorder(&mut self) {
        self.flows.sort_by(|_, a, _, b| a.state().cmp(&b.state()));
    }

    /// Non-empty bounds of every group, restricted to `rows` when given.
    pub fn bounds(&self, rows: Option<&FxHashSet<Row>>) -> Vec<Bound> {
        self.flows.values().filter_map(|f| f.bound(rows)).collect()
    }

    pub fn transforms(&self, ctx: &Context, view: &MapView) -> Vec<(String, GroupTransform)> {
        self.flows
            .iter()
            .filter_map(|(k, f)| Some((k.clone(), f.transform(ctx, view)?)))
            .collect()
    }

    /// The pointer entered path `id` of group `key`; announced after [`HOVER_DELAY`] unless
    /// the pointer moves on. Cancels a pending clear from any group.
    pub fn hover_enter(&mut self, key: &str, id: PathId, now: Instant) -> Result<()> {
        let rows = self.flow(key)?.leafs_of(id)?;
        self.hover.enter(rows, now);
        Ok(())
    }

    pub fn hover_leave(&mut self, key: &str, now: Instant) -> Result<()> {
        self.flow(key)?;
        self.hover.leave(now);
        Ok(())
    }

    pub fn click(&self, key: &str, id: PathId) -> Result<Event> {
        self.flow(key)?.click(id)
    }

    /// Fires hover timers that are due.
    pub fn poll(&mut self, now: Instant) -> Vec<Event> {
        self.hover.poll(now)
    }
}
