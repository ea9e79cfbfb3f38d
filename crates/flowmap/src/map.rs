//! The engine facade: owns every component and decides how much to recompute on a change.

use crate::Result;
use crate::collection::FlowCollection;
use crate::context::Context;
use crate::event::Event;
use crate::format::{Format, FormatDirty, StyleKind};
use crate::geocode::{GeocodeQueue, GeocodeRequest, Step, Ticket};
use crate::grouping::desired_flows;
use crate::legend::{Legend, legend};
use crate::location::LocationTable;
use crate::marks::Marks;
use crate::model::{IssueTable, PathId, Row};
use crate::pie::PieEngine;
use crate::rows::RowSource;
use crate::scale::{ColorScale, WidthScale};
use crate::tooltip::{TooltipItem, tooltip};
use crate::view::{GroupTransform, MapView};
use flowmap_geo::{Location, View, fit_view};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Format paths whose change regroups every row.
const RESET_PATHS: &[&str] = &[
    "style.type",
    "style.direction",
    "advance.relocate",
    "advance.geocode",
];

pub struct FlowMap {
    ctx: Context,
    flows: FlowCollection,
    pies: PieEngine,
    marks: Marks,
    /// `None` while no geocoding is in progress. Replies arriving then are dropped.
    queue: Option<GeocodeQueue>,
    /// Request issued by the queue but not yet handed to the host.
    request: Option<GeocodeRequest>,
    /// First ticket of the next queue.
    tickets: Ticket,
    events: Vec<Event>,
    view: Option<MapView>,
}

impl FlowMap {
    pub fn new(format: Format) -> Self {
        Self {
            ctx: Context::new(format),
            flows: FlowCollection::default(),
            pies: PieEngine::default(),
            marks: Marks::default(),
            queue: None,
            request: None,
            tickets: 0,
            events: Vec::new(),
            view: None,
        }
    }

    /// Builds an engine from a (partial) JSON format.
    pub fn from_json(format: &Value) -> Result<Self> {
        Ok(Self::new(Format::from_value(format)?))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn format(&self) -> &Format {
        &self.ctx.format
    }

    /// Style in effect after auto selection.
    pub fn style(&self) -> StyleKind {
        self.ctx.style
    }

    pub fn flows(&self) -> &FlowCollection {
        &self.flows
    }

    pub fn pies(&self) -> &PieEngine {
        &self.pies
    }

    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    pub fn issues(&self) -> &IssueTable {
        &self.ctx.issues
    }

    pub fn locations(&self) -> &LocationTable {
        &self.ctx.locations
    }

    /// For injecting known locations. Takes effect on the next [`FlowMap::reset`].
    pub fn locations_mut(&mut self) -> &mut LocationTable {
        &mut self.ctx.locations
    }

    /// Rebuilds everything for a new row set.
    pub fn reset(&mut self, rows: Arc<dyn RowSource + Send + Sync>) {
        let current: Vec<String> = self.flows.keys().map(str::to_string).collect();
        self.ctx.rows = rows;
        self.cancel_geocode();
        self.flows.clear();
        self.pies.clear();
        self.marks.clear();
        self.ctx.issues.clear();
        self.ctx.color = ColorScale::build(self.ctx.rows.as_ref(), &self.ctx.format.color);
        self.ctx.width = WidthScale::default();

        let grouping = desired_flows(&self.ctx, &current);
        self.ctx.style = grouping.style;
        debug!(
            rows = self.ctx.rows.len(),
            groups = grouping.groups.len(),
            style = ?grouping.style,
            "reset"
        );
        self.events.push(self.pies.reset(&self.ctx, std::iter::empty()));
        self.enqueue(grouping.groups);
    }

    /// Applies a partial format change and recomputes only what it invalidates.
    pub fn reformat(&mut self, delta: &Value) -> Result<()> {
        let next = self.ctx.format.merged(delta)?;
        let dirty = FormatDirty::between(&self.ctx.format, &next)?;
        if dirty.is_empty() {
            return Ok(());
        }
        self.ctx.format = next;

        if RESET_PATHS.iter().any(|p| dirty.has(p)) {
            let rows = Arc::clone(&self.ctx.rows);
            self.reset(rows);
            return Ok(());
        }
        if dirty.has("style.limit") {
            self.reconcile();
        }

        let recolor = dirty.section("color");
        let rewidth = dirty.section("width");
        if recolor {
            self.ctx.color = ColorScale::build(self.ctx.rows.as_ref(), &self.ctx.format.color);
        }
        if rewidth {
            let extent = self.flows.reweight(&self.ctx);
            self.ctx.width =
                WidthScale::build(self.ctx.rows.as_ref(), &self.ctx.format.width, extent);
        }
        self.events
            .extend(self.flows.reformat(&self.ctx, recolor, rewidth));

        if dirty.has("bubble.for") {
            self.reset_pies();
        } else {
            if dirty.has("bubble.scale") {
                self.pies.resize(&self.ctx);
            }
            if recolor || dirty.has("bubble.slice") {
                self.pies.recolor(&self.ctx);
            }
        }
        Ok(())
    }

    /// Adds and removes groups so the rendered set matches the current limit.
    fn reconcile(&mut self) {
        let current: Vec<String> = self
            .flows
            .keys()
            .chain(self.queue.iter().flat_map(|q| q.keys()))
            .map(str::to_string)
            .collect();
        let grouping = desired_flows(&self.ctx, &current);
        if grouping.style != self.ctx.style {
            let rows = Arc::clone(&self.ctx.rows);
            self.reset(rows);
            return;
        }

        let stale: FxHashSet<String> = current
            .into_iter()
            .filter(|k| !grouping.groups.contains_key(k))
            .collect();
        let added: IndexMap<String, Vec<Row>> = grouping
            .groups
            .into_iter()
            .filter(|(k, _)| {
                !self.flows.contains(k) && !self.queue.as_ref().is_some_and(|q| q.contains(k))
            })
            .collect();
        debug!(removed = stale.len(), added = added.len(), "reconcile");

        if let Some(queue) = &mut self.queue {
            queue.remove(&stale);
        }
        let gone: Vec<&str> = stale
            .iter()
            .filter(|k| self.flows.contains(k))
            .map(String::as_str)
            .collect();
        if !gone.is_empty() {
            self.flows.remove(gone);
            self.refresh();
        }
        self.enqueue(added);
    }

    /// Sends groups through geocoding; groups with settled addresses render right away.
    fn enqueue(&mut self, groups: IndexMap<String, Vec<Row>>) {
        if groups.is_empty() {
            return;
        }
        let geocode = self.ctx.format.advance.geocode;
        let queue = self
            .queue
            .get_or_insert_with(|| GeocodeQueue::new(self.tickets));
        for (key, rows) in groups {
            let mut addresses: IndexSet<String> = IndexSet::new();
            for &row in &rows {
                addresses.insert(self.ctx.rows.source(row).to_string());
                addresses.insert(self.ctx.rows.target(row).to_string());
            }
            if !geocode {
                for addr in &addresses {
                    if self.ctx.locations.is_pending(addr) {
                        self.ctx.locations.mark_failed(addr.clone());
                    }
                }
            }
            queue.push(key, rows, addresses, &self.ctx.locations);
        }
        self.pump();
    }

    /// Advances the queue until it needs the geocoder or runs dry.
    fn pump(&mut self) {
        let mut ready = Vec::new();
        while let Some(queue) = self.queue.as_mut() {
            match queue.step(&self.ctx.locations) {
                Step::Ready { key, rows } => ready.push((key, rows)),
                Step::Request(request) => {
                    self.request = Some(request);
                    break;
                }
                Step::Waiting => break,
                Step::Done => {
                    self.drop_queue();
                    break;
                }
            }
        }
        if !ready.is_empty() {
            self.admit(ready);
        }
    }

    fn admit(&mut self, groups: Vec<(String, Vec<Row>)>) {
        for (_, rows) in &groups {
            for &row in rows {
                self.ctx.flag(row);
            }
        }
        self.flows.add(&self.ctx, groups);
        self.refresh();
    }

    /// Rederives widths, pies and highlight after the set of rendered groups changed.
    fn refresh(&mut self) {
        let extent = self.flows.reweight(&self.ctx);
        self.ctx.width = WidthScale::build(self.ctx.rows.as_ref(), &self.ctx.format.width, extent);
        self.events.extend(self.flows.reformat(&self.ctx, true, true));
        self.reset_pies();
        self.events.extend(self.flows.highlight(&self.ctx));
        self.flows.reorder();
    }

    fn reset_pies(&mut self) {
        let rows: Vec<Row> = self
            .flows
            .iter()
            .flat_map(|f| f.valid_rows(&self.ctx))
            .collect();
        self.events.push(self.pies.reset(&self.ctx, rows));
    }

    /// Replaces the selection.
    pub fn select(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.ctx.selection = Some(rows.into_iter().collect());
        self.highlight();
    }

    pub fn clear_selection(&mut self) {
        self.ctx.selection = None;
        self.highlight();
    }

    fn highlight(&mut self) {
        self.events.extend(self.flows.highlight(&self.ctx));
        self.pies.highlight(&self.ctx);
        self.flows.reorder();
    }

    pub fn click(&mut self, key: &str, path: PathId) -> Result<()> {
        let event = self.flows.click(key, path)?;
        self.events.push(event);
        Ok(())
    }

    pub fn hover_enter(&mut self, key: &str, path: PathId, now: Instant) -> Result<()> {
        self.flows.hover_enter(key, path, now)
    }

    pub fn hover_leave(&mut self, key: &str, now: Instant) -> Result<()> {
        self.flows.hover_leave(key, now)
    }

    /// Fires due hover timers.
    pub fn tick(&mut self, now: Instant) {
        let fired = self.flows.poll(now);
        self.events.extend(fired);
    }

    /// The next batch to geocode, handed out once.
    pub fn next_geocode(&mut self) -> Option<GeocodeRequest> {
        self.request.take()
    }

    pub fn on_geocoded(&mut self, ticket: Ticket, results: Vec<(String, Option<Location>)>) {
        let Some(queue) = self.queue.as_mut() else {
            warn!(ticket, "geocode result after cancel");
            return;
        };
        let Some(resolved) = queue.resolve(ticket, results, &mut self.ctx.locations) else {
            return;
        };
        let (sofar, total) = queue.progress();
        self.events.push(Event::GeocodeProgress { sofar, total });
        if !resolved.located.is_empty() {
            self.events.push(Event::LocationsResolved {
                locations: resolved.located,
            });
        }
        if resolved.admit {
            self.admit(vec![(resolved.key, resolved.rows)]);
        }
        self.pump();
    }

    /// Stops geocoding. Groups not yet admitted stay out; late replies are ignored.
    pub fn cancel_geocode(&mut self) {
        if self.queue.is_some() {
            debug!("geocoding canceled");
        }
        self.drop_queue();
    }

    fn drop_queue(&mut self) {
        if let Some(queue) = self.queue.take() {
            self.tickets = queue.next_ticket();
        }
        self.request = None;
    }

    pub fn is_geocoding(&self) -> bool {
        self.queue.is_some()
    }

    pub fn geocode_progress(&self) -> Option<(usize, usize)> {
        self.queue.as_ref().map(GeocodeQueue::progress)
    }

    /// Places `addr` by hand.
    pub fn relocate(&mut self, addr: impl Into<String>, location: Location) {
        self.ctx.locations.set_manual(addr, location);
    }

    pub fn set_view(&mut self, view: MapView) {
        self.view = Some(view);
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    /// Per-group placement for the current view.
    pub fn transforms(&self) -> Vec<(String, GroupTransform)> {
        match &self.view {
            Some(view) => self.flows.transforms(&self.ctx, view),
            None => Vec::new(),
        }
    }

    /// View showing every group, or only the selection when auto-fit is on and rows are
    /// selected.
    pub fn fit(&self) -> Option<View> {
        let view = self.view.as_ref()?;
        let rows = self
            .ctx
            .selection
            .as_ref()
            .filter(|_| self.ctx.format.map_control.auto_fit);
        let bounds = self.flows.bounds(rows);
        fit_view(
            &bounds,
            view.width,
            view.height,
            self.ctx.format.map_control.padding,
        )
    }

    pub fn legend(&self) -> Legend {
        legend(&self.ctx, &self.pies)
    }

    pub fn tooltip(&self, rows: &[Row]) -> Vec<TooltipItem> {
        tooltip(&self.ctx, rows)
    }

    /// Pins or unpins the marker label of `addr`. No-op while pins are turned off.
    pub fn toggle_mark(&mut self, addr: &str) {
        if !self.ctx.format.map_element.pins {
            return;
        }
        let event = self.marks.toggle(addr);
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
