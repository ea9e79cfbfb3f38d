//! Shared state read by every component.
//!
//! Only the orchestrator and the geocoding queue write to it; everything else receives
//! `&Context` for the duration of one call.

use crate::format::{Direction, Format, StyleKind};
use crate::location::LocationTable;
use crate::model::{Issue, IssueTable, Path, Row};
use crate::rows::{RowSource, Table};
use crate::scale::{ColorScale, WidthScale};
use flowmap_geo::{Location, Projection};
use rustc_hash::FxHashSet;
use std::sync::Arc;

pub struct Context {
    pub format: Format,
    pub rows: Arc<dyn RowSource + Send + Sync>,
    pub locations: LocationTable,
    pub issues: IssueTable,
    pub color: ColorScale,
    pub width: WidthScale,
    /// `None` when nothing is selected.
    pub selection: Option<FxHashSet<Row>>,
    /// Style actually in use after auto selection.
    pub style: StyleKind,
    pub projection: Projection,
}

impl Context {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            rows: Arc::new(Table::default()),
            locations: LocationTable::default(),
            issues: IssueTable::default(),
            color: ColorScale::default(),
            width: WidthScale::default(),
            selection: None,
            style: StyleKind::Straight,
            projection: Projection::reference(),
        }
    }

    /// Address the row is grouped under: origin for outgoing flows, destination for incoming.
    pub fn hub(&self, row: Row) -> &str {
        match self.format.style.direction {
            Direction::Out => self.rows.source(row),
            Direction::In => self.rows.target(row),
        }
    }

    /// The far end of the row as seen from its hub.
    pub fn leaf(&self, row: Row) -> &str {
        match self.format.style.direction {
            Direction::Out => self.rows.target(row),
            Direction::In => self.rows.source(row),
        }
    }

    pub fn hub_location(&self, row: Row) -> Option<Location> {
        self.locations.get(self.hub(row))
    }

    pub fn leaf_location(&self, row: Row) -> Option<Location> {
        self.locations.get(self.leaf(row))
    }

    /// Weight used for geometry and aggregation; rows count as 1 without a weight field.
    pub fn weight(&self, row: Row) -> f64 {
        self.rows.weight(row).unwrap_or(1.0)
    }

    pub fn is_valid(&self, row: Row) -> bool {
        !self.issues.has(row)
    }

    pub fn smooth_color(&self) -> bool {
        self.rows.has_color_value()
    }

    /// Inspects `row` against the current location table.
    pub fn check(&self, row: Row) -> Issue {
        let source = self.rows.source(row);
        let target = self.rows.target(row);
        let mut issue = Issue::default();
        if source == target {
            issue.selflink = Some(source.to_string());
        }
        if self.rows.weight(row).is_some_and(|w| w < 0.0) {
            issue.negative = Some(self.hub(row).to_string());
        }
        if self.locations.get(source).is_none() {
            issue.unlocate = Some(source.to_string());
        } else if self.locations.get(target).is_none() {
            issue.unlocate = Some(target.to_string());
        }
        issue
    }

    /// Re-checks `row` and records the outcome.
    pub fn flag(&mut self, row: Row) {
        let issue = self.check(row);
        self.issues.set(row, issue);
    }

    pub fn row_color(&self, row: Row) -> String {
        self.color
            .color(self.rows.color_key(row), self.rows.color_value(row))
    }

    /// Stroke color of a path: the color of its first row.
    pub fn path_color(&self, path: &Path) -> String {
        match path.leafs.first() {
            Some(&row) => self.row_color(row),
            None => self.format.color.default.clone(),
        }
    }

    pub fn path_width(&self, path: &Path) -> f64 {
        match &self.width {
            WidthScale::Fixed(px) => *px,
            WidthScale::PerRow { fallback } => path
                .leafs
                .iter()
                .map(|&r| self.rows.width_value(r).unwrap_or(*fallback))
                .sum(),
            WidthScale::Scaled(scale) => scale.apply(path.weight),
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn is_selected(&self, row: Row) -> bool {
        self.selection.as_ref().is_some_and(|s| s.contains(&row))
    }
}
