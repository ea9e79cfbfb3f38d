//! Row accessors supplied by the host.

use crate::{Error, Result};
use crate::model::Row;
use serde::Deserialize;
use serde_json::Value;

/// Per-row facts. Rows are `0..len()`; implementations never change a row once handed out.
pub trait RowSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn source(&self, row: Row) -> &str;
    fn target(&self, row: Row) -> &str;

    /// `None` for every row when the host bound no weight field.
    fn weight(&self, row: Row) -> Option<f64>;

    /// Categorical color key.
    fn color_key(&self, _row: Row) -> Option<&str> {
        None
    }

    /// Continuous color value; when any row has one the color encoding is smooth.
    fn color_value(&self, _row: Row) -> Option<f64> {
        None
    }

    /// Width in pixels chosen by the host for this row.
    fn width_value(&self, _row: Row) -> Option<f64> {
        None
    }

    fn label(&self, _row: Row) -> Option<&str> {
        None
    }

    fn source_label(&self, row: Row) -> &str {
        self.source(row)
    }

    fn target_label(&self, row: Row) -> &str {
        self.target(row)
    }

    fn has_weight(&self) -> bool {
        (0..self.len()).any(|r| self.weight(r).is_some())
    }

    fn has_color_value(&self) -> bool {
        (0..self.len()).any(|r| self.color_value(r).is_some())
    }

    fn has_width_value(&self) -> bool {
        (0..self.len()).any(|r| self.width_value(r).is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub color_value: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source_label: Option<String>,
    #[serde(default)]
    pub target_label: Option<String>,
}

impl Record {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn color(mut self, key: impl Into<String>) -> Self {
        self.color = Some(key.into());
        self
    }

    pub fn color_value(mut self, value: f64) -> Self {
        self.color_value = Some(value);
        self
    }
}

/// In-memory rows, usually deserialized from the host's JSON payload.
#[derive(Debug, Clone, Default)]
pub struct Table {
    records: Vec<Record>,
    has_weight: bool,
    has_color_value: bool,
    has_width_value: bool,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        let has_weight = records.iter().any(|r| r.weight.is_some());
        let has_color_value = records.iter().any(|r| r.color_value.is_some());
        let has_width_value = records.iter().any(|r| r.width.is_some());
        Self {
            records,
            has_weight,
            has_color_value,
            has_width_value,
        }
    }

    /// Parses a JSON array of records.
    pub fn from_json(value: &Value) -> Result<Self> {
        let records: Vec<Record> =
            serde_json::from_value(Value::clone(value)).map_err(Error::InvalidRows)?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl RowSource for Table {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn source(&self, row: Row) -> &str {
        &self.records[row].source
    }

    fn target(&self, row: Row) -> &str {
        &self.records[row].target
    }

    fn weight(&self, row: Row) -> Option<f64> {
        self.records[row].weight
    }

    fn color_key(&self, row: Row) -> Option<&str> {
        self.records[row].color.as_deref()
    }

    fn color_value(&self, row: Row) -> Option<f64> {
        self.records[row].color_value
    }

    fn width_value(&self, row: Row) -> Option<f64> {
        self.records[row].width
    }

    fn label(&self, row: Row) -> Option<&str> {
        self.records[row].label.as_deref()
    }

    fn source_label(&self, row: Row) -> &str {
        let r = &self.records[row];
        r.source_label.as_deref().unwrap_or(&r.source)
    }

    fn target_label(&self, row: Row) -> &str {
        let r = &self.records[row];
        r.target_label.as_deref().unwrap_or(&r.target)
    }

    fn has_weight(&self) -> bool {
        self.has_weight
    }

    fn has_color_value(&self) -> bool {
        self.has_color_value
    }

    fn has_width_value(&self) -> bool {
        self.has_width_value
    }
}
