use crate::context::Context;
use crate::model::Row;
use serde::Serialize;

/// One tooltip line for a row under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipItem {
    pub row: Row,
    pub label: Option<String>,
    pub source: String,
    pub target: String,
    /// `None` without a weight field.
    pub weight: Option<f64>,
}

pub fn tooltip(ctx: &Context, rows: &[Row]) -> Vec<TooltipItem> {
    rows.iter()
        .filter(|&&r| r < ctx.rows.len())
        .map(|&row| TooltipItem {
            row,
            label: ctx.rows.label(row).map(str::to_string),
            source: ctx.rows.source_label(row).to_string(),
            target: ctx.rows.target_label(row).to_string(),
            weight: ctx.rows.weight(row),
        })
        .collect()
}
