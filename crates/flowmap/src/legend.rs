//! What a legend and warning banner need to show.

use crate::context::Context;
use crate::model::IssueKind;
use crate::pie::PieEngine;
use crate::scale::{ColorScale, WidthScale};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of width and bubble stops, smallest to largest.
const STOPS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothStop {
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidthEntry {
    pub weight: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleEntry {
    pub total: f64,
    pub radius: f64,
}

/// Rows excluded for one kind of issue, counted per offending address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: IssueKind,
    pub addresses: BTreeMap<String, usize>,
}

impl Warning {
    pub fn rows(&self) -> usize {
        self.addresses.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Legend {
    pub show: bool,
    pub position: String,
    pub color: Vec<ColorEntry>,
    /// Min and max stops of a smooth color ramp.
    pub smooth: Option<(SmoothStop, SmoothStop)>,
    pub width: Vec<WidthEntry>,
    pub bubble: Vec<BubbleEntry>,
    pub warnings: Vec<Warning>,
}

pub fn legend(ctx: &Context, pies: &PieEngine) -> Legend {
    let mut legend = Legend {
        show: ctx.format.legend.show,
        position: ctx.format.legend.position.clone(),
        ..Default::default()
    };

    match &ctx.color {
        ColorScale::Single(_) => {}
        ColorScale::Categorical { mapping, .. } => {
            legend.color = mapping
                .iter()
                .map(|(label, color)| ColorEntry {
                    label: label.clone(),
                    color: color.clone(),
                })
                .collect();
        }
        ColorScale::Smooth { domain, .. } => {
            let stop = |value: f64| SmoothStop {
                value,
                color: ctx.color.color(None, Some(value)),
            };
            legend.smooth = Some((stop(domain.0), stop(domain.1)));
        }
    }

    // Evenly spaced pixel widths, labeled with the weight that maps to each.
    if let WidthScale::Scaled(scale) = &ctx.width {
        let (r0, r1) = scale.range();
        legend.width = (0..STOPS)
            .map(|i| {
                let width = r0 + (r1 - r0) * i as f64 / (STOPS - 1) as f64;
                WidthEntry {
                    weight: scale.invert(width),
                    width,
                }
            })
            .collect();
    }

    if let Some(scale) = pies.scale() {
        let (lo, hi) = scale.domain;
        let mut totals: Vec<f64> = (0..STOPS)
            .map(|i| lo + (hi - lo) * i as f64 / (STOPS - 1) as f64)
            .collect();
        totals.dedup();
        legend.bubble = totals
            .into_iter()
            .map(|total| BubbleEntry {
                total,
                radius: scale.apply(total),
            })
            .collect();
    }

    for kind in [IssueKind::Unlocate, IssueKind::Selflink, IssueKind::Negative] {
        let mut addresses: BTreeMap<String, usize> = BTreeMap::new();
        for (_, issue) in ctx.issues.iter() {
            if let Some(addr) = issue.get(kind) {
                *addresses.entry(addr.to_string()).or_default() += 1;
            }
        }
        if !addresses.is_empty() {
            legend.warnings.push(Warning { kind, addresses });
        }
    }
    legend
}
