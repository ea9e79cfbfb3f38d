//! Which flow groups should exist for the current rows and style.

use crate::context::Context;
use crate::format::StyleKind;
use crate::model::Row;
use indexmap::{IndexMap, IndexSet};

/// Fewer (hub, color) groups than this and auto mode bundles them as flows.
pub const AUTO_FLOW_GROUPS: usize = 5;
/// At or above this many rows auto mode falls back to straight lines.
pub const AUTO_ARC_ROWS: usize = 512;

/// Separates hub and color key in a flow group key.
const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    /// Style in effect after auto selection and overrides.
    pub style: StyleKind,
    /// Group key to member rows, in render order.
    pub groups: IndexMap<String, Vec<Row>>,
}

/// Group key of a flow bundle: the hub, plus the color key when there is one.
pub fn flow_key(hub: &str, color: Option<&str>) -> String {
    match color {
        Some(c) => format!("{hub}{KEY_SEPARATOR}{c}"),
        None => hub.to_string(),
    }
}

/// Decides the style and groups. `current` lists the keys rendered now, in order; under flow
/// style they are kept in preference to new ones so a changed limit does not reshuffle.
pub fn desired_flows(ctx: &Context, current: &[String]) -> Grouping {
    let rows = ctx.rows.as_ref();
    let by_flow_key = || {
        let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();
        for row in 0..rows.len() {
            groups
                .entry(flow_key(ctx.hub(row), rows.color_key(row)))
                .or_default()
                .push(row);
        }
        groups
    };

    let mut style = match ctx.format.style.kind {
        Some(kind) => kind,
        None => {
            if by_flow_key().len() < AUTO_FLOW_GROUPS {
                StyleKind::Flow
            } else if rows.len() < AUTO_ARC_ROWS {
                StyleKind::Arc
            } else {
                StyleKind::Straight
            }
        }
    };
    if style == StyleKind::Flow && ctx.smooth_color() {
        style = StyleKind::Arc;
    }

    if style != StyleKind::Flow {
        let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();
        for row in 0..rows.len() {
            groups.entry(ctx.hub(row).to_string()).or_default().push(row);
        }
        return Grouping { style, groups };
    }

    let mut desired = by_flow_key();
    let keys = stable_limit(
        desired.keys().map(String::as_str),
        current,
        ctx.format.style.limit,
    );
    let groups = keys
        .into_iter()
        .filter_map(|k| desired.swap_remove_entry(&k))
        .collect();
    Grouping { style, groups }
}

/// Keys to render: current keys still desired first, then new desired keys in encounter
/// order, at most `limit` in total.
pub fn stable_limit<'a>(
    desired: impl IntoIterator<Item = &'a str>,
    current: &[String],
    limit: usize,
) -> Vec<String> {
    let desired: IndexSet<&str> = desired.into_iter().collect();
    let mut keys: IndexSet<String> = current
        .iter()
        .filter(|k| desired.contains(k.as_str()))
        .cloned()
        .collect();
    keys.truncate(limit);
    for key in desired {
        if keys.len() >= limit {
            break;
        }
        keys.insert(key.to_string());
    }
    keys.into_iter().collect()
}
