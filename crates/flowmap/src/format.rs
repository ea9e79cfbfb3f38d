//! User-adjustable visual settings and change tracking.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Straight,
    Arc,
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Group by origin, fan out to destinations.
    #[default]
    Out,
    /// Group by destination, fan in from origins.
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthScaleKind {
    #[default]
    Linear,
    Sqrt,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleFor {
    None,
    #[default]
    Out,
    In,
    Both,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Format {
    pub style: StyleFormat,
    pub width: WidthFormat,
    pub color: ColorFormat,
    pub legend: LegendFormat,
    pub bubble: BubbleFormat,
    pub advance: AdvanceFormat,
    pub map_control: MapControlFormat,
    pub map_element: MapElementFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleFormat {
    /// `None` picks a style from the data.
    #[serde(rename = "type")]
    pub kind: Option<StyleKind>,
    pub direction: Direction,
    /// Maximum number of bundled flow groups.
    pub limit: usize,
}

impl Default for StyleFormat {
    fn default() -> Self {
        Self {
            kind: None,
            direction: Direction::Out,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidthFormat {
    pub min: f64,
    pub max: f64,
    pub scale: WidthScaleKind,
    /// Stroke width when no weight is bound.
    pub fixed: f64,
}

impl Default for WidthFormat {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 12.0,
            scale: WidthScaleKind::Linear,
            fixed: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorFormat {
    pub palette: Vec<String>,
    pub default: String,
    /// Ends of the smooth color ramp.
    pub min: String,
    pub max: String,
    /// Opacity of paths outside the current selection.
    pub dim: f64,
}

impl Default for ColorFormat {
    fn default() -> Self {
        Self {
            palette: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default: "#1f77b4".to_string(),
            min: "#fee0d2".to_string(),
            max: "#de2d26".to_string(),
            dim: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegendFormat {
    pub show: bool,
    pub position: String,
}

impl Default for LegendFormat {
    fn default() -> Self {
        Self {
            show: true,
            position: "top".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BubbleFormat {
    #[serde(rename = "for")]
    pub for_: BubbleFor,
    /// Size slider, 0 to 100.
    pub scale: f64,
    /// Split multi-colored pies into wedges.
    pub slice: bool,
}

impl Default for BubbleFormat {
    fn default() -> Self {
        Self {
            for_: BubbleFor::Out,
            scale: 25.0,
            slice: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvanceFormat {
    /// Manual placement mode: addresses can be dragged, flows are not rebuilt.
    pub relocate: bool,
    pub geocode: bool,
}

impl Default for AdvanceFormat {
    fn default() -> Self {
        Self {
            relocate: false,
            geocode: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapControlFormat {
    pub auto_fit: bool,
    pub padding: f64,
}

impl Default for MapControlFormat {
    fn default() -> Self {
        Self {
            auto_fit: true,
            padding: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapElementFormat {
    pub pins: bool,
}

impl Default for MapElementFormat {
    fn default() -> Self {
        Self { pins: true }
    }
}

impl Format {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(Value::clone(value))?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// This format with the partial `delta` deep-merged on top.
    pub fn merged(&self, delta: &Value) -> Result<Self> {
        let mut value = self.to_value()?;
        deep_merge_value(&mut value, delta);
        Self::from_value(&value)
    }
}

/// Dotted paths whose values differ between two formats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatDirty {
    paths: BTreeSet<String>,
}

impl FormatDirty {
    pub fn between(old: &Format, new: &Format) -> Result<Self> {
        let mut paths = BTreeSet::new();
        diff_value("", &old.to_value()?, &new.to_value()?, &mut paths);
        Ok(Self { paths })
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn has(&self, dotted_path: &str) -> bool {
        self.paths.contains(dotted_path)
    }

    /// Whether anything under the top-level section `name` changed.
    pub fn section(&self, name: &str) -> bool {
        self.paths
            .iter()
            .any(|p| p == name || (p.starts_with(name) && p[name.len()..].starts_with('.')))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

fn diff_value(prefix: &str, old: &Value, new: &Value, out: &mut BTreeSet<String>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => diff_value(&path, x, y, out),
                    _ => {
                        out.insert(path);
                    }
                }
            }
        }
        (a, b) if a != b => {
            out.insert(prefix.to_string());
        }
        _ => {}
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn empty_delta() -> Value {
        Value::Object(serde_json::Map::new())
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let f = Format::from_value(&json!({ "style": { "type": "flow" } })).unwrap();
        assert_eq!(f.style.kind, Some(StyleKind::Flow));
        assert_eq!(f.style.limit, 10);
        assert_eq!(f.width, WidthFormat::default());
    }

    #[test]
    fn merge_then_diff_reports_changed_paths() {
        let old = Format::default();
        let new = old
            .merged(&json!({ "style": { "limit": 3 }, "color": { "dim": 0.5 } }))
            .unwrap();
        let dirty = FormatDirty::between(&old, &new).unwrap();
        assert!(dirty.has("style.limit"));
        assert!(dirty.has("color.dim"));
        assert!(!dirty.has("style.type"));
        assert!(dirty.section("color"));
        assert!(!dirty.section("col"));
        assert!(!dirty.section("width"));
    }

    #[test]
    fn null_resets_style_to_auto() {
        let old = Format::from_value(&json!({ "style": { "type": "arc" } })).unwrap();
        let new = old.merged(&json!({ "style": { "type": null } })).unwrap();
        assert_eq!(new.style.kind, None);
        assert!(FormatDirty::between(&old, &new).unwrap().has("style.type"));
    }

    #[test]
    fn identity_delta_is_clean() {
        let f = Format::default();
        let same = f.merged(&empty_delta()).unwrap();
        assert!(FormatDirty::between(&f, &same).unwrap().is_empty());
    }

    #[test]
    fn bad_delta_is_an_error() {
        let f = Format::default();
        assert!(f.merged(&json!({ "style": { "limit": "many" } })).is_err());
    }
}
