use flowmap::{
    Event, FlowMap, HighlightState, IssueKind, Location, PathId, Record, RowSource, StyleKind,
    Table,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn rows(records: Vec<Record>) -> Arc<dyn RowSource + Send + Sync> {
    Arc::new(Table::new(records))
}

fn city(name: &str) -> Option<Location> {
    let (lon, lat) = match name {
        "A" => (2.35, 48.85),
        "B" => (-0.13, 51.51),
        "C" => (13.40, 52.52),
        "D" => (-3.70, 40.42),
        "E" => (12.50, 41.90),
        "X" => (10.75, 59.91),
        _ => return None,
    };
    Some(Location::new(lon, lat))
}

fn engine(format: Value) -> FlowMap {
    let mut map = FlowMap::from_json(&format).unwrap();
    for name in ["A", "B", "C", "D", "E", "X"] {
        map.locations_mut().inject(name, city(name).unwrap());
    }
    map
}

fn keys(map: &FlowMap) -> Vec<String> {
    map.flows().keys().map(str::to_string).collect()
}

#[test]
fn two_row_flow_round_trip() {
    let mut map = engine(json!({ "style": { "type": "flow", "limit": 5 } }));
    map.reset(rows(vec![
        Record::new("A", "B").weight(5.0),
        Record::new("A", "C").weight(1.0),
    ]));

    assert_eq!(map.style(), StyleKind::Flow);
    assert_eq!(keys(&map), vec!["A"]);
    let flow = map.flows().get("A").unwrap();
    let shape = flow.shape().unwrap();
    let mut leaf_weights: Vec<(PathId, f64)> = shape
        .paths()
        .iter()
        .filter(|p| matches!(p.id, PathId::Row(_)))
        .map(|p| (p.id, p.weight))
        .collect();
    leaf_weights.sort_by_key(|(id, _)| *id);
    assert_eq!(leaf_weights, vec![(PathId::Row(0), 5.0), (PathId::Row(1), 1.0)]);
    assert_eq!(flow.state(), HighlightState::Full);

    map.select([0]);
    let flow = map.flows().get("A").unwrap();
    assert_eq!(flow.state(), HighlightState::Part);
    let extra: Vec<PathId> = flow.scene().extra.iter().map(|p| p.id).collect();
    assert_eq!(extra, vec![PathId::Row(0)]);
    assert!(map.drain_events().iter().any(|e| matches!(
        e,
        Event::PathChanged { key, paths } if key == "A" && paths.contains(&PathId::Row(0))
    )));
}

#[test]
fn bad_rows_are_flagged_not_drawn() {
    let mut map = engine(json!({ "advance": { "geocode": false } }));
    map.reset(rows(vec![Record::new("X", "X"), Record::new("A", "?")]));

    let selflink = map.issues().get(0).unwrap();
    assert_eq!(selflink.selflink.as_deref(), Some("X"));
    assert_eq!(selflink.unlocate, None);
    let unlocate = map.issues().get(1).unwrap();
    assert_eq!(unlocate.unlocate.as_deref(), Some("?"));

    // Both groups exist so their warnings stay reachable, but draw nothing.
    assert_eq!(keys(&map), vec!["X", "A"]);
    for flow in map.flows().iter() {
        assert_eq!(flow.state(), HighlightState::Empty);
        assert!(flow.scene().is_empty());
    }

    let legend = map.legend();
    let kinds: Vec<IssueKind> = legend.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![IssueKind::Unlocate, IssueKind::Selflink]);
    assert_eq!(legend.warnings[0].addresses.get("?"), Some(&1));
}

#[test]
fn negative_weights_are_reported() {
    let mut map = engine(json!({ "style": { "type": "straight" } }));
    map.reset(rows(vec![
        Record::new("A", "B").weight(-2.0),
        Record::new("A", "C").weight(3.0),
    ]));
    assert_eq!(map.issues().get(0).unwrap().negative.as_deref(), Some("A"));
    let shape = map.flows().get("A").unwrap().shape().unwrap();
    let ids: Vec<PathId> = shape.paths().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PathId::Row(1)]);
}

#[test]
fn negative_weights_name_the_hub_of_inbound_groups() {
    let mut map = engine(json!({ "style": { "type": "straight", "direction": "in" } }));
    map.reset(rows(vec![Record::new("A", "B").weight(-2.0)]));
    assert_eq!(map.issues().get(0).unwrap().negative.as_deref(), Some("B"));
    let legend = map.legend();
    assert_eq!(legend.warnings[0].kind, IssueKind::Negative);
    assert_eq!(legend.warnings[0].addresses.get("B"), Some(&1));
}

#[test]
fn malformed_rows_are_not_a_format_error() {
    let err = Table::from_json(&json!([{ "source": "A" }])).err().unwrap();
    assert!(matches!(err, flowmap::Error::InvalidRows(_)));
    assert!(err.to_string().starts_with("invalid rows"));
}

#[test]
fn auto_style_follows_the_data() {
    let hubs = ["A", "B", "C", "D", "E", "X"];
    let few: Vec<Record> = hubs[..3].iter().map(|h| Record::new(*h, "E")).collect();
    let many: Vec<Record> = hubs.iter().map(|h| Record::new(*h, "A")).collect();
    let huge: Vec<Record> = (0..600).map(|i| Record::new(hubs[i % 6], "A")).collect();

    let mut map = engine(json!({}));
    map.reset(rows(few));
    assert_eq!(map.style(), StyleKind::Flow);
    map.reset(rows(many));
    assert_eq!(map.style(), StyleKind::Arc);
    map.reset(rows(huge));
    assert_eq!(map.style(), StyleKind::Straight);
}

#[test]
fn smooth_color_forbids_bundling() {
    let mut map = engine(json!({ "style": { "type": "flow" } }));
    map.reset(rows(vec![
        Record::new("A", "B").color_value(1.0),
        Record::new("A", "C").color_value(9.0),
    ]));
    assert_eq!(map.style(), StyleKind::Arc);
    assert_eq!(keys(&map), vec!["A"]);
}

#[test]
fn flow_groups_split_by_color() {
    let mut map = engine(json!({ "style": { "type": "flow" } }));
    map.reset(rows(vec![
        Record::new("A", "B").color("red"),
        Record::new("A", "C").color("blue"),
        Record::new("A", "D").color("red"),
    ]));
    assert_eq!(map.flows().len(), 2);
    let sizes: Vec<usize> = map.flows().iter().map(|f| f.rows().len()).collect();
    assert_eq!(sizes, vec![2, 1]);
}

#[test]
fn limit_changes_keep_the_stable_prefix() {
    let mut map = engine(json!({ "style": { "type": "flow", "limit": 2 } }));
    map.reset(rows(vec![
        Record::new("A", "E"),
        Record::new("B", "E"),
        Record::new("C", "E"),
        Record::new("D", "E"),
    ]));
    assert_eq!(keys(&map), vec!["A", "B"]);

    map.reformat(&json!({ "style": { "limit": 3 } })).unwrap();
    let grown = keys(&map);
    assert_eq!(grown.len(), 3);
    assert_eq!(&grown[..2], &["A", "B"]);
    assert!(grown.contains(&"C".to_string()));

    map.reformat(&json!({ "style": { "limit": 1 } })).unwrap();
    assert_eq!(keys(&map), vec!["A"]);
}

#[test]
fn direction_change_regroups_by_destination() {
    let mut map = engine(json!({ "style": { "type": "arc" } }));
    map.reset(rows(vec![Record::new("A", "B"), Record::new("C", "B")]));
    assert_eq!(keys(&map), vec!["A", "C"]);

    map.reformat(&json!({ "style": { "direction": "in" } })).unwrap();
    assert_eq!(keys(&map), vec!["B"]);
    assert_eq!(map.flows().get("B").unwrap().rows(), &[0, 1]);
}

#[test]
fn widths_follow_the_global_weight_domain() {
    let mut map = engine(json!({ "style": { "type": "straight" } }));
    map.reset(rows(vec![
        Record::new("A", "B").weight(1.0),
        Record::new("C", "D").weight(5.0),
    ]));
    let width = |map: &FlowMap, key: &str| map.flows().get(key).unwrap().scene().base[0].width;
    assert_eq!(width(&map, "A"), 1.0);
    assert_eq!(width(&map, "C"), 12.0);

    map.reformat(&json!({ "width": { "max": 8 } })).unwrap();
    assert_eq!(width(&map, "C"), 8.0);
}

#[test]
fn unweighted_rows_use_the_fixed_width() {
    let mut map = engine(json!({ "style": { "type": "straight" }, "width": { "fixed": 3 } }));
    map.reset(rows(vec![Record::new("A", "B")]));
    assert_eq!(map.flows().get("A").unwrap().scene().base[0].width, 3.0);
}

#[test]
fn recolor_repaints_without_rebuilding() {
    let mut map = engine(json!({ "style": { "type": "straight" } }));
    map.reset(rows(vec![Record::new("A", "B").color("k")]));
    let before = map.flows().get("A").unwrap().scene().base[0].clone();
    map.drain_events();

    map.reformat(&json!({ "color": { "palette": ["#000000"] } })).unwrap();
    let after = &map.flows().get("A").unwrap().scene().base[0];
    assert_eq!(after.stroke, "#000000");
    assert_eq!(after.d, before.d);
    // Same path set, so no rebinding is needed.
    assert!(
        !map.drain_events()
            .iter()
            .any(|e| matches!(e, Event::PathChanged { .. }))
    );
}

#[test]
fn invalid_format_delta_is_rejected() {
    let mut map = engine(json!({}));
    let before = map.format().clone();
    assert!(map.reformat(&json!({ "style": { "limit": "lots" } })).is_err());
    assert_eq!(map.format(), &before);
}

#[test]
fn pies_aggregate_per_address_and_slice_by_color() {
    let mut map = engine(json!({ "style": { "type": "straight" } }));
    map.reset(rows(vec![
        Record::new("A", "B").weight(5.0).color("x"),
        Record::new("A", "C").weight(1.0).color("y"),
    ]));
    let pie = map.pies().get("A", flowmap::PieKind::Out).unwrap();
    assert_eq!(pie.total, 6.0);
    assert_eq!(pie.wedges.len(), 2);
    assert!((pie.radius - flowmap::pie::max_radius(25.0)).abs() < 1e-9);
    assert!(map.pies().get("B", flowmap::PieKind::In).is_none());

    map.reformat(&json!({ "bubble": { "for": "both", "slice": false } })).unwrap();
    assert!(map.pies().get("B", flowmap::PieKind::In).is_some());
    assert!(map.pies().get("A", flowmap::PieKind::Out).unwrap().wedges.is_empty());
}

#[test]
fn relocating_fixes_unlocatable_rows_on_exit() {
    let mut map = engine(json!({ "advance": { "geocode": false } }));
    map.reset(rows(vec![Record::new("A", "Nowhere")]));
    assert!(map.issues().get(0).unwrap().unlocate.is_some());

    map.reformat(&json!({ "advance": { "relocate": true } })).unwrap();
    map.relocate("Nowhere", Location::new(5.0, 45.0));
    map.reformat(&json!({ "advance": { "relocate": false } })).unwrap();

    assert!(map.issues().is_empty());
    assert!(map.flows().get("A").unwrap().shape().is_some());
}

#[test]
fn marks_toggle_and_reset_clears_them() {
    let mut map = engine(json!({}));
    map.reset(rows(vec![Record::new("A", "B")]));
    map.drain_events();
    map.toggle_mark("A");
    assert_eq!(
        map.drain_events(),
        vec![Event::MarkChanged {
            keys: vec!["A".into()]
        }]
    );
    map.reset(rows(vec![Record::new("A", "B")]));
    assert_eq!(map.marks().keys().count(), 0);
}

#[test]
fn tooltip_lists_each_row() {
    let mut map = engine(json!({}));
    map.reset(rows(vec![Record::new("A", "B").weight(2.0)]));
    let items = map.tooltip(&[0, 7]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].source, "A");
    assert_eq!(items[0].target, "B");
    assert_eq!(items[0].weight, Some(2.0));
}

#[test]
fn fit_covers_the_selection_when_auto_fit_is_on() {
    let mut map = engine(json!({ "style": { "type": "straight" } }));
    map.reset(rows(vec![Record::new("A", "B"), Record::new("C", "D")]));
    map.set_view(flowmap::MapView {
        center: Location::new(0.0, 0.0),
        zoom: 2.0,
        width: 800.0,
        height: 600.0,
    });
    let all = map.fit().unwrap();
    map.select([0]);
    let some = map.fit().unwrap();
    assert!(some.zoom >= all.zoom);
    assert!((0.0..=18.0).contains(&all.zoom));
    assert_eq!(map.transforms().len(), 2);
}
