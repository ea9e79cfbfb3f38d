use flowmap::visual::{HOVER_DELAY, LEAVE_DELAY};
use flowmap::{
    Error, Event, FlowMap, HighlightState, Location, PathId, Record, Row, Table,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn engine() -> FlowMap {
    let mut map = FlowMap::from_json(&json!({ "style": { "type": "straight" } })).unwrap();
    for (name, lon, lat) in [
        ("A", 2.35, 48.85),
        ("B", -0.13, 51.51),
        ("C", 13.40, 52.52),
        ("D", -3.70, 40.42),
        ("E", 12.50, 41.90),
    ] {
        map.locations_mut().inject(name, Location::new(lon, lat));
    }
    map.reset(Arc::new(Table::new(vec![
        Record::new("A", "B"),
        Record::new("A", "C"),
        Record::new("A", "D"),
        Record::new("E", "B"),
    ])));
    map.drain_events();
    map
}

fn hovers(map: &mut FlowMap) -> Vec<Option<Vec<Row>>> {
    map.drain_events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Hover { rows } => Some(rows),
            _ => None,
        })
        .collect()
}

fn state(map: &FlowMap, key: &str) -> HighlightState {
    map.flows().get(key).unwrap().state()
}

#[test]
fn highlight_state_partitions_the_selection() {
    let mut map = engine();
    assert_eq!(state(&map, "A"), HighlightState::Full);

    map.select([0]);
    assert_eq!(state(&map, "A"), HighlightState::Part);
    assert_eq!(state(&map, "E"), HighlightState::Empty);

    map.select([0, 1, 2]);
    assert_eq!(state(&map, "A"), HighlightState::Full);

    map.select([]);
    assert_eq!(state(&map, "A"), HighlightState::Empty);

    map.clear_selection();
    assert_eq!(state(&map, "A"), HighlightState::Full);
    assert_eq!(state(&map, "E"), HighlightState::Full);
}

#[test]
fn partial_groups_overdraw_only_selected_rows() {
    let mut map = engine();
    map.select([1, 2]);
    let scene = map.flows().get("A").unwrap().scene();
    let mut extra: Vec<PathId> = scene.extra.iter().map(|p| p.id).collect();
    extra.sort();
    assert_eq!(extra, vec![PathId::Row(1), PathId::Row(2)]);
    assert!(scene.base.iter().all(|p| p.opacity < 1.0));
    assert!(scene.extra.iter().all(|p| p.opacity == 1.0));
}

#[test]
fn fully_highlighted_groups_draw_last() {
    let mut map = engine();
    map.select([3]);
    let order: Vec<&str> = map.flows().keys().collect();
    assert_eq!(order, vec!["A", "E"]);
    map.select([0, 1, 2]);
    let order: Vec<&str> = map.flows().keys().collect();
    assert_eq!(order, vec!["E", "A"]);
}

#[test]
fn hover_is_announced_after_the_delay() {
    let mut map = engine();
    let t0 = Instant::now();
    map.hover_enter("A", PathId::Row(1), t0).unwrap();

    map.tick(t0 + HOVER_DELAY - Duration::from_millis(1));
    assert!(hovers(&mut map).is_empty());
    map.tick(t0 + HOVER_DELAY);
    assert_eq!(hovers(&mut map), vec![Some(vec![1])]);

    let t1 = t0 + Duration::from_secs(1);
    map.hover_leave("A", t1).unwrap();
    map.tick(t1 + LEAVE_DELAY);
    assert_eq!(hovers(&mut map), vec![None]);
}

#[test]
fn a_new_hover_cancels_the_pending_clear() {
    let mut map = engine();
    let t0 = Instant::now();
    map.hover_enter("A", PathId::Row(0), t0).unwrap();
    map.tick(t0 + HOVER_DELAY);
    hovers(&mut map);

    let t1 = t0 + Duration::from_secs(1);
    map.hover_leave("A", t1).unwrap();
    map.hover_enter("A", PathId::Row(2), t1 + Duration::from_millis(50))
        .unwrap();
    map.tick(t1 + LEAVE_DELAY);
    assert!(hovers(&mut map).is_empty());
    map.tick(t1 + Duration::from_millis(50) + HOVER_DELAY);
    assert_eq!(hovers(&mut map), vec![Some(vec![2])]);
}

#[test]
fn hovering_another_group_cancels_the_pending_clear() {
    let mut map = engine();
    let t0 = Instant::now();
    map.hover_enter("A", PathId::Row(0), t0).unwrap();
    map.tick(t0 + HOVER_DELAY);
    assert_eq!(hovers(&mut map), vec![Some(vec![0])]);

    let t1 = t0 + Duration::from_secs(1);
    map.hover_leave("A", t1).unwrap();
    map.hover_enter("E", PathId::Row(3), t1 + Duration::from_millis(50))
        .unwrap();
    map.tick(t1 + LEAVE_DELAY);
    assert!(hovers(&mut map).is_empty());
    map.tick(t1 + Duration::from_millis(50) + HOVER_DELAY);
    assert_eq!(hovers(&mut map), vec![Some(vec![3])]);
}

#[test]
fn sweeping_across_paths_announces_only_the_last() {
    let mut map = engine();
    let t0 = Instant::now();
    map.hover_enter("A", PathId::Row(0), t0).unwrap();
    map.hover_leave("A", t0 + Duration::from_millis(20)).unwrap();
    map.hover_enter("A", PathId::Row(1), t0 + Duration::from_millis(40))
        .unwrap();
    map.tick(t0 + Duration::from_secs(2));
    assert_eq!(hovers(&mut map), vec![Some(vec![1])]);
}

#[test]
fn click_dispatches_the_path_rows() {
    let mut map = engine();
    map.click("E", PathId::Row(3)).unwrap();
    assert_eq!(map.drain_events(), vec![Event::Click { rows: vec![3] }]);

    assert!(matches!(
        map.click("A", PathId::Merge(0)),
        Err(Error::UnknownPath { .. })
    ));
    assert!(matches!(
        map.click("nope", PathId::Row(0)),
        Err(Error::UnknownGroup { .. })
    ));
}
