use flowmap_geo::{Location, Projection, REFERENCE_ZOOM};

#[test]
fn antimeridian_neighbours_are_two_degrees_apart() {
    let proj = Projection::reference();
    let batch = proj
        .to_pixel_batch(&[Location::new(179.0, 0.0), Location::new(-179.0, 0.0)])
        .expect("batch");

    let expected = 2.0 / 360.0 * proj.world_size();
    let dx = batch.points[1].x - batch.points[0].x;
    assert!((dx - expected).abs() < 1e-3, "dx={dx} expected={expected}");
    assert!(dx.abs() < proj.world_size() / 2.0);
}

#[test]
fn antimeridian_holds_in_both_directions() {
    let proj = Projection::reference();
    let batch = proj
        .to_pixel_batch(&[Location::new(-179.0, 10.0), Location::new(179.0, 10.0)])
        .expect("batch");
    let expected = -2.0 / 360.0 * proj.world_size();
    assert!((batch.points[1].x - expected).abs() < 1e-3);
}

#[test]
fn batch_points_are_relative_to_the_anchor() {
    let proj = Projection::reference();
    let anchor = Location::new(-0.12, 51.5);
    let batch = proj
        .to_pixel_batch(&[anchor, Location::new(2.35, 48.85), Location::new(-3.7, 40.4)])
        .expect("batch");

    assert_eq!(batch.anchor, anchor);
    assert_eq!(batch.points[0].x, 0.0);
    assert_eq!(batch.points[0].y, 0.0);

    // Paris is east and south of London, Madrid is west and further south.
    assert!(batch.points[1].x > 0.0 && batch.points[1].y > 0.0);
    assert!(batch.points[2].x < 0.0 && batch.points[2].y > batch.points[1].y);
    assert_eq!(batch.margin.north, 0.0);
    assert_eq!(batch.margin.east, batch.points[1].x);
    assert_eq!(batch.margin.west, -batch.points[2].x);
    assert_eq!(batch.margin.south, batch.points[2].y);
}

#[test]
fn empty_batch_has_no_anchor() {
    assert!(Projection::reference().to_pixel_batch(&[]).is_none());
}

#[test]
fn scale_factor_rescales_reference_geometry() {
    let proj = Projection::reference();
    assert_eq!(proj.scale_factor(REFERENCE_ZOOM), 1.0);
    assert_eq!(proj.scale_factor(REFERENCE_ZOOM - 1.0), 0.5);
    assert_eq!(proj.scale_factor(REFERENCE_ZOOM - 10.0), 1.0 / 1024.0);

    let a = Location::new(10.0, 20.0);
    let b = Location::new(12.0, 21.0);
    let at_ref = proj.offset(a, b);
    let live = Projection::at_zoom(5.0);
    let at_live = live.offset(a, b);
    let k = proj.scale_factor(5.0);
    assert!((at_ref.x * k - at_live.x).abs() < 1e-6);
    assert!((at_ref.y * k - at_live.y).abs() < 1e-6);
}
