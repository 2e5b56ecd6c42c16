use super::*;

#[test]
fn pixel_time_conversion() {
    let g = TimelineGeometry::default();
    assert_eq!(g.px_to_ms(-20.0), -200.0);
    assert_eq!(g.time_at_x(150.0), 1500);
    assert_eq!(g.x_at_time(2500), 250.0);
    let g = g.with_header_width(100.0);
    assert_eq!(g.time_at_x(100.0), 0);
    assert_eq!(g.time_at_x(50.0), -500);
}

#[test]
fn zero_scale_does_not_divide() {
    let g = TimelineGeometry::default().with_pixels_per_second(0.0);
    assert_eq!(g.px_to_ms(100.0), 0.0);
}

#[test]
fn rows_stack_below_ruler() {
    let mut tl = Timeline::new();
    let a = tl.add_track();
    let b = tl.add_track();
    let g = TimelineGeometry::default();
    assert_eq!(g.track_at(&tl, 10.0), None);
    assert!(g.in_ruler(Point::new(300.0, 10.0)));
    assert_eq!(g.track_at(&tl, 24.0), Some(a));
    assert_eq!(g.track_at(&tl, 63.9), Some(a));
    assert_eq!(g.track_at(&tl, 64.0), Some(b));
    assert_eq!(g.track_at(&tl, 104.0), None);
}

#[test]
fn scene_hit_test() {
    let tl = Timeline::with_default_content();
    let g = TimelineGeometry::default();
    let track = tl.tracks()[0].id;
    let scene = tl.tracks()[0].scenes[0].id;
    assert_eq!(g.scene_at(&tl, Point::new(250.0, 40.0)), Some((track, scene)));
    assert_eq!(g.scene_at(&tl, Point::new(600.0, 40.0)), None);
    assert_eq!(g.scene_at(&tl, Point::new(250.0, 5.0)), None);
}
