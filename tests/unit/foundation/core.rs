use super::*;

#[test]
fn canvas_rejects_zero_and_oversized_sides() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(Canvas::new(64, 32).unwrap().size_u16().unwrap(), (64, 32));
}

#[test]
fn canvas_byte_len_is_rgba8() {
    let c = Canvas::new(3, 2).unwrap();
    assert_eq!(c.byte_len(), 24);
}

#[test]
fn premul_from_straight() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.a, 128);
    assert_eq!(c.r, 128);
    assert_eq!(c.g, 64);
    assert_eq!(c.b, 0);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
}

#[test]
fn ids_serialize_as_plain_integers() {
    assert_eq!(serde_json::to_string(&TrackId(7)).unwrap(), "7");
    let s: SceneId = serde_json::from_str("42").unwrap();
    assert_eq!(s, SceneId(42));
    assert_eq!(SceneId(3).to_string(), "scene#3");
}
