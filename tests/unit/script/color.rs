use super::*;

fn rgba8(s: &str) -> [u8; 4] {
    parse_css_color(s).unwrap().to_rgba8()
}

#[test]
fn hex_forms() {
    assert_eq!(rgba8("#ff0000"), [255, 0, 0, 255]);
    assert_eq!(rgba8("#F00"), [255, 0, 0, 255]);
    assert_eq!(rgba8("#0000ff80"), [0, 0, 255, 128]);
    assert_eq!(rgba8("#0f08"), [0, 255, 0, 136]);
    assert!(parse_css_color("#12345").is_none());
    assert!(parse_css_color("#gg0000").is_none());
}

#[test]
fn functional_forms() {
    assert_eq!(rgba8("rgb(10, 20, 30)"), [10, 20, 30, 255]);
    assert_eq!(rgba8("rgba(255,0,0,0.5)"), [255, 0, 0, 128]);
    assert_eq!(rgba8("rgb(100%, 0%, 0%)"), [255, 0, 0, 255]);
    assert_eq!(rgba8("hsl(0, 100%, 50%)"), [255, 0, 0, 255]);
    assert_eq!(rgba8("hsla(120, 100%, 50%, 0.25)"), [0, 255, 0, 64]);
    assert!(parse_css_color("rgb(1,2)").is_none());
}

#[test]
fn named_colors() {
    assert_eq!(rgba8("White"), [255, 255, 255, 255]);
    assert_eq!(rgba8("transparent"), [0, 0, 0, 0]);
    assert!(parse_css_color("notacolor").is_none());
}

#[test]
fn premul_and_lerp() {
    let c = parse_css_color("rgba(255, 128, 0, 0.5)").unwrap();
    let p = c.to_premul();
    assert_eq!(p.a, 128);
    assert_eq!(p.r, 128);
    let mid = CssColor::BLACK.lerp(CssColor::rgba(1.0, 1.0, 1.0, 1.0), 0.5);
    assert_eq!(mid.to_rgba8(), [128, 128, 128, 255]);
}
