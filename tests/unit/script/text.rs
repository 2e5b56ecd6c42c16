use super::*;

#[test]
fn font_px_from_shorthand() {
    assert_eq!(parse_font_px("24px sans-serif"), Some(24.0));
    assert_eq!(parse_font_px("bold 12.5px monospace"), Some(12.5));
    assert_eq!(parse_font_px("italic serif"), None);
    assert_eq!(parse_font_px("0px serif"), None);
}

#[test]
fn garbage_font_bytes_are_rejected() {
    let bytes = Arc::new(vec![0u8; 64]);
    let err = TextEngine::from_font_bytes(&bytes).unwrap_err();
    assert!(matches!(err, DemolineError::Script(_)), "{err}");
}
