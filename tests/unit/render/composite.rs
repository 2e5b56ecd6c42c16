use super::*;

#[test]
fn premul_rgba8_scales_channels() {
    assert_eq!(premul_rgba8([255, 128, 0, 128]), [128, 64, 0, 128]);
    assert_eq!(premul_rgba8([10, 20, 30, 255]), [10, 20, 30, 255]);
    assert_eq!(premul_rgba8([200, 200, 200, 0]), [0, 0, 0, 0]);
}

#[test]
fn over_with_opaque_source_replaces() {
    let mut dst = vec![0, 0, 0, 255, 9, 9, 9, 255];
    let src = vec![255, 0, 0, 255, 0, 0, 0, 0];
    premul_over_in_place(&mut dst, &src).unwrap();
    assert_eq!(dst, vec![255, 0, 0, 255, 9, 9, 9, 255]);
}

#[test]
fn over_with_half_alpha_blends() {
    let mut dst = vec![0, 0, 255, 255];
    let src = vec![128, 0, 0, 128];
    premul_over_in_place(&mut dst, &src).unwrap();
    assert_eq!(dst, vec![128, 0, 127, 255]);
}

#[test]
fn over_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(premul_over_in_place(&mut dst, &[0u8; 4]).is_err());
}

#[test]
fn pixmap_round_trips_bytes() {
    let bytes = vec![1, 2, 3, 4, 5, 6, 7, 8];
    let mut pm = pixmap_from_premul_bytes(&bytes, 2, 1).unwrap();
    assert_eq!(pm.data_as_u8_slice(), bytes.as_slice());
    clear_pixmap(&mut pm, [9, 9, 9, 255]);
    assert_eq!(pm.data_as_u8_slice(), &[9, 9, 9, 255, 9, 9, 9, 255]);
    clear_pixmap_to_transparent(&mut pm);
    assert!(pm.data_as_u8_slice().iter().all(|b| *b == 0));
    assert!(pixmap_from_premul_bytes(&bytes, 3, 1).is_err());
}
