use super::*;

const W: u16 = 8;
const H: u16 = 8;

fn canvas() -> Canvas2d {
    Canvas2d::new(vello_cpu::RenderContext::new(W, H), None)
}

fn render(c: &Canvas2d) -> vello_cpu::Pixmap {
    let (ctx, _) = c.finish();
    let mut ctx = ctx.unwrap();
    let mut pm = vello_cpu::Pixmap::new(W, H);
    ctx.flush();
    ctx.render_to_pixmap(&mut pm);
    pm
}

fn px(pm: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
    let i = (y * W as usize + x) * 4;
    let d = pm.data_as_u8_slice();
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

fn color(s: &str) -> Dynamic {
    Dynamic::from(ImmutableString::from(s))
}

#[test]
fn fill_rect_uses_fill_style() {
    let c = canvas();
    c.set_fill_style(&color("#ff0000"));
    c.fill_rect(0.0, 0.0, 8.0, 8.0).unwrap();
    let pm = render(&c);
    assert_eq!(px(&pm, 3, 3), [255, 0, 0, 255]);
}

#[test]
fn invalid_style_is_ignored() {
    let c = canvas();
    c.set_fill_style(&color("#00ff00"));
    c.set_fill_style(&color("not-a-color"));
    c.set_fill_style(&Dynamic::from(42_i64));
    assert_eq!(c.fill_style().into_string().unwrap(), "#00ff00");
}

#[test]
fn translate_moves_subsequent_rects() {
    let c = canvas();
    c.set_fill_style(&color("white"));
    c.translate(4.0, 0.0);
    c.fill_rect(0.0, 0.0, 4.0, 8.0).unwrap();
    let pm = render(&c);
    assert_eq!(px(&pm, 1, 4)[3], 0);
    assert_eq!(px(&pm, 6, 4), [255, 255, 255, 255]);
}

#[test]
fn save_restore_round_trips_state() {
    let c = canvas();
    c.set_fill_style(&color("red"));
    c.save();
    c.set_fill_style(&color("blue"));
    c.translate(3.0, 3.0);
    c.restore();
    c.restore();
    assert_eq!(c.fill_style().into_string().unwrap(), "red");
    c.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
    let pm = render(&c);
    assert_eq!(px(&pm, 0, 0), [255, 0, 0, 255]);
}

#[test]
fn path_fill_covers_only_the_path() {
    let c = canvas();
    c.set_fill_style(&color("#0000ff"));
    c.begin_path();
    c.rect(0.0, 0.0, 4.0, 4.0);
    c.fill().unwrap();
    let pm = render(&c);
    assert_eq!(px(&pm, 1, 1), [0, 0, 255, 255]);
    assert_eq!(px(&pm, 6, 6)[3], 0);
}

#[test]
fn full_arc_fills_a_disc() {
    let c = canvas();
    c.set_fill_style(&color("white"));
    c.begin_path();
    c.arc(4.0, 4.0, 3.5, 0.0, TAU, false).unwrap();
    c.fill().unwrap();
    let pm = render(&c);
    assert_eq!(px(&pm, 4, 4)[3], 255);
    assert_eq!(px(&pm, 0, 0)[3], 0);
}

#[test]
fn negative_arc_radius_is_an_error() {
    let c = canvas();
    assert!(c.arc(0.0, 0.0, -1.0, 0.0, 1.0, false).is_err());
}

#[test]
fn arc_sweep_follows_direction() {
    assert!((arc_sweep(0.0, TAU, false) - TAU).abs() < 1e-12);
    assert!((arc_sweep(0.0, -1.0, false) - (TAU - 1.0)).abs() < 1e-12);
    assert!((arc_sweep(0.0, 1.0, true) + (TAU - 1.0)).abs() < 1e-12);
    assert!((arc_sweep(0.0, -3.0 * TAU, true) + TAU).abs() < 1e-12);
}

#[test]
fn global_alpha_scales_coverage() {
    let c = canvas();
    c.set_fill_style(&color("white"));
    c.set_global_alpha(0.5);
    c.set_global_alpha(7.0);
    c.fill_rect(0.0, 0.0, 8.0, 8.0).unwrap();
    let pm = render(&c);
    let a = px(&pm, 4, 4)[3];
    assert!((127..=129).contains(&a), "alpha {a}");
}

#[test]
fn linear_gradient_runs_left_to_right() {
    let c = canvas();
    let mut g = Gradient::linear(0.0, 0.0, 8.0, 0.0);
    g.add_color_stop(0.0, "black").unwrap();
    g.add_color_stop(1.0, "white").unwrap();
    c.set_fill_style(&Dynamic::from(g));
    c.fill_rect(0.0, 0.0, 8.0, 8.0).unwrap();
    let pm = render(&c);
    let left = px(&pm, 0, 4);
    let right = px(&pm, 7, 4);
    assert_eq!(left[3], 255);
    assert!(left[0] < 40, "{left:?}");
    assert!(right[0] > 215, "{right:?}");
}

#[test]
fn gradient_stop_validation() {
    let mut g = Gradient::radial(0.0, 0.0, 4.0);
    assert!(g.add_color_stop(1.5, "red").is_err());
    assert!(g.add_color_stop(0.5, "nope").is_err());
    g.add_color_stop(1.0, "white").unwrap();
    g.add_color_stop(0.0, "black").unwrap();
    assert_eq!(g.color_at(0.0).to_rgba8(), [0, 0, 0, 255]);
    assert_eq!(g.color_at(2.0).to_rgba8(), [255, 255, 255, 255]);
}

#[test]
fn draw_image_scales_buffer() {
    let mut red = vello_cpu::Pixmap::new(2, 2);
    crate::render::composite::clear_pixmap(&mut red, [255, 0, 0, 255]);
    let img = BufferImage::new("buffer1", Arc::new(red));
    assert_eq!((img.width(), img.height()), (2, 2));
    let c = canvas();
    c.draw_image(&img, 0.0, 0.0, Some((8.0, 8.0))).unwrap();
    let pm = render(&c);
    assert_eq!(px(&pm, 4, 4), [255, 0, 0, 255]);
}

#[test]
fn fill_text_without_font_is_a_no_op() {
    let c = canvas();
    c.fill_text("hello", 1.0, 6.0).unwrap();
    let pm = render(&c);
    assert!(pm.data_as_u8_slice().iter().all(|b| *b == 0));
}

#[test]
fn draws_after_finish_are_ignored() {
    let c = canvas();
    let _ = c.finish();
    assert!(c.fill_rect(0.0, 0.0, 1.0, 1.0).is_ok());
}

#[test]
fn font_shorthand_updates_size() {
    let c = canvas();
    c.set_font("bold 24px serif".into());
    c.set_font("serif".into());
    assert_eq!(c.inner.borrow().state.font_px, 24.0);
}
