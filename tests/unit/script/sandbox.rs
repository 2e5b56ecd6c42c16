use std::collections::BTreeMap;
use std::sync::Arc;

use super::*;
use crate::script::canvas2d::BufferImage;

fn call(canvas: Canvas2d, buffers: BufferSnapshot) -> SceneCall {
    SceneCall {
        canvas,
        local_time: 250.0,
        width: 8,
        height: 8,
        scene_start: 1_000,
        scene_end: 2_000,
        buffers,
    }
}

fn run(sandbox: &Sandbox, code: &str) -> Result<(), String> {
    let compiled = sandbox.compile(code)?;
    let canvas = Canvas2d::new(vello_cpu::RenderContext::new(8, 8), None);
    sandbox.invoke(&compiled, call(canvas, BufferSnapshot::default()))
}

#[test]
fn syntax_errors_fail_at_compile() {
    let sb = Sandbox::default();
    assert!(sb.compile("ctx.fillRect(0,0,w,h").is_err());
    assert!(sb.compile("ctx.fillRect(0, 0, w, h);").is_ok());
}

#[test]
fn parameters_are_bound_by_name() {
    let sb = Sandbox::default();
    run(
        &sb,
        r#"
        if t != 250.0 { throw "t"; }
        if w != 8 || h != 8 { throw "size"; }
        if sceneStart != 1000 || sceneEnd != 2000 { throw "span"; }
        if ctx.width != 8 { throw "ctx"; }
        "#,
    )
    .unwrap();
}

#[test]
fn runtime_errors_carry_the_message() {
    let sb = Sandbox::default();
    let err = run(&sb, r#"throw "boom";"#).unwrap_err();
    assert!(err.contains("boom"), "{err}");
    let err = run(&sb, "undefined_fn(1);").unwrap_err();
    assert!(err.contains("undefined_fn"), "{err}");
}

#[test]
fn seeded_random_is_pure() {
    let sb = Sandbox::default();
    run(
        &sb,
        r#"
        let a = seededRandom(42);
        let b = seededRandom(42.0);
        for i in 0..10 { seededRandom(i); }
        if a != b || a != seededRandom(42) { throw "impure"; }
        if a < 0.0 || a >= 1.0 { throw "range"; }
        "#,
    )
    .unwrap();
}

#[test]
fn get_buffer_returns_unit_when_absent() {
    let sb = Sandbox::default();
    run(
        &sb,
        r#"if type_of(getBuffer("nope")) != "()" { throw "expected unit"; }"#,
    )
    .unwrap();
}

#[test]
fn get_buffer_reads_the_supplied_snapshot() {
    let sb = Sandbox::default();
    let mut map = BTreeMap::new();
    map.insert(
        "buffer1".to_owned(),
        BufferImage::new("buffer1", Arc::new(vello_cpu::Pixmap::new(3, 2))),
    );
    let compiled = sb
        .compile(
            r#"
            let b = getBuffer("buffer1");
            if b.width != 3 || b.height != 2 { throw "size"; }
            ctx.drawImage(b, 0, 0, w, h);
            "#,
        )
        .unwrap();
    let canvas = Canvas2d::new(vello_cpu::RenderContext::new(8, 8), None);
    sb.invoke(&compiled, call(canvas, Rc::new(map))).unwrap();

    // The snapshot does not outlive the call.
    run(
        &sb,
        r#"if type_of(getBuffer("buffer1")) != "()" { throw "leaked"; }"#,
    )
    .unwrap();
}

#[test]
fn compile_cache_is_keyed_by_code() {
    let mut sb = Sandbox::default();
    let a = sb.compile_cached(SceneId(1), "let x = 1;").unwrap();
    let b = sb.compile_cached(SceneId(1), "let x = 1;").unwrap();
    assert!(Rc::ptr_eq(&a.ast, &b.ast));
    let c = sb.compile_cached(SceneId(1), "let x = 2;").unwrap();
    assert!(!Rc::ptr_eq(&a.ast, &c.ast));
    assert_ne!(a.fingerprint(), c.fingerprint());
    assert!(sb.compile_cached(SceneId(2), "let = ;").is_err());
    sb.retain_scenes(|id| id == SceneId(1));
    assert_eq!(sb.cache.len(), 1);
}

#[test]
fn operation_budget_stops_runaway_loops() {
    let sb = Sandbox::new(SandboxOpts::default().with_max_operations(10_000));
    assert!(run(&sb, "loop { }").is_err());
}

#[test]
fn module_imports_are_unavailable() {
    let sb = Sandbox::default();
    assert!(run(&sb, r#"import "std" as s;"#).is_err());
}

#[test]
fn scripts_draw_through_ctx() {
    let sb = Sandbox::default();
    let compiled = sb
        .compile(r##"ctx.fillStyle = "#00ff00"; ctx.fillRect(0, 0, w, h);"##)
        .unwrap();
    let canvas = Canvas2d::new(vello_cpu::RenderContext::new(8, 8), None);
    sb.invoke(&compiled, call(canvas.clone(), BufferSnapshot::default()))
        .unwrap();
    let (ctx, _) = canvas.finish();
    let mut ctx = ctx.unwrap();
    let mut pm = vello_cpu::Pixmap::new(8, 8);
    ctx.flush();
    ctx.render_to_pixmap(&mut pm);
    assert_eq!(&pm.data_as_u8_slice()[..4], &[0, 255, 0, 255]);
}
