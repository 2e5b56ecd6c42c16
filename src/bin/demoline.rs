use std::{
    io::{BufRead as _, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[derive(Parser, Debug)]
#[command(name = "demoline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// TrueType/OpenType font used by `fillText` and the fault banner.
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the frame at one time as a PNG.
    Frame(FrameArgs),
    /// Render a PNG sequence by stepping the playhead.
    Render(RenderArgs),
    /// Replay a JSON-lines command script against a state file.
    Apply(ApplyArgs),
    /// Load from a store directory and write a timestamped export.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// State JSON (export or stored blob; legacy shapes are migrated).
    #[arg(long)]
    state: PathBuf,

    /// Playhead time in milliseconds.
    #[arg(long, default_value_t = 0)]
    time: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Skip the scene fault banner.
    #[arg(long)]
    no_overlay: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[arg(long)]
    state: PathBuf,

    /// Output directory for `frame_NNNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// First time in milliseconds.
    #[arg(long, default_value_t = 0)]
    from: u64,

    /// Last time in milliseconds (defaults to the duration).
    #[arg(long)]
    to: Option<u64>,

    #[arg(long)]
    no_overlay: bool,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    #[arg(long)]
    state: PathBuf,

    /// One JSON command per line; blank lines and lines starting with `#` are skipped.
    #[arg(long)]
    commands: PathBuf,

    /// Where to write the resulting state (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Directory holding `demoline-state.json` and optionally `default.json`.
    #[arg(long)]
    store: PathBuf,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args, &cli.global),
        Command::Render(args) => cmd_render(args, &cli.global),
        Command::Apply(args) => cmd_apply(args, &cli.global),
        Command::Export(args) => cmd_export(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "demoline=debug" } else { "demoline=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_state(path: &Path) -> anyhow::Result<demoline::LoadedState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read state '{}'", path.display()))?;
    let state = demoline::ProjectState::decode(&raw)
        .with_context(|| format!("parse state '{}'", path.display()))?;
    Ok(state.into_loaded(demoline::LoadSource::Document)?)
}

fn render_opts(global: &GlobalArgs, overlay: bool) -> anyhow::Result<demoline::RenderOpts> {
    let mut opts = demoline::RenderOpts::default().with_overlay(overlay);
    if let Some(path) = &global.font {
        let bytes = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        opts = opts.with_font_bytes(Arc::new(bytes));
    }
    Ok(opts)
}

fn write_png(path: &Path, frame: &demoline::FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn report_faults(report: &demoline::FrameReport) {
    for fault in report.faults() {
        if let Some(msg) = fault.outcome.message() {
            eprintln!(
                "t={}ms {} / {}: {msg}",
                report.time, fault.track_name, fault.scene_name
            );
        }
    }
}

fn cmd_frame(args: FrameArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let loaded = read_state(&args.state)?;
    let mut renderer = demoline::Renderer::new(render_opts(global, !args.no_overlay)?)?;
    let time = args.time.min(loaded.duration);
    let (frame, report) = renderer.render_frame(&loaded.timeline, loaded.canvas, time)?;
    report_faults(&report);
    write_png(&args.out, &frame)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    if args.fps == 0 {
        anyhow::bail!("--fps must be > 0");
    }
    let mut loaded = read_state(&args.state)?;
    let to = args.to.unwrap_or(loaded.duration).min(loaded.duration);
    if args.from > to {
        anyhow::bail!("--from ({}) is after --to ({to})", args.from);
    }
    let mut renderer = demoline::Renderer::new(render_opts(global, !args.no_overlay)?)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut playback = demoline::Playback::new(loaded.duration);
    playback.seek_to(i64::try_from(args.from)?);
    let mut index: u64 = 0;
    loop {
        // Frame times come from the frame index so rounding never accumulates.
        let target = args.from + (index * 1000 + u64::from(args.fps) / 2) / u64::from(args.fps);
        if target > to {
            break;
        }
        playback.seek_to(i64::try_from(target)?);
        let (frame, report) =
            renderer.render_frame(&loaded.timeline, loaded.canvas, playback.current_time())?;
        report_faults(&report);
        report.apply(&mut loaded.timeline);
        write_png(&args.out_dir.join(format!("frame_{index:05}.png")), &frame)?;
        index += 1;
    }
    eprintln!("wrote {index} frames to {}", args.out_dir.display());
    Ok(())
}

fn cmd_apply(args: ApplyArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let loaded = read_state(&args.state)?;
    let opts = demoline::EditorOpts::default().with_render(render_opts(global, true)?);
    let mut editor = demoline::Editor::from_loaded(loaded, demoline::MemoryStore::new(), opts)?;

    let f = std::fs::File::open(&args.commands)
        .with_context(|| format!("open commands '{}'", args.commands.display()))?;
    // Commands run on a synthetic clock advancing 1 ms per line.
    let start = Instant::now();
    for (n, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("read commands line {}", n + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cmd: demoline::Command =
            serde_json::from_str(line).with_context(|| format!("parse command on line {}", n + 1))?;
        let now = start + Duration::from_millis(n as u64);
        editor
            .dispatch(cmd, now)
            .with_context(|| format!("apply command on line {}", n + 1))?;
        editor.frame(now)?;
    }
    editor.flush()?;

    let out = editor.state().to_json_pretty()?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, out).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{out}"),
    }
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let store = demoline::FileStore::new(&args.store);
    let docs = demoline::DirDocuments::new(&args.store);
    let opts = demoline::PersistOpts::default().with_env_overrides();
    let loaded = demoline::load_state(&store, &docs, &opts);
    let state = demoline::ProjectState::capture(&loaded.timeline, loaded.duration, loaded.canvas);
    let (name, blob) = demoline::export_state(&state, chrono::Utc::now())?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let path = args.out_dir.join(name);
    std::fs::write(&path, blob).with_context(|| format!("write '{}'", path.display()))?;
    println!("{}", path.display());
    Ok(())
}
