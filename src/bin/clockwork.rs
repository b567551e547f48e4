use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use sha2::Digest as _;

use clockwork::scene::ObjectConfig;
use clockwork::{ImageFilter, RenderSession, RendererType, Resolution, Scene, SceneConfig, Vector3};

#[derive(Parser, Debug)]
#[command(name = "clockwork", version, about = "Software 3D rasteriser")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame to a PNG.
    Render(RenderArgs),
    /// List render styles and resolutions.
    List,
}

#[derive(Args, Debug)]
#[group(id = "input", required = true, multiple = false)]
struct Input {
    /// Scene description JSON.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// A single OBJ model, framed automatically.
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: Input,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Render style (overrides the scene file).
    #[arg(long)]
    renderer: Option<RendererType>,

    /// Output resolution (overrides the scene file).
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Post-processing filter (overrides the scene file).
    #[arg(long)]
    image_filter: Option<ImageFilter>,

    /// Run all render tasks on one worker.
    #[arg(long)]
    single_threaded: bool,

    /// Worker count for multi-threaded rendering.
    #[arg(long)]
    threads: Option<usize>,

    /// Print the SHA-256 of the rendered RGBA pixels.
    #[arg(long)]
    digest: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::List => {
            cmd_list();
            Ok(())
        }
    }
}

fn cmd_list() {
    println!("renderers:");
    for kind in RendererType::ALL {
        println!("  {kind}");
    }
    println!("resolutions:");
    for res in Resolution::ALL {
        let (w, h) = res.dimensions();
        println!("  {res:<6} {w}x{h}");
    }
}

fn read_config(args: &RenderArgs) -> anyhow::Result<(SceneConfig, PathBuf)> {
    let mut config = match (&args.input.scene, &args.input.model) {
        (Some(path), _) => SceneConfig::from_path(path)
            .with_context(|| format!("read scene '{}'", path.display()))?,
        (None, Some(model)) => SceneConfig {
            objects: vec![ObjectConfig::for_model(model)],
            ..SceneConfig::default()
        },
        (None, None) => anyhow::bail!("either --scene or --model is required"),
    };
    let base_dir = match &args.input.scene {
        Some(path) => path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
        None => PathBuf::new(),
    };

    if let Some(renderer) = args.renderer {
        config.renderer = renderer;
    }
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if let Some(filter) = args.image_filter {
        config.image_filter = filter;
    }
    if args.single_threaded {
        config.threading.multi_threaded = false;
    }
    if args.threads.is_some() {
        config.threading.threads = args.threads;
    }
    config.validate()?;
    Ok((config, base_dir))
}

/// Point the camera at the scene's bounds so the whole model is visible.
fn frame_camera(scene: &mut Scene) {
    let Some((lo, hi)) = scene.bodies.first().and_then(|b| b.model.bounds()) else {
        return;
    };
    let centre = (lo + hi) * 0.5;
    let radius = ((hi - lo).length() * 0.5).max(1e-3);
    let half_fov = scene.viewer.projection.fov_y * 0.5;
    let distance = radius / half_fov.sin() * 1.1;
    scene.viewer.target = centre;
    scene.viewer.eye = centre + Vector3::new(0.0, 0.0, distance);
    scene.viewer.projection.near = (distance - radius).max(distance * 1e-3);
    scene.viewer.projection.far = distance + radius * 2.0;
    scene.viewer.light.position = centre + Vector3::new(radius, radius, distance);
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (config, base_dir) = read_config(&args)?;
    let mut scene = config.load_scene(&base_dir)?;
    if args.input.model.is_some() {
        frame_camera(&mut scene);
    }

    let mut session = RenderSession::new(config.session_opts())?;
    config.configure_framebuffer(session.framebuffer_mut()?);
    let stats = session.render_frame(&scene);
    let frame = session.framebuffer().to_rgba8();

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.digest {
        println!("{}", sha256_hex(&frame.data));
    }
    eprintln!(
        "wrote {} ({} tasks, {} faces, {} fragments, {:.1} ms)",
        args.out.display(),
        stats.tasks,
        stats.faces,
        stats.fragments,
        stats.elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
