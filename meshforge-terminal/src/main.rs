/// Meshforge Terminal Viewer
///
/// Loads an OBJ mesh, normalizes it, builds its tangent frame and renders it
/// as shaded ASCII. Without a file a textured cube is shown.
/// Controls:
///   - WASD / Arrow Keys: Orbit the camera
///   - +/-: Zoom
///   - P: Toggle perspective/orthographic
///   - Q/ESC: Quit
use clap::Parser;
use log::{info, warn};
use meshforge_core::{AssetKind, DegenerateUvPolicy, Mesh, PrepareOptions, SceneObject};
use meshforge_terminal::{summary, TerminalApp, ViewerConfig};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "meshforge-terminal",
    about = "Prepare an OBJ mesh and render it in the terminal"
)]
struct Args {
    /// OBJ file to load; a cube is shown when omitted
    model: Option<PathBuf>,

    /// Keep the original placement and scale instead of fitting the unit cube
    #[arg(long)]
    no_normalize: bool,

    /// Leave faces with collapsed texture coordinates out of the tangent frame
    #[arg(long)]
    skip_degenerate_uv: bool,

    /// Print a summary of the prepared mesh and exit
    #[arg(long)]
    info: bool,

    /// Target frame rate
    #[arg(long, default_value = "30")]
    fps: u32,
}

impl Args {
    fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions {
            normalize: !self.no_normalize,
            tangents: true,
            degenerate_uv: if self.skip_degenerate_uv {
                DegenerateUvPolicy::Skip
            } else {
                DegenerateUvPolicy::Propagate
            },
        }
    }
}

fn load_object(path: Option<&Path>, options: &PrepareOptions) -> io::Result<SceneObject> {
    let Some(path) = path else {
        let mut cube = Mesh::cube(2.0);
        cube.prepare(options);
        return Ok(SceneObject::new("cube", cube, AssetKind::lit("", "cube", 16)));
    };

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "model path has no file name"))?;

    info!("Loading OBJ file: {}", path.display());
    SceneObject::load(dir, name, AssetKind::lit(dir, name, 16), options).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to load {}: {}", path.display(), e),
        )
    })
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let object = load_object(args.model.as_deref(), &args.prepare_options())?;
    if object.mesh().has_non_finite() {
        warn!("mesh contains NaN or infinite attributes; try --skip-degenerate-uv");
    }

    if args.info {
        let report = summary(&object).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Failed to pack mesh: {}", e))
        })?;
        print!("{}", report);
        return Ok(());
    }

    info!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let config = ViewerConfig {
        fps: args.fps,
        ..ViewerConfig::default()
    };
    let mut app = TerminalApp::new(object, config)?;
    app.run()
}
