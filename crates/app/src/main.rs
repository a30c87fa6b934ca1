use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use muser_core::{assets, DistanceRange, Muse, SynthesisConfig};
use tracing_subscriber::EnvFilter;

fn main() -> muser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            model,
            name,
            image,
            audio,
            config,
        } => run_export(&model, name.as_deref(), image, audio, config.as_deref()),
        Commands::Inspect { model } => run_inspect(&model),
    }
}

fn run_export(
    model: &Path,
    name: Option<&str>,
    image: bool,
    audio: bool,
    config: Option<&Path>,
) -> muser_core::Result<()> {
    let config = match config {
        Some(path) => SynthesisConfig::load(path)?,
        None => SynthesisConfig::default(),
    };
    let stem = name
        .map(str::to_string)
        .or_else(|| {
            model
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "model".to_string());

    tracing::info!(model = %model.display(), stem, "importing model");
    let mesh = assets::load_obj(model)?;
    let mut muse = Muse::new(stem.clone(), mesh, config);
    muse.rasterize_buffer()?;

    let both = !image && !audio;
    if image || both {
        muse.export_image(&stem)?;
    }
    if audio || both {
        muse.export_audio(&stem)?;
    }
    Ok(())
}

fn run_inspect(model: &Path) -> muser_core::Result<()> {
    let mesh = assets::load_obj(model)?;
    let range = DistanceRange::measure(&mesh);

    println!("vertices:  {}", mesh.vertex_count());
    println!("triangles: {}", mesh.triangle_count());
    if range.is_degenerate() {
        println!("distance:  degenerate (no extent to normalize)");
    } else {
        println!("distance:  [{}, {}]", range.min, range.max);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn 3D models into images and sound", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rasterize a model and export its image and/or audio rendition.
    Export {
        /// Path to the OBJ model to import.
        model: PathBuf,
        /// Output file stem; defaults to the model's file stem.
        #[arg(short, long)]
        name: Option<String>,
        /// Export only the PPM image.
        #[arg(long)]
        image: bool,
        /// Export only the WAV audio.
        #[arg(long)]
        audio: bool,
        /// Optional JSON file overriding the synthesis constants.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print a model's mesh statistics without rasterizing.
    Inspect {
        /// Path to the OBJ model to inspect.
        model: PathBuf,
    },
}
