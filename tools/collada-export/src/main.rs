//! collada-export - COLLADA asset export tool
//!
//! Converts .dae scenes to text assets (.obj, .mtl, .skl, .anm)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Use modules from library
use collada_export::{manifest, mesh, scene};

#[derive(Parser)]
#[command(name = "collada-export")]
#[command(about = "COLLADA asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single .dae scene
    Convert {
        /// Input COLLADA file
        input: PathBuf,

        /// Output directory (default: the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output base name (default: the input's file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Skip the skeleton (and with it the animation)
        #[arg(long)]
        no_skeleton: bool,

        /// Skip the animation
        #[arg(long)]
        no_animation: bool,

        /// Write inverse bind poses into the skeleton file
        #[arg(long)]
        bind_pose: bool,
    },

    /// Build scenes from a manifest file
    Build {
        /// Path to collada.toml manifest
        #[arg(default_value = "collada.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to collada.toml manifest
        #[arg(default_value = "collada.toml")]
        manifest: PathBuf,
    },

    /// Summarise an exported .obj file
    Inspect {
        /// Input OBJ file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match &cli.command {
        Commands::Build { verbose: true, .. } => tracing::Level::DEBUG,
        _ => tracing::Level::INFO,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            name,
            no_skeleton,
            no_animation,
            bind_pose,
        } => {
            let output_dir = output.unwrap_or_else(|| {
                input
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_default()
            });
            let name = match name {
                Some(name) => name,
                None => input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("Cannot derive output name from {:?}", input))?,
            };
            let options = scene::ConvertOptions {
                skeleton: !no_skeleton,
                animation: !no_animation,
                bind_pose,
            };

            tracing::info!("Converting {:?} -> {:?} ({})", input, output_dir, name);
            if !output_dir.as_os_str().is_empty() {
                std::fs::create_dir_all(&output_dir).with_context(|| {
                    format!("Failed to create output directory: {:?}", output_dir)
                })?;
            }
            let files = scene::convert_scene(&input, &output_dir, &name, &options)?;
            tracing::info!("Wrote {:?} and {:?}", files.obj_path, files.mtl_path);
            if let Some(skl) = &files.skl_path {
                tracing::info!("Wrote {:?}", skl);
            }
            if let Some(anm) = &files.anm_path {
                tracing::info!("Wrote {:?}", anm);
            }
            tracing::info!("Done!");
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building scenes from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            let built = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} scenes converted", built.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { input } => {
            let summary = mesh::read_obj_summary_file(&input)?;
            tracing::info!(
                "{:?}: {} positions, {} normals, {} uvs, {} faces",
                input,
                summary.positions,
                summary.normals,
                summary.uvs,
                summary.face_count()
            );
            if let Some(mtllib) = &summary.mtllib {
                tracing::info!("  mtllib {}", mtllib);
            }
            for section in &summary.sections {
                tracing::info!(
                    "  [{}] {} faces, positions {:?}, uvs {:?}, normals {:?}",
                    section.material.as_deref().unwrap_or("-"),
                    section.faces,
                    section.positions.range(),
                    section.uvs.range(),
                    section.normals.range()
                );
            }
        }
    }

    Ok(())
}
