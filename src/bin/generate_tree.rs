//! Tree and sprout atlas export utility
//!
//! Generates a tree at every LOD, captures its sprout groups from the side and
//! front planes, and writes the composed atlas plus a JSON summary.
//!
//! Usage:
//!     generate_tree [OPTIONS] <OUTPUT_DIR>
//!
//! Options:
//!     -p, --preset <PRESET>       Tree preset: broadleaf, willow, conifer (default: broadleaf)
//!     --seed <SEED>               Override the descriptor seed
//!     -d, --descriptor <FILE>     Load the descriptor from JSON instead of a preset
//!     -c, --config <FILE>         Load the generation config from JSON
//!     --lods <N>                  Number of LODs (default: from config)
//!     -h, --help                  Show this help message

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use arbor::atlas::{UvTransform, compose_atlas};
use arbor::core::types::{Rgba, Vec2};
use arbor::core::{NoProgress, Result, logging};
use arbor::generation::{GenerationConfig, TreeGenerator};
use arbor::params::{BranchDescriptor, TreePreset};
use arbor::polygon::{CutPlane, PolygonAreaCache, Snapshot, SnapshotProcessor};

fn print_help() {
    eprintln!("generate_tree - Tree and sprout atlas export utility");
    eprintln!();
    eprintln!("Usage: generate_tree [OPTIONS] <OUTPUT_DIR>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -p, --preset <PRESET>       Tree preset: broadleaf, willow, conifer (default: broadleaf)");
    eprintln!("    --seed <SEED>               Override the descriptor seed");
    eprintln!("    -d, --descriptor <FILE>     Load the descriptor from JSON instead of a preset");
    eprintln!("    -c, --config <FILE>         Load the generation config from JSON");
    eprintln!("    --lods <N>                  Number of LODs (default: from config)");
    eprintln!("    -h, --help                  Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    generate_tree -p willow --seed 42 ./out/willow");
    eprintln!("    generate_tree -d tree.json -c config.json --lods 2 ./out/custom");
}

#[derive(Debug)]
struct Args {
    output_dir: PathBuf,
    preset: TreePreset,
    seed: Option<u64>,
    descriptor: Option<PathBuf>,
    config: Option<PathBuf>,
    lods: Option<usize>,
}

fn parse_args() -> std::result::Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        return Err("Missing output directory".to_string());
    }

    let mut preset = TreePreset::Broadleaf;
    let mut seed: Option<u64> = None;
    let mut descriptor: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut lods: Option<usize> = None;
    let mut output_dir: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-p" | "--preset" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --preset".to_string());
                }
                preset = match args[i].to_lowercase().as_str() {
                    "broadleaf" => TreePreset::Broadleaf,
                    "willow" => TreePreset::Willow,
                    "conifer" => TreePreset::Conifer,
                    other => return Err(format!("Unknown preset: {}. Valid presets: broadleaf, willow, conifer", other)),
                };
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --seed".to_string());
                }
                seed = Some(args[i].parse().map_err(|_| format!("Invalid seed: {}", args[i]))?);
            }
            "-d" | "--descriptor" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --descriptor".to_string());
                }
                descriptor = Some(PathBuf::from(&args[i]));
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config = Some(PathBuf::from(&args[i]));
            }
            "--lods" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --lods".to_string());
                }
                let n: usize = args[i].parse().map_err(|_| format!("Invalid lods: {}", args[i]))?;
                if n == 0 {
                    return Err("--lods must be at least 1".to_string());
                }
                lods = Some(n);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if output_dir.is_some() {
                    return Err("Multiple output directories specified".to_string());
                }
                output_dir = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    let output_dir = output_dir.ok_or("Missing output directory")?;

    Ok(Args {
        output_dir,
        preset,
        seed,
        descriptor,
        config,
        lods,
    })
}

#[derive(Serialize)]
struct MeshSummary {
    vertices: usize,
    triangles: usize,
}

#[derive(Serialize)]
struct LodSummary {
    lod: usize,
    resolution_scale: f32,
    trunk: MeshSummary,
    branches: MeshSummary,
    sprouts: MeshSummary,
    sprout_count: usize,
    degenerate_directions: usize,
}

#[derive(Serialize)]
struct FragmentSummary {
    name: String,
    hull_points: usize,
    triangles: usize,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    uv_transform: UvTransform,
}

#[derive(Serialize)]
struct Summary {
    seed: u64,
    atlas_size: u32,
    lods: Vec<LodSummary>,
    fragments: Vec<FragmentSummary>,
}

fn mesh_summary(mesh: &arbor::mesh::MeshData) -> MeshSummary {
    MeshSummary { vertices: mesh.vertex_count(), triangles: mesh.triangle_count() }
}

/// Flat per-fragment tint with a vertical gradient
fn shade(index: usize, uv: Vec2) -> Rgba<u8> {
    let tint = (index as u32 * 37 % 96) as u8;
    let green = 110 + (uv.y.clamp(0.0, 1.0) * 120.0) as u8;
    Rgba([40 + tint, green, 30, 255])
}

fn run(args: &Args) -> Result<()> {
    let mut descriptor = match &args.descriptor {
        Some(path) => BranchDescriptor::from_json(&fs::read_to_string(path)?)?,
        None => BranchDescriptor::preset(args.preset),
    };
    if let Some(seed) = args.seed {
        descriptor.seed = seed;
    }
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(lods) = args.lods {
        config.lod_count = lods;
    }
    config.validate()?;
    descriptor.validate()?;
    fs::create_dir_all(&args.output_dir)?;

    let generator = TreeGenerator::new(config.clone());
    let mut lods = Vec::with_capacity(config.lod_count);
    for lod in 0..config.lod_count {
        let mut report = |title: &str, fraction: f32| log::debug!("[LOD {}] {} ({:.0}%)", lod, title, fraction * 100.0);
        let tree = generator.generate_lod(&descriptor, lod, &mut report)?;
        lods.push(LodSummary {
            lod,
            resolution_scale: config.lod_scale(lod),
            trunk: mesh_summary(&tree.trunk),
            branches: mesh_summary(&tree.branches),
            sprouts: mesh_summary(&tree.sprouts),
            sprout_count: tree.sprout_count,
            degenerate_directions: tree.bend_report.degenerate_directions,
        });
    }

    let snapshot = Snapshot::new(0, descriptor.clone())
        .with_planes(vec![CutPlane::side(), CutPlane::front()])
        .with_lods(1);
    let mut cache = PolygonAreaCache::new();
    let captured = SnapshotProcessor::new(config.clone()).process(&snapshot, &mut cache, &mut NoProgress)?;
    let mut areas: Vec<_> = captured.into_iter().flat_map(|l| l.areas).collect();

    let (layout, atlas) = compose_atlas(&mut areas, &config, shade)?;
    let atlas_path = args.output_dir.join("atlas.png");
    atlas.save(&atlas_path)?;
    log::info!("Wrote {}", atlas_path.display());

    let fragments = areas
        .iter()
        .zip(&layout.rects)
        .enumerate()
        .map(|(i, (area, rect))| FragmentSummary {
            name: area.name.clone(),
            hull_points: area.hull_points().len(),
            triangles: area.triangle_count(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            uv_transform: layout.uv_transform(i).unwrap_or(UvTransform::IDENTITY),
        })
        .collect();
    let summary = Summary { seed: descriptor.seed, atlas_size: config.atlas_size, lods, fragments };
    write_summary(&args.output_dir.join("summary.json"), &summary)
}

fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(summary)?)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    logging::init();

    println!("Tree Export Utility");
    println!("===================");
    println!("Output directory: {}", args.output_dir.display());
    match &args.descriptor {
        Some(path) => println!("Descriptor: {}", path.display()),
        None => println!("Preset: {:?}", args.preset),
    }
    println!();

    let start = Instant::now();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("Completed in {:.2}s", start.elapsed().as_secs_f64());
}
