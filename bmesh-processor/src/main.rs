use anyhow::{Context, Result, bail};
use bmesh_codec::{
    ExportConfig, FILE_EXTENSION, FormatVersion, PolygonTessellator, has_binarymesh_extension, save_binarymesh,
};
use clap::Parser;
use log::{error, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

mod obj;

/// Converts OBJ meshes into binarymesh documents.
#[derive(Parser, Debug)]
#[command(name = "bmesh-processor", version)]
struct Args {
    /// OBJ files to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file; only valid with a single input.
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Directory for outputs, named after their inputs.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Document version to write (1, 3 or 4).
    #[arg(long, default_value_t = FormatVersion::LATEST.as_u16())]
    format_version: u16,

    /// Worker threads used when converting several inputs.
    #[arg(long)]
    jobs: Option<usize>,
}

fn output_path(input: &Path, args: &Args) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    let renamed = input.with_extension(FILE_EXTENSION);
    match (&args.out_dir, renamed.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => renamed,
    }
}

/// Pairs every input with its output, refusing two inputs that would write
/// the same file.
fn plan_outputs(args: &Args) -> Result<Vec<(&Path, PathBuf)>> {
    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let output = output_path(input, args);
        if !seen.insert(output.clone()) {
            bail!("Several inputs would be written to {}", output.display());
        }
        plan.push((input.as_path(), output));
    }
    Ok(plan)
}

fn convert(input: &Path, output: &Path, config: &ExportConfig) -> Result<()> {
    let start = Instant::now();
    let mesh = obj::load_obj(input)?;
    let summary = save_binarymesh(output, &mesh, &PolygonTessellator, config)
        .with_context(|| format!("Failed to export {}", input.display()))?;
    info!(
        "{} -> {}: {} points, {} faces in {:.2}s",
        input.display(),
        output.display(),
        summary.points,
        summary.faces,
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output takes a single input; use --out-dir for several");
    }
    let plan = plan_outputs(&args)?;
    if let Some(output) = args.output.as_deref().filter(|o| !has_binarymesh_extension(o)) {
        warn!("{} does not end in .{}", output.display(), FILE_EXTENSION);
    }
    let version = FormatVersion::try_from(args.format_version)?;
    let config = ExportConfig::for_version(version);
    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("Failed to start worker pool")?;

    let start_total = Instant::now();
    let failures = pool.install(|| {
        plan.par_iter()
            .filter_map(|(input, output)| {
                convert(input, output, &config)
                    .map_err(|e| error!("{:#}", e))
                    .err()
            })
            .count()
    });
    info!(
        "Converted {} of {} inputs in {:.2}s",
        args.inputs.len() - failures,
        args.inputs.len(),
        start_total.elapsed().as_secs_f32()
    );

    if failures > 0 {
        bail!("{} of {} inputs failed", failures, args.inputs.len());
    }
    Ok(())
}
