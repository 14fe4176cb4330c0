pub mod loggers;

use crate::loggers::init_logger;
use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use rseqp::cleaner;
use rseqp::config::{ExtractorConfig, ImageMode};
use rseqp::models::{DocumentInput, Extraction};
use rseqp::parser::{extraction2json, parse};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about, long_about=None)]
struct Args {
    /// Extracted document (.json or .txt), or a glob pattern matching several
    #[arg(short, long)]
    input: String,

    /// Output file for a single input, `-` for stdout
    #[arg(short, long)]
    out: Option<String>,

    /// Output directory when the input matches several documents
    #[arg(long)]
    out_dir: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long)]
    image_mode: Option<ImageMode>,

    /// Also write the normalized lines of a single input to this file
    #[arg(long)]
    dump_lines: Option<String>,

    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// Expands the input argument into document paths.
///
/// A path that exists is taken as is; anything else is treated as a glob
/// pattern and must match at least one file.
fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>> {
    if Path::new(input).is_file() {
        return Ok(vec![PathBuf::from(input)]);
    }
    let mut paths = Vec::new();
    for entry in glob::glob(input).with_context(|| format!("Invalid input pattern: {}", input))? {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        bail!("File not found: {}", input);
    }
    paths.sort();
    Ok(paths)
}

/// Reads an extracted document from disk.
///
/// `.json` files carry lines and images; `.txt` files are plain lines.
fn load_document(path: &Path) -> Result<DocumentInput> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match extension.as_str() {
        "json" => DocumentInput::from_json_str(&raw)
            .with_context(|| format!("Invalid document {}", path.display())),
        "txt" => Ok(DocumentInput::from_text(&raw)),
        _ => bail!(
            "Invalid file format: {}. Only .json and .txt documents are allowed",
            path.display()
        ),
    }
}

fn process_file(path: &Path, config: &ExtractorConfig) -> Result<Extraction> {
    let input = load_document(path)?;
    Ok(process_document(path, &input, config))
}

fn process_document(path: &Path, input: &DocumentInput, config: &ExtractorConfig) -> Extraction {
    let extraction = parse(input, config);
    for diagnostic in extraction.diagnostics.iter() {
        tracing::debug!("{}: {:?}", path.display(), diagnostic);
    }
    extraction
}

fn write_lines(out: &str, input: &DocumentInput, config: &ExtractorConfig) -> Result<()> {
    let lines = cleaner::normalize(&input.lines, &config.noise);
    std::fs::write(out, lines.join("\n") + "\n").with_context(|| format!("Failed to write {}", out))
}

fn output_path(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    out_dir.join(format!("{}.json", stem))
}

fn write_output(out: &str, json: &str) -> Result<()> {
    if out == "-" {
        println!("{}", json);
        return Ok(());
    }
    if !out.ends_with(".json") {
        bail!("Output file must be a JSON file: {}", out);
    }
    std::fs::write(out, json).with_context(|| format!("Failed to write {}", out))
}

fn run_single(args: &Args, path: &Path, config: &ExtractorConfig) -> Result<()> {
    let time = std::time::Instant::now();
    let input = load_document(path)?;
    let extraction = process_document(path, &input, config);

    if let Some(dump) = &args.dump_lines {
        write_lines(dump, &input, config)?;
    }

    let outfile = args.out.clone().unwrap_or("output.json".to_string());
    write_output(&outfile, &extraction2json(&extraction))?;
    if args.verbose {
        tracing::info!(
            "Wrote {} questions to {} in {:.2}s",
            extraction.topics.question_count(),
            outfile,
            time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

/// Processes several documents concurrently, one blocking task per document.
///
/// Every document is an independent run; a failing document is reported and
/// does not stop the others.
async fn run_batch(
    paths: Vec<PathBuf>,
    out_dir: PathBuf,
    config: ExtractorConfig,
    verbose: bool,
) -> Result<usize> {
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let config = Arc::new(config);
    let pb = if verbose {
        ProgressBar::new(paths.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let mut tasks = FuturesUnordered::new();
    for path in paths {
        let config = Arc::clone(&config);
        let out_dir = out_dir.clone();
        tasks.push(tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let extraction = process_file(&path, &config)?;
            let out = output_path(&out_dir, &path);
            std::fs::write(&out, extraction2json(&extraction))
                .with_context(|| format!("Failed to write {}", out.display()))?;
            Ok(out)
        }));
    }

    let mut failures = 0;
    while let Some(joined) = tasks.next().await {
        match joined {
            Ok(Ok(out)) => tracing::debug!("Wrote {}", out.display()),
            Ok(Err(e)) => {
                failures += 1;
                tracing::error!("{:#}", e);
            }
            Err(e) => {
                failures += 1;
                tracing::error!("Worker failed: {}", e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(failures)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose, args.json_logs)?;

    let mut config = match &args.config {
        Some(path) => ExtractorConfig::from_file(path)?,
        None => ExtractorConfig::new(),
    };
    if let Some(mode) = args.image_mode {
        config.image_mode = mode;
    }

    let paths = resolve_inputs(&args.input)?;
    if paths.len() == 1 && args.out_dir.is_none() {
        return run_single(&args, &paths[0], &config);
    }

    let out_dir = PathBuf::from(args.out_dir.clone().unwrap_or(".".to_string()));
    let total = paths.len();
    let failures = run_batch(paths, out_dir, config, args.verbose).await?;
    if failures > 0 {
        bail!("{} of {} documents failed", failures, total);
    }
    Ok(())
}
