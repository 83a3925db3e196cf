use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use pagecraft_core::batch::{BatchJob, PlaceholderPolicy};
use pagecraft_core::config::EngineConfig;
use pagecraft_core::error::EngineError;
use pagecraft_core::export::{ExportFormat, ExportSpec};
use pagecraft_core::mask::ShapeMaskKind;
use pagecraft_core::pages::Document;
use pagecraft_core::scene::SceneGraph;
use pagecraft_render::{BatchOptions, BatchRunner, Exporter, RenderError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("page {0} is out of range, the document has {1}")]
    PageOutOfRange(usize, usize),
    #[error("{0} of the batch records failed")]
    BatchIncomplete(usize),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "pagecraft", version, about = "Render Pagecraft documents")]
struct Cli {
    /// Engine configuration JSON.
    #[arg(long, global = true, env = "PAGECRAFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one page, or every page, of a document.
    Render(RenderArgs),
    /// Stamp every record of a batch job into its template.
    Batch(BatchArgs),
    /// Export a page as a PNG cropped to a shape.
    Mask(MaskArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format: png, jpeg, svg or pdf.
    #[arg(long, default_value = "png")]
    format: ExportFormat,

    /// Resolution multiplier for raster output.
    #[arg(long, default_value_t = 1.0)]
    multiplier: f64,

    /// JPEG quality, 1 to 100.
    #[arg(long)]
    quality: Option<u8>,

    /// Bleed in millimetres on every side.
    #[arg(long, default_value_t = 0.0)]
    bleed: f64,

    /// Draw crop marks (PDF only).
    #[arg(long, default_value_t = false)]
    crop_marks: bool,

    /// Print resolution; overrides the configured DPI.
    #[arg(long)]
    dpi: Option<f64>,
}

impl OutputArgs {
    fn spec(&self, config: &EngineConfig) -> ExportSpec {
        let mut spec = config
            .export_spec(self.format)
            .with_multiplier(self.multiplier)
            .with_bleed(self.bleed)
            .with_crop_marks(self.crop_marks);
        if let Some(quality) = self.quality {
            spec = spec.with_quality(quality);
        }
        if let Some(dpi) = self.dpi {
            spec = spec.with_dpi(dpi);
        }
        spec
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file, or directory with `--all-pages`.
    #[arg(long)]
    out: PathBuf,

    /// 1-based page number; defaults to the document's current page.
    #[arg(long, conflicts_with = "all_pages")]
    page: Option<usize>,

    /// Write every page into the output directory.
    #[arg(long, default_value_t = false)]
    all_pages: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Input batch job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Render records on the thread pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Fail a record that leaves a placeholder unfilled.
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Stop at the first failing record.
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

#[derive(Args, Debug)]
struct MaskArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// circle, square, star, hexagon or heart.
    #[arg(long, default_value = "circle")]
    shape: ShapeMaskKind,

    /// Side of the square output in pixels.
    #[arg(long, default_value_t = 512)]
    size: u32,

    /// Inset of the shape; overrides the configured mask margin.
    #[arg(long)]
    margin: Option<f64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    match cli.cmd {
        Command::Render(args) => cmd_render(&args, &config),
        Command::Batch(args) => cmd_batch(&args, &config),
        Command::Mask(args) => cmd_mask(&args, &config),
    }
}

fn read_to_string(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    let write_err = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, bytes).map_err(write_err)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn load_document(path: &Path) -> CliResult<Document> {
    Ok(Document::from_json(&read_to_string(path)?)?)
}

/// Settings the job file leaves out come from `config`.
fn load_job(path: &Path, config: &EngineConfig) -> CliResult<BatchJob> {
    let defaults = config.export_spec(ExportSpec::default().format);
    Ok(BatchJob::from_json_with(&read_to_string(path)?, &defaults)?)
}

fn select_page(document: &Document, page: Option<usize>) -> CliResult<&SceneGraph> {
    match page {
        None => Ok(document.current()),
        Some(number) => number
            .checked_sub(1)
            .and_then(|index| document.pages().get(index))
            .ok_or(CliError::PageOutOfRange(number, document.page_count())),
    }
}

fn cmd_render(args: &RenderArgs, config: &EngineConfig) -> CliResult<()> {
    let document = load_document(&args.in_path)?;
    let spec = args.output.spec(config);
    let exporter = Exporter::default();

    if args.all_pages {
        for artifact in exporter.export_document(&document, &spec)? {
            write_file(&args.out.join(artifact.file_name()), &artifact.bytes)?;
        }
        return Ok(());
    }

    let page = select_page(&document, args.page)?;
    let bytes = exporter.render(page, &spec)?;
    write_file(&args.out, &bytes)
}

fn cmd_batch(args: &BatchArgs, config: &EngineConfig) -> CliResult<()> {
    let job = load_job(&args.in_path, config)?;

    let options = BatchOptions {
        isolate_failures: !args.fail_fast,
        parallel: args.parallel,
        policy: if args.strict {
            PlaceholderPolicy::Strict
        } else {
            PlaceholderPolicy::Passthrough
        },
    };
    let archive = BatchRunner::default().with_options(options).run(&job)?;
    archive.write_to_dir(&args.out).map_err(|source| CliError::Write {
        path: args.out.clone(),
        source,
    })?;

    for failure in archive.failures() {
        log::warn!("Record {} ({}): {}", failure.index, failure.record, failure.error);
    }
    if archive.is_complete() {
        log::info!("Wrote {} files to {}", archive.len(), args.out.display());
        Ok(())
    } else {
        Err(CliError::BatchIncomplete(archive.failures().len()))
    }
}

fn cmd_mask(args: &MaskArgs, config: &EngineConfig) -> CliResult<()> {
    let document = load_document(&args.in_path)?;
    let margin = args.margin.unwrap_or(config.mask_margin);
    let png = Exporter::default().render_masked(document.current(), args.shape, args.size, margin)?;
    write_file(&args.out, &png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use pagecraft_core::batch::BatchRecord;
    use pagecraft_core::shapes::SceneObject;

    fn write_document(dir: &Path, pages: usize) -> PathBuf {
        let mut first = SceneGraph::new(120, 80).unwrap();
        first.add(SceneObject::rectangle(Rect::new(10.0, 10.0, 60.0, 40.0)));
        let mut doc = Document::with_page("Test", first);
        for _ in 1..pages {
            let id = doc.add_page();
            doc.page_mut(id)
                .unwrap()
                .add(SceneObject::ellipse(Rect::new(0.0, 0.0, 30.0, 30.0)));
        }
        let path = dir.join("doc.json");
        fs::write(&path, doc.to_json().unwrap()).unwrap();
        path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pagecraft").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_render_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_document(dir.path(), 1);
        let out = dir.path().join("out/page.svg");
        let cli = parse(&[
            "render",
            "--in",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--format",
            "svg",
        ]);
        run(cli).unwrap();
        assert!(fs::read_to_string(&out).unwrap().starts_with("<svg"));
    }

    #[test]
    fn test_render_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_document(dir.path(), 2);
        let out = dir.path().join("pages");
        let cli = parse(&[
            "render",
            "--in",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--all-pages",
            "--format",
            "pdf",
            "--bleed",
            "3",
            "--crop-marks",
        ]);
        run(cli).unwrap();
        assert!(out.join("page-1.pdf").exists());
        assert!(out.join("page-2.pdf").exists());
    }

    #[test]
    fn test_page_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_document(dir.path(), 1);
        let cli = parse(&[
            "render",
            "--in",
            input.to_str().unwrap(),
            "--out",
            dir.path().join("x.png").to_str().unwrap(),
            "--page",
            "3",
        ]);
        assert!(matches!(run(cli), Err(CliError::PageOutOfRange(3, 1))));
    }

    #[test]
    fn test_spec_from_flags_and_config() {
        let config = EngineConfig {
            dpi: 150.0,
            ..EngineConfig::default()
        };
        let cli = parse(&["render", "--in", "a", "--out", "b", "--format", "jpeg", "--quality", "70"]);
        let Command::Render(args) = cli.cmd else {
            panic!("expected render");
        };
        let spec = args.output.spec(&config);
        assert_eq!(spec.format, ExportFormat::Jpeg);
        assert_eq!(spec.quality, 70);
        assert!((spec.dpi - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_batch_writes_one_file_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut template = SceneGraph::new(100, 100).unwrap();
        template.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let job = BatchJob::new(
            template,
            vec![BatchRecord::new("a"), BatchRecord::new("b")],
            ExportSpec::new(ExportFormat::Png),
        );
        let input = dir.path().join("job.json");
        fs::write(&input, serde_json::to_string(&job).unwrap()).unwrap();
        let out = dir.path().join("batch");

        let cli = parse(&["batch", "--in", input.to_str().unwrap(), "--out", out.to_str().unwrap()]);
        run(cli).unwrap();
        assert!(out.join("a.png").exists());
        assert!(out.join("b.png").exists());
    }

    #[test]
    fn test_batch_job_falls_back_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut template = SceneGraph::new(100, 100).unwrap();
        template.add(SceneObject::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let job = BatchJob::new(template, vec![BatchRecord::new("a")], ExportSpec::new(ExportFormat::Pdf));
        let mut value = serde_json::to_value(&job).unwrap();
        value["spec"].as_object_mut().unwrap().remove("dpi");
        let input = dir.path().join("job.json");
        fs::write(&input, value.to_string()).unwrap();

        let config = EngineConfig {
            dpi: 72.0,
            ..EngineConfig::default()
        };
        let loaded = load_job(&input, &config).unwrap();
        assert_eq!(loaded.spec.format, ExportFormat::Pdf);
        assert!((loaded.spec.dpi - 72.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mask_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_document(dir.path(), 1);
        let out = dir.path().join("mask.png");
        let cli = parse(&[
            "mask",
            "--in",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--shape",
            "star",
            "--size",
            "64",
        ]);
        run(cli).unwrap();
        assert_eq!(&fs::read(&out).unwrap()[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_missing_input_reports_path() {
        let cli = parse(&["mask", "--in", "/nonexistent/doc.json", "--out", "x.png"]);
        assert!(matches!(run(cli), Err(CliError::Read { .. })));
    }
}
