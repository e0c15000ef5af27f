//! CLI tool for extracting text and formulas from PowerPoint files.

use anyhow::{Context, Result};
use clap::Parser;
use pptocr_core::{
    default_export_name, run_pending, Config, ExtractionPipeline, JobBoard, JobEvent, JobRunner,
    JobStatus, OcrLanguage, ShapeWalker,
};
use pptocr_pptx::PptxParser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extract slide text plus OCR and LaTeX from pictures in .pptx files.
#[derive(Parser, Debug)]
#[command(name = "pptocr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Emit per-slide JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// OCR language codes, e.g. eng,chi_sim (default: eng,chi_sim)
    #[arg(short, long = "lang", value_delimiter = ',')]
    languages: Vec<String>,

    /// Tesseract executable
    #[arg(long)]
    tesseract: Option<String>,

    /// Formula worker executable (reads image paths, prints one LaTeX line each)
    #[arg(long)]
    formula_cmd: Option<String>,

    /// Extra argument for the formula recognizer (repeatable), e.g. --no-cuda
    #[arg(long = "formula-arg", allow_hyphen_values = true)]
    formula_args: Vec<String>,

    /// Maximum number of files processed at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(&args)?;

    // Recognizers are loaded once; a missing engine stops here.
    let recognizer = pptocr_ocr::recognizer_from_config(&config)
        .context("Failed to initialize recognizers")?;
    let walker = ShapeWalker::new(Arc::new(recognizer));

    if args.json {
        return print_json(&args.input, PptxParser::new(), walker).await;
    }

    let pipeline = Arc::new(ExtractionPipeline::new(PptxParser::new(), walker));
    let runner = JobRunner::new(pipeline, config.max_concurrent_jobs);

    let mut board = JobBoard::new();
    board.add_files(args.input.iter().cloned());
    let total = board.records().len();

    run_pending(&mut board, &runner, |board, event| match event {
        JobEvent::Progress { path, message } => {
            if args.verbose {
                eprintln!("{}: {}", display_name(path), message);
            }
        }
        JobEvent::Error { message, .. } => eprintln!("{}", message),
        JobEvent::Finished { path, .. } => {
            if args.verbose {
                eprintln!("[{} / {}] {}", board.done_count(), total, display_name(path));
            }
        }
    })
    .await;

    for (index, record) in board.records().iter().enumerate() {
        match record.status {
            JobStatus::Done if args.print => println!("{}", record.text),
            JobStatus::Done => {
                let output_path = get_output_path(&record.path, args.output.as_ref())?;
                match board.export(index, &output_path) {
                    Ok(()) => {
                        if args.verbose {
                            eprintln!("Written to: {}", output_path.display());
                        }
                    }
                    Err(e) => eprintln!("Error exporting {}: {}", record.path.display(), e),
                }
            }
            status => eprintln!("{}  [{}]", record.display_name(), status.label()),
        }
    }

    Ok(())
}

/// Build the configuration from the optional file and command-line flags.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if !args.languages.is_empty() {
        config.languages = args
            .languages
            .iter()
            .map(|code| code.parse::<OcrLanguage>())
            .collect::<pptocr_core::Result<Vec<_>>>()?;
    }
    if let Some(program) = &args.tesseract {
        config.tesseract_program = program.clone();
    }
    if let Some(program) = &args.formula_cmd {
        config.formula_program = program.clone();
    }
    if !args.formula_args.is_empty() {
        config.formula_args = args.formula_args.clone();
    }
    if let Some(jobs) = args.jobs {
        config.max_concurrent_jobs = jobs;
    }

    config.validate()?;
    log::debug!("Using {:?}", config);
    Ok(config)
}

/// Extract each file on a blocking worker and print its slides as JSON.
async fn print_json(inputs: &[PathBuf], parser: PptxParser, walker: ShapeWalker) -> Result<()> {
    let pipeline = Arc::new(ExtractionPipeline::new(parser, walker));

    for input in inputs {
        let job_pipeline = Arc::clone(&pipeline);
        let path = input.clone();
        let slides = tokio::task::spawn_blocking(move || job_pipeline.extract_slides(&path)).await?;

        match slides {
            Ok(slides) => {
                let value = serde_json::json!({
                    "file": input.display().to_string(),
                    "slides": slides,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            Err(e) => eprintln!("Error processing {}: {}", input.display(), e),
        }
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let output_filename = default_export_name(input_path);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => output_filename,
        },
    };

    Ok(output_path)
}
