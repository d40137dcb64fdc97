use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use phoneme_aligner_rs::alignment::prior::beta_binomial_prior;
use phoneme_aligner_rs::pipeline::parallel::configure_thread_pool;
use phoneme_aligner_rs::{
    AlignerConfig, Alignment, AlignmentInput, AlignmentOutput, DurationMetrics, ForcedAligner,
    ForcedAlignerBuilder, PhonemeSegment, PhonemeVocabulary, WordAlignment, WordSpan,
};
use serde::{Deserialize, Serialize};

#[path = "align/json_formatter.rs"]
mod json_formatter;
#[path = "align/text_grid_formatter.rs"]
mod text_grid_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    #[value(name = "textgrid")]
    TextGrid,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::TextGrid => "TextGrid",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "align")]
#[command(about = "Phoneme forced alignment over precomputed emission scores")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Align utterance files and write one segmentation per utterance.
    Decode(DecodeArgs),
    /// Write a Beta-Binomial attention prior as JSON.
    Prior(PriorArgs),
}

#[derive(Debug, Args)]
struct DecodeArgs {
    #[arg(long = "input", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
    #[arg(long, env = "PHONEME_ALIGNER_CONFIG")]
    config: Option<PathBuf>,
    /// Overrides `vocab_path` from the config file.
    #[arg(long, env = "PHONEME_ALIGNER_VOCAB")]
    vocab: Option<PathBuf>,
    #[arg(long, env = "PHONEME_ALIGNER_OUT_DIR", default_value = "target/alignments")]
    out_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    #[arg(long, env = "PHONEME_ALIGNER_THREADS")]
    threads: Option<usize>,
}

#[derive(Debug, Args)]
struct PriorArgs {
    #[arg(long)]
    phonemes: usize,
    #[arg(long)]
    frames: usize,
    #[arg(long, default_value_t = 0.05)]
    scale: f64,
    /// Printed to stdout when absent.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct UtteranceFile {
    id: String,
    phonemes: Vec<String>,
    emissions: Vec<Vec<f64>>,
    #[serde(default)]
    loudness_db: Option<Vec<f64>>,
    #[serde(default)]
    words: Option<Vec<WordSpan>>,
    /// Reference segmentation; scored with duration metrics when present.
    #[serde(default)]
    reference: Option<Vec<ReferenceSegment>>,
}

#[derive(Debug, Deserialize)]
struct ReferenceSegment {
    phoneme: String,
    start_s: f64,
    end_s: f64,
}

#[derive(Debug, Serialize)]
struct UtteranceReport<'a> {
    id: &'a str,
    generated_at: String,
    log_score: f64,
    phonemes: &'a [PhonemeSegment],
    words: &'a [WordAlignment],
}

#[derive(Debug, Serialize)]
struct PriorReport<'a> {
    phonemes: usize,
    frames: usize,
    scale_factor: f64,
    prior: &'a [Vec<f64>],
}

struct Utterance {
    id: String,
    input: AlignmentInput,
    reference: Option<Alignment>,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run() -> Result<(), String> {
    match Cli::parse().command {
        Command::Decode(args) => run_decode(args),
        Command::Prior(args) => run_prior(args),
    }
}

fn run_decode(args: DecodeArgs) -> Result<(), String> {
    let threads = configure_thread_pool(args.threads);
    let aligner = build_aligner(args.config.as_deref(), args.vocab.as_deref())?;

    let utterances = args
        .inputs
        .iter()
        .map(|path| load_utterance(path, aligner.vocabulary()))
        .collect::<Result<Vec<_>, _>>()?;
    let inputs: Vec<AlignmentInput> = utterances.iter().map(|u| u.input.clone()).collect();

    let progress = ProgressBar::new(utterances.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    progress.set_message("aligning");

    let started = Instant::now();
    let results = aligner.align_batch_with(&inputs, |index| {
        if let Some(utterance) = utterances.get(index) {
            progress.set_message(utterance.id.clone());
        }
        progress.inc(1);
    });
    let elapsed = started.elapsed();
    progress.finish_with_message("alignment pass complete");

    let mut metrics = DurationMetrics::new();
    let mut written = Vec::with_capacity(utterances.len());
    let mut skipped = 0usize;
    for (utterance, result) in utterances.iter().zip(results) {
        match result {
            Ok(output) => {
                if let Some(reference) = &utterance.reference {
                    if let Err(err) = metrics.update(&output.alignment, reference) {
                        tracing::warn!(utterance = %utterance.id, error = %err, "reference not scored");
                    }
                }
                let path = args
                    .out_dir
                    .join(format!("{}.{}", utterance.id, args.format.extension()));
                write_output(&path, args.format, &utterance.id, &output)?;
                written.push(path);
            }
            // Failures were already logged by the batch run.
            Err(_) => skipped += 1,
        }
    }

    for path in &written {
        println!("{}", path.display());
    }
    println!(
        "aligned: {} skipped: {} threads: {} elapsed: {:.2}ms finished_at: {}",
        written.len(),
        skipped,
        threads,
        elapsed.as_secs_f64() * 1000.0,
        Utc::now().to_rfc3339()
    );
    if let Some(report) = metrics.report() {
        json_formatter::print_json(&report)?;
    }
    Ok(())
}

fn run_prior(args: PriorArgs) -> Result<(), String> {
    let prior = beta_binomial_prior(args.phonemes, args.frames, args.scale)
        .map_err(|err| format!("Failed to build attention prior: {err}"))?;
    let report = PriorReport {
        phonemes: args.phonemes,
        frames: args.frames,
        scale_factor: args.scale,
        prior: &prior,
    };
    match args.out {
        Some(path) => {
            json_formatter::write_json(&path, &report)?;
            println!("{}", path.display());
            Ok(())
        }
        None => json_formatter::print_json(&report),
    }
}

fn build_aligner(config: Option<&Path>, vocab: Option<&Path>) -> Result<ForcedAligner, String> {
    let mut config = match config {
        Some(path) => {
            require_path_exists(path, "Missing aligner config.")?;
            AlignerConfig::load(path).map_err(|err| format!("Failed to load config: {err}"))?
        }
        None => AlignerConfig::default(),
    };
    if let Some(path) = vocab {
        require_path_exists(path, "Missing phoneme vocabulary.")?;
        config.vocab_path = Some(path.to_string_lossy().into_owned());
    }
    ForcedAlignerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build ForcedAligner: {err}"))
}

fn load_utterance(path: &Path, vocab: &PhonemeVocabulary) -> Result<Utterance, String> {
    require_path_exists(path, "Missing utterance file.")?;
    let data = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let file: UtteranceFile = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?;
    let phonemes = vocab
        .encode(&file.phonemes)
        .map_err(|err| format!("Utterance '{}': {err}", file.id))?;
    let reference = file.reference.map(|segments| Alignment {
        phonemes: segments
            .into_iter()
            .enumerate()
            .map(|(position, s)| PhonemeSegment {
                phoneme: s.phoneme,
                position,
                start_s: s.start_s,
                end_s: s.end_s,
            })
            .collect(),
    });
    Ok(Utterance {
        id: file.id,
        input: AlignmentInput {
            phonemes,
            emissions: file.emissions,
            loudness_db: file.loudness_db,
            word_spans: file.words,
        },
        reference,
    })
}

fn write_output(
    path: &Path,
    format: OutputFormat,
    id: &str,
    output: &AlignmentOutput,
) -> Result<(), String> {
    match format {
        OutputFormat::Json => json_formatter::write_json(
            path,
            &UtteranceReport {
                id,
                generated_at: Utc::now().to_rfc3339(),
                log_score: output.log_score,
                phonemes: &output.alignment.phonemes,
                words: &output.words,
            },
        ),
        OutputFormat::TextGrid => {
            text_grid_formatter::write_textgrid(path, &output.alignment, &output.words)
        }
    }
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
