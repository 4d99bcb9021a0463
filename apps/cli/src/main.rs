use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use konspekt_core::{
    FinalizedOutline, GoogleSearchClient, LlmOracle, ProcessorConfig, ProgressSink, Provider,
    QuizQuestion, SegmenterConfig, ShowNoteItem, Stage, Transcript, TranscriptFetcher,
    format_outline_readable, format_quiz_readable, format_show_notes_readable, generate_outline,
    generate_quiz, generate_show_notes,
};

const DEFAULT_TRANSCRIPT_URL: &str = "https://transcripts.konspekt.app/transcript";

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Mode {
    #[default]
    Outline,
    Notes,
    Quiz,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Mode::Outline => "outline",
            Mode::Notes => "show notes",
            Mode::Quiz => "quiz",
        }
    }
}

#[derive(Parser)]
#[command(name = "konspekt")]
#[command(
    about = "Generate AI-powered outlines, show notes, and quizzes from video transcripts"
)]
struct Cli {
    /// Video URL
    url: Option<String>,

    /// Read the transcript from a local JSON file instead of fetching it
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// What to generate
    #[arg(short, long, default_value = "outline")]
    mode: Mode,

    /// AI provider for analysis
    #[arg(short, long, default_value = "grok")]
    provider: CliProvider,

    /// Transcript service endpoint (defaults to $KONSPEKT_TRANSCRIPT_URL)
    #[arg(long)]
    transcript_url: Option<String>,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,

    /// Emit progress as JSON lines instead of human-readable output
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Cache key and display name for this request's source.
    fn locator(&self) -> Option<String> {
        if let Some(path) = &self.transcript {
            return Some(path.display().to_string());
        }
        self.url.clone()
    }

    fn transcript_endpoint(&self) -> String {
        self.transcript_url
            .clone()
            .or_else(|| std::env::var("KONSPEKT_TRANSCRIPT_URL").ok())
            .unwrap_or_else(|| DEFAULT_TRANSCRIPT_URL.to_string())
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

async fn acquire_transcript(
    cli: &Cli,
    cache_dir: &std::path::Path,
    progress: &ProgressSink,
) -> Result<Transcript> {
    if let Some(path) = &cli.transcript {
        progress.status(
            Stage::FetchingTranscript,
            "Loading transcript from file",
            serde_json::json!({ "path": path.display().to_string() }),
        );
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading transcript file {}", path.display()))?;
        let transcript: Transcript = serde_json::from_str(&raw)
            .with_context(|| format!("parsing transcript file {}", path.display()))?;
        return Ok(transcript);
    }

    let url = cli.url.as_deref().unwrap_or_default();
    let transcript_path = konspekt_core::get_transcript_path(cache_dir);
    if !cli.force {
        if let Some(cached) = konspekt_core::load_json::<Transcript>(&transcript_path).await {
            progress.status(
                Stage::FetchingTranscript,
                "Using cached transcript",
                serde_json::json!({ "url": url }),
            );
            return Ok(cached);
        }
    }

    progress.status(
        Stage::FetchingTranscript,
        "Retrieving transcript...",
        serde_json::json!({ "url": url }),
    );
    let fetcher = TranscriptFetcher::new(cli.transcript_endpoint())?;
    let transcript = fetcher.fetch_with_progress(url, progress).await?;
    konspekt_core::store_json(&transcript_path, &transcript).await;
    Ok(transcript)
}

enum Generated {
    Outline(FinalizedOutline),
    Notes(Vec<ShowNoteItem>),
    Quiz(Vec<QuizQuestion>),
}

impl Generated {
    fn readable(&self) -> String {
        match self {
            Generated::Outline(outline) => format_outline_readable(outline),
            Generated::Notes(notes) => format_show_notes_readable(notes),
            Generated::Quiz(questions) => format_quiz_readable(questions),
        }
    }
}

async fn run_generation(
    cli: &Cli,
    provider: &Provider,
    transcript: &Transcript,
    progress: &ProgressSink,
) -> Result<Generated> {
    let oracle: Arc<dyn konspekt_core::AnalysisOracle> =
        Arc::new(LlmOracle::new(provider.clone())?);
    let processor = ProcessorConfig::default();

    let generated = match cli.mode {
        Mode::Outline => Generated::Outline(
            generate_outline(
                transcript,
                oracle,
                &SegmenterConfig::outline(),
                &processor,
                progress,
            )
            .await?,
        ),
        Mode::Notes => {
            let search: Arc<dyn konspekt_core::SearchClient> =
                Arc::new(GoogleSearchClient::from_env()?);
            Generated::Notes(
                generate_show_notes(
                    transcript,
                    oracle,
                    search,
                    &SegmenterConfig::show_notes(),
                    &processor,
                    progress,
                )
                .await?,
            )
        }
        Mode::Quiz => {
            Generated::Quiz(generate_quiz(transcript, oracle, &processor, progress).await?)
        }
    };
    Ok(generated)
}

async fn load_cached_result(cli: &Cli, provider: &Provider, cache_dir: &std::path::Path) -> Option<Generated> {
    if cli.force {
        return None;
    }
    match cli.mode {
        Mode::Outline => {
            konspekt_core::load_json(&konspekt_core::get_outline_path(cache_dir, provider))
                .await
                .map(Generated::Outline)
        }
        Mode::Notes => {
            konspekt_core::load_json(&konspekt_core::get_show_notes_path(cache_dir, provider))
                .await
                .map(Generated::Notes)
        }
        Mode::Quiz => konspekt_core::load_json(&konspekt_core::get_quiz_path(cache_dir, provider))
            .await
            .map(Generated::Quiz),
    }
}

async fn store_result(generated: &Generated, provider: &Provider, cache_dir: &std::path::Path) {
    match generated {
        Generated::Outline(outline) => {
            konspekt_core::store_json(&konspekt_core::get_outline_path(cache_dir, provider), outline)
                .await
        }
        Generated::Notes(notes) => {
            konspekt_core::store_json(
                &konspekt_core::get_show_notes_path(cache_dir, provider),
                notes,
            )
            .await
        }
        Generated::Quiz(questions) => {
            konspekt_core::store_json(&konspekt_core::get_quiz_path(cache_dir, provider), questions)
                .await
        }
    }
}

async fn run_json(cli: Cli, provider: Provider, cache_dir: PathBuf) -> Result<()> {
    let (sink, mut rx) = ProgressSink::channel();
    let locator = cli.locator().unwrap_or_default();
    sink.status(
        Stage::Started,
        "Starting analysis",
        serde_json::json!({ "url": locator }),
    );

    let task_sink = sink.clone();
    let task = tokio::spawn(async move {
        let result = async {
            let transcript = acquire_transcript(&cli, &cache_dir, &task_sink).await?;
            let generated = run_generation(&cli, &provider, &transcript, &task_sink).await?;
            store_result(&generated, &provider, &cache_dir).await;
            Ok::<_, anyhow::Error>(())
        }
        .await;
        if let Err(err) = &result {
            task_sink.error(err.to_string());
        }
        result
    });
    drop(sink);

    while let Some(event) = rx.recv().await {
        println!("{}", serde_json::to_string(&event)?);
    }

    task.await.context("pipeline task panicked")?
}

async fn run_human(cli: Cli, provider: Provider, cache_dir: PathBuf) -> Result<()> {
    println!(
        "\n{}  {}\n",
        style("konspekt").cyan().bold(),
        style("Video Outliner").dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    let progress = ProgressSink::disabled();

    // Step 1: transcript (check cache)
    let step_start = Instant::now();
    let spinner = create_spinner("Retrieving transcript...");
    let transcript = acquire_transcript(&cli, &cache_dir, &progress).await?;
    spinner.finish_with_message(format!(
        "{} Transcript: {} entries, {:.1} min {}",
        style("✓").green().bold(),
        transcript.entries.len(),
        transcript.total_duration() / 60.0,
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    // Step 2: generate (check cache with provider+mode)
    let step_start = Instant::now();
    let generated = if let Some(cached) = load_cached_result(&cli, &provider, &cache_dir).await {
        println!(
            "{} Generated {} ({}) {}",
            style("✓").green().bold(),
            cli.mode.label(),
            provider.name(),
            style("(cached)").dim()
        );
        cached
    } else {
        let spinner = create_spinner(&format!(
            "Generating {} with {}...",
            cli.mode.label(),
            provider.name()
        ));
        let generated = run_generation(&cli, &provider, &transcript, &progress).await?;
        store_result(&generated, &provider, &cache_dir).await;
        spinner.finish_with_message(format!(
            "{} Generated {} ({}) {}",
            style("✓").green().bold(),
            cli.mode.label(),
            provider.name(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        generated
    };

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    println!("{}", generated.readable());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let provider: Provider = cli.provider.clone().into();

    // Validate API keys early, before any network work
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
    if cli.mode == Mode::Notes {
        // Show notes additionally need the search collaborator's keys.
        if let Err(e) = GoogleSearchClient::from_env() {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }

    let Some(locator) = cli.locator() else {
        eprintln!(
            "{} provide a video URL or --transcript FILE",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    };

    let cache_dir = konspekt_core::get_cache_dir(&locator);
    tokio::fs::create_dir_all(&cache_dir).await?;

    if cli.json {
        run_json(cli, provider, cache_dir).await
    } else {
        run_human(cli, provider, cache_dir).await
    }
}
