use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use reviewlens::storage::{load_all, read_analysis, write_per_platform};
use reviewlens::{
    build_provider, AnalysisPipeline, AspectScope, CheckpointStore, Config, Error,
    HttpSentimentClassifier, LLMProvider, PipelineConfig, ProviderKind, Report,
};

#[derive(Parser, Debug)]
#[command(name = "reviewlens")]
#[command(version = "0.1.0")]
#[command(about = "Annotate food-delivery reviews with aspect sentiment, subcategories and JTBD statements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the annotation pipeline over one or more review CSVs
    Analyze(AnalyzeArgs),
    /// Summarize a finished analysis table
    Report(ReportArgs),
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Review CSV files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output CSV (defaults to complete_analysis_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Platform label for every row (single input only)
    #[arg(long)]
    platform: Option<String>,

    /// Rows between checkpoints
    #[arg(long)]
    batch_size: Option<usize>,

    /// Chat provider (openai, anthropic)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Chat model override
    #[arg(long)]
    model: Option<String>,

    /// Aspects scored per review (all, tagged)
    #[arg(long, default_value = "all")]
    aspect_scope: AspectScope,

    #[arg(long)]
    skip_subcategories: bool,

    #[arg(long)]
    skip_jtbd: bool,

    #[arg(long)]
    no_checkpoints: bool,

    /// Continue from the latest matching checkpoint of the same output file
    #[arg(long, requires = "output")]
    resume: bool,

    /// Checkpoint directory (defaults to <output dir>/checkpoints)
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Also write one CSV per platform
    #[arg(long)]
    per_platform: bool,

    /// Print a markdown report when done
    #[arg(long)]
    report: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// Analysis CSV produced by `analyze`
    input: PathBuf,

    #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
    format: ReportFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("reviewlens=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => analyze(args).await,
        Command::Report(args) => report(args),
    }
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if args.model.is_some() {
        config.model = args.model.clone();
    }
    if let Some(batch_size) = args.batch_size.filter(|&n| n > 0) {
        config.batch_size = batch_size;
    }

    if args.platform.is_some() && args.inputs.len() > 1 {
        anyhow::bail!("--platform can only be used with a single input file");
    }

    let reviews = load_all(&args.inputs, args.platform.as_deref())?;
    tracing::info!("Loaded {} reviews from {} file(s)", reviews.len(), args.inputs.len());

    let output = args.output.clone().unwrap_or_else(default_output);
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let classifier = HttpSentimentClassifier::new(
        config.sentiment_endpoint.clone(),
        config.sentiment_api_token.clone(),
        timeout,
    )?;
    tracing::info!("Sentiment endpoint: {}", classifier.endpoint());

    let llm = if args.skip_subcategories && args.skip_jtbd {
        None
    } else {
        chat_provider(&config, timeout)?
    };

    let pipeline_config = PipelineConfig {
        aspect_scope: args.aspect_scope,
        save_checkpoints: !args.no_checkpoints,
        resume: args.resume,
        show_progress: !args.quiet,
        ..PipelineConfig::from(&config)
    };

    let mut pipeline = AnalysisPipeline::new(Arc::new(classifier), llm, pipeline_config);
    if !args.no_checkpoints || args.resume {
        pipeline = pipeline.with_checkpoints(CheckpointStore::for_output(
            &output,
            args.checkpoint_dir.clone(),
        ));
    }
    if args.skip_subcategories {
        pipeline = pipeline.skip_subcategories();
    }
    if args.skip_jtbd {
        pipeline = pipeline.skip_jtbd();
    }

    let result = pipeline.run(&reviews, &output).await?;

    if args.per_platform {
        for path in write_per_platform(&output, &result.rows)? {
            tracing::info!("Platform file written to: {}", path.display());
        }
    }

    if args.report {
        println!("{}", Report::from_rows(&result.rows).to_markdown());
    }

    Ok(())
}

/// Build the chat provider, or `None` when no API key is configured.
fn chat_provider(config: &Config, timeout: Duration) -> anyhow::Result<Option<Arc<dyn LLMProvider>>> {
    match build_provider(config.provider, config.api_key(), config.model.clone(), timeout) {
        Ok(provider) => Ok(Some(provider)),
        Err(Error::Config(msg)) => {
            tracing::warn!("{}; skipping subcategory and JTBD stages", msg);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn report(args: ReportArgs) -> anyhow::Result<()> {
    let rows = read_analysis(&args.input)?;
    tracing::info!("Loaded {} analyzed reviews from {}", rows.len(), args.input.display());

    let report = Report::from_rows(&rows);
    let output = match args.format {
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Markdown => report.to_markdown(),
    };

    write_or_print(args.output.as_deref(), &output)
}

fn write_or_print(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    if let Some(path) = path {
        std::fs::write(path, output)?;
        tracing::info!("Output written to: {}", path.display());
    } else {
        println!("{}", output);
    }
    Ok(())
}

fn default_output() -> PathBuf {
    PathBuf::from(format!(
        "complete_analysis_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}
