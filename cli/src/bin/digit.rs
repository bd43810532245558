use burn::backend::NdArray;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use digit::classifier::mlp::DEFAULT_HIDDEN_SIZE;
use digit::{
    Exclusive, MlpClassifier, RecognitionService, RecognizeRequest, RecognizeResponse,
    RecognizerConfig,
};
use digit_cli::{DrawingInput, normalize_file, recognize_batch};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

type Service = RecognitionService<Exclusive<MlpClassifier<NdArray>>>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recognizer configuration (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a drawing to the 28x28 classifier layout
    Normalize {
        /// Path to the drawing
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the normalized PNG
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Recognize one drawing (image file or JSON request)
    Recognize {
        #[arg(short, long)]
        input: PathBuf,
        /// Classifier weights saved as a named MessagePack record
        #[arg(short, long)]
        model: PathBuf,
        #[arg(long, default_value_t = DEFAULT_HIDDEN_SIZE)]
        hidden_size: usize,
        /// Number of scores to report
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Recognize many drawings concurrently with one loaded classifier
    Batch {
        /// Drawings to recognize (image files or JSON requests)
        #[arg(short, long, num_args = 1.., required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        model: PathBuf,
        #[arg(long, default_value_t = DEFAULT_HIDDEN_SIZE)]
        hidden_size: usize,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Print JSON schemas for requests, responses and configuration
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RecognizerConfig::from_file(path)?,
        None => RecognizerConfig::default(),
    };

    match cli.command {
        Commands::Normalize { input, output } => {
            normalize(&config, &input, &output)?;
        }
        Commands::Recognize { input, model, hidden_size, top_k } => {
            if let Some(k) = top_k {
                config.top_k = k;
            }
            recognize(config, &input, &model, hidden_size)?;
        }
        Commands::Batch { inputs, model, hidden_size, top_k } => {
            if let Some(k) = top_k {
                config.top_k = k;
            }
            batch(config, inputs, &model, hidden_size).await?;
        }
        Commands::Schema => {
            let schemas = serde_json::json!({
                "request": schemars::schema_for!(RecognizeRequest),
                "response": schemars::schema_for!(RecognizeResponse),
                "config": schemars::schema_for!(RecognizerConfig),
            });
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
    }

    Ok(())
}

fn start_service(config: RecognizerConfig, model: &Path, hidden_size: usize) -> Result<Service> {
    let classifier = MlpClassifier::<NdArray>::load(model, hidden_size, Default::default())?;
    Ok(RecognitionService::start(Exclusive::new(classifier), config)?)
}

fn normalize(config: &RecognizerConfig, input: &Path, output: &Path) -> Result<()> {
    let report = normalize_file(&config.normalize, input, output)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn recognize(
    config: RecognizerConfig,
    input: &Path,
    model: &Path,
    hidden_size: usize,
) -> Result<()> {
    let service = start_service(config, model, hidden_size)?;
    let response = DrawingInput::from_file(input)?
        .recognize(&service)?
        .to_response()?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    service.shutdown();
    Ok(())
}

async fn batch(
    config: RecognizerConfig,
    inputs: Vec<PathBuf>,
    model: &Path,
    hidden_size: usize,
) -> Result<()> {
    let service = start_service(config, model, hidden_size)?;
    let total = inputs.len();

    let report = recognize_batch(&service, inputs).await?;
    for line in &report.lines {
        println!("{}", serde_json::to_string(line)?);
    }

    service.shutdown();
    let failures = report.failures.len();
    info!("Recognized {} of {} drawings", total - failures, total);

    if failures > 0 {
        return Err(eyre!("{failures} of {total} drawings failed"));
    }
    Ok(())
}
