use digit::io::{decode_data_url, decode_grayscale, encode_png};
use digit::{
    Classifier, DigitError, NormalizeConfig, NormalizeReport, Normalizer, Recognition,
    RecognitionService, RecognizeRequest, RecognizeResponse,
};

use image::ImageFormat;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Digit(#[from] DigitError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Worker task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("Unsupported input '{0}'. Please use an image file or a .json recognize request")]
    UnsupportedInput(String),
}

/// A drawing handed to the CLI, either as an image file or a JSON request.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingInput {
    Image(Vec<u8>),
    Request(RecognizeRequest),
}

impl DrawingInput {
    /// Load a recognize request from a JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let request: RecognizeRequest = serde_json::from_str(content)?;
        Ok(Self::Request(request))
    }

    /// Auto-detect the input kind from the file extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => {
                Self::from_json(&fs::read_to_string(path_ref)?)
            }
            Some(ext) if ImageFormat::from_extension(ext).is_some() => {
                Ok(Self::Image(fs::read(path_ref)?))
            }
            _ => Err(CliError::UnsupportedInput(path_ref.display().to_string())),
        }
    }

    /// Encoded image bytes, with any data URL prefix removed.
    pub fn into_bytes(self) -> Result<Vec<u8>, CliError> {
        match self {
            Self::Image(bytes) => Ok(bytes),
            Self::Request(request) => Ok(decode_data_url(&request.image_base64)?),
        }
    }

    pub fn recognize<C: Classifier>(
        self,
        service: &RecognitionService<C>,
    ) -> Result<Recognition, CliError> {
        let bytes = self.into_bytes()?;
        Ok(service.recognize_bytes(&bytes)?)
    }
}

/// One line of `digit batch` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLine {
    pub input: String,
    #[serde(flatten)]
    pub response: RecognizeResponse,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: CliError,
}

/// Outcome of a batch run, both lists in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub lines: Vec<BatchLine>,
    pub failures: Vec<BatchFailure>,
}

/// Normalize a drawing file and write the canvas as PNG.
pub fn normalize_file(
    config: &NormalizeConfig,
    input: &Path,
    output: &Path,
) -> Result<NormalizeReport, CliError> {
    let image = decode_grayscale(&fs::read(input)?)?;
    let normalized = Normalizer::new(*config)?.normalize(&image)?;
    fs::write(output, encode_png(&normalized.image)?)?;

    info!("Normalized {} -> {}", input.display(), output.display());
    Ok(normalized.report)
}

/// Recognize every input on blocking workers sharing one service handle.
///
/// A drawing that fails is recorded in the report and does not stop the others.
pub async fn recognize_batch<C: Classifier + 'static>(
    service: &RecognitionService<C>,
    inputs: Vec<PathBuf>,
) -> Result<BatchReport, CliError> {
    let mut tasks = JoinSet::new();
    for (index, path) in inputs.into_iter().enumerate() {
        let service = service.clone();
        tasks.spawn_blocking(move || {
            let result = DrawingInput::from_file(&path)
                .and_then(|input| input.recognize(&service))
                .and_then(|recognition| recognition.to_response().map_err(CliError::from));
            (index, path, result)
        });
    }

    let mut finished = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        finished.push(joined?);
    }
    finished.sort_by_key(|(index, _, _)| *index);

    let mut report = BatchReport::default();
    for (_, path, result) in finished {
        match result {
            Ok(response) => report.lines.push(BatchLine {
                input: path.display().to_string(),
                response,
            }),
            Err(e) => {
                error!("Failed to recognize {}: {}", path.display(), e);
                report.failures.push(BatchFailure { input: path, error: e });
            }
        }
    }
    Ok(report)
}
