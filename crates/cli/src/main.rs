use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use face_anonymizer_core::blurring::infrastructure::face_box_blurrer::{BlurParams, FaceBoxBlurrer};
use face_anonymizer_core::detection::domain::eye_landmarks::EyeCornerIndices;
use face_anonymizer_core::detection::domain::face_detector::FaceDetector;
use face_anonymizer_core::detection::domain::face_landmarker::FaceLandmarker;
use face_anonymizer_core::detection::infrastructure::json_detections::JsonDetections;
use face_anonymizer_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use face_anonymizer_core::detection::infrastructure::onnx_face_mesh_landmarker::{
    OnnxFaceMeshLandmarker, DEFAULT_MIN_PRESENCE,
};
use face_anonymizer_core::io::infrastructure::memory_image_reader::MemoryImageReader;
use face_anonymizer_core::io::infrastructure::memory_image_writer::MemoryImageWriter;
use face_anonymizer_core::occlusion::infrastructure::red_line_occluder::RedLineOccluder;
use face_anonymizer_core::pipeline::anonymization_strategy::AnonymizationStrategy;
use face_anonymizer_core::pipeline::anonymize_image_use_case::AnonymizeImageUseCase;
use face_anonymizer_core::pipeline::pipeline_logger::LogPipelineLogger;
use face_anonymizer_core::shared::anonymization_mode::AnonymizationMode;
use face_anonymizer_core::shared::constants::{
    BLAZEFACE_MODEL_NAME, BLUR_KERNEL_SIZE, BLUR_SIGMA, BLUR_VERTICAL_SHIFT, DEFAULT_MAX_FACES,
    FACE_MESH_MODEL_NAME,
};
use face_anonymizer_core::shared::model_resolver;
use face_anonymizer_core::shared::upload::UploadedImage;

/// Blur faces or cover eyes in a JPEG or PNG photo.
#[derive(Parser, Debug)]
#[command(name = "face-anonymizer")]
struct Cli {
    /// Input image (.jpg, .jpeg or .png).
    input: PathBuf,

    /// Output file. Defaults to `<name>-<Mode>.<ext>` next to the input.
    output: Option<PathBuf>,

    /// Anonymization mode: face-blur or cover-eyes.
    #[arg(long, default_value = "face-blur")]
    mode: AnonymizationMode,

    /// JSON file with precomputed face boxes and eye landmarks (skips the models).
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Path to a BlazeFace short-range ONNX model.
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// URL to download the BlazeFace model from when it is not cached.
    #[arg(long)]
    face_model_url: Option<String>,

    /// Path to a face mesh ONNX model (cover-eyes only).
    #[arg(long)]
    mesh_model: Option<PathBuf>,

    /// URL to download the face mesh model from when it is not cached.
    #[arg(long)]
    mesh_model_url: Option<String>,

    /// Directory with bundled model files, searched after the user cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Maximum number of faces to landmark in cover-eyes mode.
    #[arg(long, default_value_t = DEFAULT_MAX_FACES)]
    max_faces: usize,

    /// Gaussian blur kernel size (must be odd).
    #[arg(long, default_value_t = BLUR_KERNEL_SIZE)]
    blur_kernel: usize,

    /// Gaussian blur sigma.
    #[arg(long, default_value_t = BLUR_SIGMA)]
    blur_sigma: f64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let strategy = build_strategy(&cli)?;
    let mut use_case = AnonymizeImageUseCase::new(
        Box::new(MemoryImageReader::new()),
        Box::new(MemoryImageWriter::default()),
        strategy,
        Box::new(LogPipelineLogger::new()),
    );

    let upload = UploadedImage {
        file_name: upload_name(&cli.input)?,
        bytes: fs::read(&cli.input)?,
    };
    let download = use_case.execute(&upload)?;

    let output = output_path(&cli.input, cli.output.as_deref(), &download.file_name);
    fs::write(&output, &download.bytes)?;
    log::info!(
        "Output written to {} ({}, {} bytes)",
        output.display(),
        download.mime_type,
        download.bytes.len()
    );
    Ok(())
}

fn build_strategy(cli: &Cli) -> Result<AnonymizationStrategy, Box<dyn std::error::Error>> {
    let eye_corners = EyeCornerIndices::default();
    let json = match &cli.detections {
        Some(path) => Some(JsonDetections::from_file(path, eye_corners)?),
        None => None,
    };

    match cli.mode {
        AnonymizationMode::FaceBlur => {
            let detector: Box<dyn FaceDetector> = match json {
                Some(dets) => Box::new(dets),
                None => build_face_detector(cli)?,
            };
            let blurrer = FaceBoxBlurrer::new(BlurParams {
                kernel_size: cli.blur_kernel,
                sigma: cli.blur_sigma,
                vertical_shift: BLUR_VERTICAL_SHIFT,
            });
            Ok(AnonymizationStrategy::face_blur(detector, Box::new(blurrer)))
        }
        AnonymizationMode::CoverEyes => {
            let landmarker: Box<dyn FaceLandmarker> = match json {
                Some(dets) => Box::new(dets),
                None => {
                    let mesh_model = model_path(
                        cli.mesh_model.as_deref(),
                        FACE_MESH_MODEL_NAME,
                        cli.mesh_model_url.as_deref(),
                        cli.models_dir.as_deref(),
                    )?;
                    Box::new(OnnxFaceMeshLandmarker::new(
                        &mesh_model,
                        build_face_detector(cli)?,
                        cli.max_faces,
                        DEFAULT_MIN_PRESENCE,
                    )?)
                }
            };
            Ok(AnonymizationStrategy::cover_eyes(
                landmarker,
                Box::new(RedLineOccluder::default()),
                eye_corners,
            ))
        }
    }
}

fn build_face_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let face_model = model_path(
        cli.face_model.as_deref(),
        BLAZEFACE_MODEL_NAME,
        cli.face_model_url.as_deref(),
        cli.models_dir.as_deref(),
    )?;
    Ok(Box::new(OnnxBlazefaceDetector::new(&face_model, cli.confidence)?))
}

/// An explicit path wins; otherwise the model is resolved by name.
fn model_path(
    explicit: Option<&Path>,
    name: &str,
    url: Option<&str>,
    models_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    log::info!("Resolving model: {name}");
    let label = name.to_string();
    let path = model_resolver::resolve(
        name,
        url,
        models_dir,
        Some(Box::new(move |downloaded, total| {
            download_progress(&label, downloaded, total)
        })),
    )?;
    if url.is_some() {
        eprintln!();
    }
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.blur_kernel == 0 || cli.blur_kernel % 2 == 0 {
        return Err(format!(
            "Blur kernel must be a positive odd integer, got {}",
            cli.blur_kernel
        )
        .into());
    }
    if cli.blur_sigma.is_nan() || cli.blur_sigma < 0.0 {
        return Err(format!("Blur sigma must be non-negative, got {}", cli.blur_sigma).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.max_faces == 0 {
        return Err("Max faces must be at least 1".into());
    }
    if cli.face_model.is_some() && cli.face_model_url.is_some() {
        return Err("--face-model and --face-model-url are mutually exclusive".into());
    }
    if cli.mesh_model.is_some() && cli.mesh_model_url.is_some() {
        return Err("--mesh-model and --mesh-model-url are mutually exclusive".into());
    }
    for path in [&cli.face_model, &cli.mesh_model, &cli.detections].into_iter().flatten() {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn upload_name(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Input path has no usable file name: {}", input.display()).into())
}

fn output_path(input: &Path, output: Option<&Path>, download_name: &str) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => input.with_file_name(download_name),
    }
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
