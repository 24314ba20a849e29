use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use helmetscan::{Overrides, Settings, YoloDetector, discover_images, run_images};

#[derive(Parser)]
#[command(name = "helmetscan")]
#[command(about = "Detect safety helmets in a folder of images and write a CSV report")]
struct Cli {
    /// Folder with input images (extra words are joined with spaces)
    #[arg(value_name = "INPUT_FOLDER", required = true, num_args = 1.., trailing_var_arg = true)]
    input: Vec<String>,

    /// Path to the detection model
    #[arg(short, long, value_name = "PATH", env = "HELMETSCAN_MODEL")]
    model: Option<PathBuf>,

    /// Output root directory [default: Result]
    #[arg(short, long, value_name = "DIR", env = "HELMETSCAN_OUTPUT")]
    output: Option<PathBuf>,

    /// CSV file name without extension [default: detection_results]
    #[arg(long, value_name = "NAME")]
    csv_name: Option<String>,

    /// Write into a subfolder of the output root named after the input folder
    #[arg(long)]
    per_input: bool,

    /// Confidence threshold; detections at or below it are ignored [default: 0.25]
    #[arg(short, long, value_name = "F")]
    threshold: Option<f32>,

    /// Resize images before detection, e.g. 640x480
    #[arg(long, value_name = "WxH")]
    resize: Option<String>,

    /// Classify only; save images without boxes
    #[arg(long)]
    no_annotate: bool,

    /// JSON config file
    #[arg(short, long, value_name = "FILE", env = "HELMETSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let input_folder = PathBuf::from(args.input.join(" "));

    let settings = Settings::load(
        args.config.as_deref(),
        Overrides {
            model_path: args.model,
            output_root: args.output,
            csv_file_name: args.csv_name,
            per_input_subfolder: args.per_input,
            confidence_threshold: args.threshold,
            resize: args.resize,
            no_annotate: args.no_annotate,
        },
    )
    .context("Failed to load configuration")?;

    // Check the input before paying for the model load
    let images = discover_images(&input_folder)?;

    let mut detector = YoloDetector::load(&settings.detector)?;

    let outcome = run_images(&images, &input_folder, &settings, &mut detector)
        .with_context(|| format!("Run over {} failed", input_folder.display()))?;

    println!("\n=== Helmet Detection Results ===");
    println!("Images processed: {}", outcome.report.results.len());
    println!("  Helmet:    {}", outcome.report.helmet_count());
    println!(
        "  No Helmet: {}",
        outcome.report.results.len() - outcome.report.helmet_count()
    );
    if !outcome.report.skipped.is_empty() {
        println!("Skipped: {}", outcome.report.skipped.len());
        for skipped in &outcome.report.skipped {
            println!("  {} - {}", skipped.name, skipped.reason);
        }
    }
    println!("Images saved to '{}'", outcome.images_dir.display());
    println!("CSV file saved to '{}'", outcome.csv_path.display());

    Ok(())
}
