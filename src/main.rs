use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use affodent::{
    CommandDetector, Detector, JsonDetector, PatientInfo, ScreeningConfig, ScreeningSession, Sex,
    export_report,
};

#[derive(Parser)]
#[command(name = "affodent")]
#[command(about = "Screen intraoral photos for dental conditions and write a PDF report")]
#[command(group(ArgGroup::new("detector").required(true).args(["detections_dir", "detector_cmd"])))]
struct Cli {
    /// Intraoral photos (jpg, jpeg or png)
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Patient name
    #[arg(long)]
    name: String,

    /// Patient age
    #[arg(long, default_value = "")]
    age: String,

    /// Patient sex
    #[arg(long, value_enum)]
    sex: Option<Sex>,

    /// Chief complaint
    #[arg(long, default_value = "")]
    complaint: String,

    /// Medical history
    #[arg(long, default_value = "")]
    history: String,

    /// Directory holding `<image stem>.detections.json` files from an earlier inference run
    #[arg(long, value_name = "DIR")]
    detections_dir: Option<PathBuf>,

    /// Inference command, called once per image with the image path appended
    #[arg(long, value_name = "CMD")]
    detector_cmd: Option<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum detection confidence (overrides the config file)
    #[arg(long, value_name = "THRESHOLD")]
    conf: Option<f32>,

    /// Directory the report is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "affodent=debug" } else { "affodent=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => ScreeningConfig::load(path)?,
        None => ScreeningConfig::default(),
    };
    if let Some(conf) = args.conf {
        config.confidence_threshold = conf;
        config.validate()?;
    }

    let detector: Arc<dyn Detector> = match (&args.detections_dir, &args.detector_cmd) {
        (Some(dir), _) => Arc::new(JsonDetector::new().with_dir(dir)),
        (None, Some(cmd)) => Arc::new(CommandDetector::from_command_line(cmd)?),
        (None, None) => anyhow::bail!("either --detections-dir or --detector-cmd is required"),
    };

    let mut session = ScreeningSession::from_config(detector, &config)?;
    if let Some(debug_dir) = args.debug_out {
        session = session.with_debug(debug_dir)?;
    }

    let screened = session.screen_all(&args.images).await?;

    println!("\n=== Screening Results ===");
    for item in &screened {
        println!("{}", item.source_path.display());
        if item.findings.is_empty() {
            println!("  No abnormalities detected.");
        }
        for finding in &item.findings {
            println!(
                "  {} at {} - confidence: {:.2}",
                finding.label, finding.tooth, finding.confidence
            );
        }
    }

    let patient = PatientInfo {
        name: args.name,
        age: args.age,
        sex: args.sex.map(|s| s.to_string()).unwrap_or_default(),
        chief_complaint: args.complaint,
        medical_history: args.history,
    };

    let document = session.generate_report(&patient, &screened).await?;
    let saved = export_report(&document, &args.out)?;
    println!("\nReport ({} pages): {}", document.page_count(), saved.display());

    Ok(())
}
