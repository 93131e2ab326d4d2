//! CLI for Retouch - one upload/transform/download session per invocation.

use clap::{Parser, ValueEnum};
use retouch::{GeminiClient, Mode, Session};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Remove backgrounds or enhance images via the Gemini API")]
#[command(version)]
struct Cli {
    /// Input image file (png, jpg, webp)
    input: PathBuf,

    /// Transformation to apply
    #[arg(short, long, value_enum)]
    mode: ModeArg,

    /// Directory to write the processed image into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// API key (falls back to the GOOGLE_API_KEY env var)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Remove the background, leaving the subject on transparency
    RemoveBackground,
    /// Improve sharpness, clarity, color balance, and lighting
    Enhance,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::RemoveBackground => Mode::RemoveBackground,
            ModeArg::Enhance => Mode::Enhance,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode: Mode = cli.mode.into();

    let mut builder = GeminiClient::builder();
    if let Some(key) = cli.api_key {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;

    let mut session = Session::new(client);
    session.upload_path(&cli.input)?;
    session.start_transform(mode).await;

    if let Some(message) = session.last_error() {
        anyhow::bail!("{message}");
    }

    let path = session.download(&cli.output_dir)?;

    if cli.json {
        let result = serde_json::json!({
            "success": true,
            "input": cli.input.display().to_string(),
            "mode": mode.to_string(),
            "output": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Processed {} ({}) -> {}",
            cli.input.display(),
            mode,
            path.display()
        );
    }

    Ok(())
}
