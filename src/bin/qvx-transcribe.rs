use anyhow::{Context, Result};
use clap::Parser;
use querivox_core::AppConfig;
use querivox_speech::{SpeechClient, Transcriber};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "qvx-transcribe",
    about = "Transcribe an audio file with the managed speech service"
)]
struct Cli {
    /// Local file path or gs:// URI of the audio to recognize
    path: String,

    /// Path to an optional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let client = SpeechClient::from_config(&config.speech)?;
    let transcriber = Transcriber::from_config(client, &config.speech);

    let mut stdout = std::io::stdout().lock();
    transcriber
        .run(&cli.path, &mut stdout)
        .await
        .context("transcription failed")?;
    Ok(())
}
