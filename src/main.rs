use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use transcribify_core::{ResolutionError, ResolutionKey, TranscriptProvider};
use transcribify_engine::ResolutionPipeline;
use transcribify_provider::{RapidApiConfig, RapidApiProvider, ReliableConfig, ReliableProvider};
use transcribify_settings::{ProviderSettings, TranscribifySettings};
use transcribify_store::{Database, PoolConfig, TranscriptRepo};
use transcribify_telemetry::TelemetryConfig;

#[derive(Parser)]
#[command(name = "transcribify", version, about = "Resolve YouTube transcripts through a local cache")]
struct Cli {
    /// Settings file (default: ~/.transcribify/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the transcript for a video as JSON, fetching it if not cached
    Resolve { video_id: String, language: String },
    /// Drop a cached transcript
    Forget { video_id: String, language: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code(&e)
        }
    }
}

/// 2 for a malformed request, 3 when no finder produced a transcript.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ResolutionError>() {
        Some(e) if e.is_client_error() => ExitCode::from(2),
        Some(e) if e.is_not_found() => ExitCode::from(3),
        _ => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings_path = cli
        .config
        .unwrap_or_else(transcribify_settings::settings_path);
    let settings = transcribify_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    transcribify_telemetry::init_telemetry(&TelemetryConfig {
        log_level: transcribify_telemetry::parse_level(&settings.logging.level)?,
        json: settings.logging.json,
        ..Default::default()
    })?;

    let base_dir = settings_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(transcribify_settings::settings_dir);
    let repo = open_store(&settings, &base_dir)?;

    match cli.command {
        Command::Resolve { video_id, language } => {
            settings.validate()?;
            let provider = build_provider(&settings.provider)?;
            let pipeline = ResolutionPipeline::standard(Arc::new(repo), provider);

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("interrupt received, cancelling resolution");
                        cancel.cancel();
                    }
                }
            });

            let record = pipeline.resolve_raw(&video_id, &language, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Forget { video_id, language } => {
            let key = ResolutionKey::new(video_id, language).map_err(ResolutionError::from)?;
            tokio::task::spawn_blocking({
                let key = key.clone();
                move || repo.delete(&key)
            })
            .await??;
            println!("forgot {key}");
        }
    }
    Ok(())
}

fn open_store(settings: &TranscribifySettings, base_dir: &Path) -> Result<TranscriptRepo> {
    let path = settings.store.resolve_db_path(base_dir);
    let config = PoolConfig {
        pool_size: settings.store.pool_size,
        busy_timeout_ms: settings.store.busy_timeout_ms,
        ..Default::default()
    };
    let db = Database::open(&path, &config)
        .with_context(|| format!("opening transcript database {}", path.display()))?;
    Ok(TranscriptRepo::new(db))
}

fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn TranscriptProvider>> {
    let mut config = RapidApiConfig::new(settings.api_key.clone());
    config.base_url = settings.base_url.clone();
    config.host = settings.host.clone();
    config.request_timeout = Duration::from_millis(settings.request_timeout_ms);
    config.connect_timeout = Duration::from_millis(settings.connect_timeout_ms);

    let reliable = ReliableConfig {
        max_retries: settings.max_retries,
        total_timeout: Duration::from_millis(settings.total_timeout_ms),
        ..Default::default()
    };
    Ok(Arc::new(ReliableProvider::new(
        RapidApiProvider::new(config)?,
        reliable,
    )))
}
