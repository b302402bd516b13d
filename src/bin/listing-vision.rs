//! CLI binary for listing-vision.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `analyze` runs one extraction on a local photo and prints the record.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use listing_vision::{build_app, ExtractionConfig, Extractor, ServerConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on 127.0.0.1:5000
  listing-vision serve

  # Describe a local photo
  listing-vision analyze img/foto3.jpg

  # Call the running service
  curl -F image=@img/foto3.jpg http://127.0.0.1:5000/analyze_image

  # Use another provider / model
  listing-vision --provider anthropic --model claude-sonnet-4-20250514 serve

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. listing_vision=debug
"#;

/// Describe second-hand products from a photo using a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "listing-vision",
    version,
    about = "Describe second-hand products from a photo using a Vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LISTING_VISION_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /analyze_image over HTTP.
    Serve(ServeArgs),
    /// Describe one local photo and print the JSON record.
    Analyze {
        /// Path to the photo.
        image: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Vision model ID.
    #[arg(long, global = true, env = "LISTING_VISION_MODEL", default_value = listing_vision::config::DEFAULT_MODEL)]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "LISTING_VISION_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "LISTING_VISION_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens per model call.
    #[arg(long, global = true, env = "LISTING_VISION_MAX_TOKENS", default_value_t = 256)]
    max_tokens: usize,

    /// Model calls allowed per photo, including the first.
    #[arg(long, global = true, env = "LISTING_VISION_ATTEMPTS", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..))]
    attempts: u32,

    /// Per-call model timeout in seconds.
    #[arg(long, global = true, env = "LISTING_VISION_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "LISTING_VISION_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Directory for transient uploads (created if missing).
    #[arg(long, env = "LISTING_VISION_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "LISTING_VISION_MAX_UPLOAD_MB", default_value_t = 16)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.model)?;
    let extractor = Extractor::from_config(config).context("Failed to initialise the model")?;

    match cli.command {
        Command::Serve(args) => serve(Arc::new(extractor), args).await,
        Command::Analyze { image, pretty } => {
            let record = extractor
                .extract_file(&image)
                .await
                .with_context(|| format!("Failed to describe {}", image.display()))?;
            let json = if pretty {
                serde_json::to_string_pretty(&record)
            } else {
                serde_json::to_string(&record)
            }
            .context("Failed to serialise record")?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(args: &ModelArgs) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&args.model)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .attempts(args.attempts)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }

    builder.build().context("Invalid configuration")
}

async fn serve(extractor: Arc<Extractor>, args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind_addr: args.bind,
        upload_dir: args.upload_dir,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
    };

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let app = build_app(extractor, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
