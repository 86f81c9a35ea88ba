use clap::{Parser, Subcommand};
use pictor_core::{resolve, PictorConfig, TransformDescriptor};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "pictor")]
#[command(about = "On-demand image transformation proxy in front of object storage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Parse and resolve a descriptor, printing the processing parameters
    Inspect {
        /// Descriptor segment, e.g. `{md5}.crop.300x200.jpg`
        descriptor: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), PictorError> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => serve_command(config, host, port).await?,
        Commands::Inspect { descriptor } => inspect_command(&config, &descriptor)?,
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Defaults, then TOML, then `PICTOR_` variables, then the bare legacy variables.
fn load_config(config_path: Option<&Path>) -> Result<PictorConfig, ConfigError> {
    use figment::{
        providers::{Env, Format, Serialized, Toml},
        Figment,
    };

    let mut figment = Figment::from(Serialized::defaults(PictorConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    } else {
        figment = figment
            .merge(Toml::file("pictor.toml"))
            .merge(Toml::file("config/pictor.toml"));
    }

    figment = figment.merge(Env::prefixed("PICTOR_").split("__"));

    let mut config: PictorConfig = figment.extract()?;
    config.apply_legacy_env(|key| std::env::var(key).ok());

    Ok(config)
}

async fn serve_command(
    mut config: PictorConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), PictorError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!(
        "Starting pictor on {}:{}",
        config.server.host, config.server.port
    );

    let server = pictor_server::Server::new(config).await?;
    server.serve().await?;

    Ok(())
}

fn inspect_command(config: &PictorConfig, segment: &str) -> Result<(), PictorError> {
    let descriptor = TransformDescriptor::parse_with_limits(segment, config.transform.limits())?;
    let processing = resolve(&descriptor, &config.transform_options())?;

    let report = serde_json::json!({
        "descriptor": descriptor,
        "storage_key": descriptor.storage_key(),
        "mode": processing.mode(),
        "processing": processing,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum PictorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Core error: {0}")]
    Core(#[from] pictor_core::CoreError),
    #[error("Server error: {0}")]
    Server(#[from] pictor_server::ServerError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Figment error: {0}")]
    Figment(#[from] figment::Error),
}
