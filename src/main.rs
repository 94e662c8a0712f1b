use nyiso_synth::config::Config;
use nyiso_synth::pipeline;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nyiso_synth=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "generate".to_string());
    let config_path =
        std::env::var("NYISO_SYNTH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load configuration from {}: {}\n\n\
                 Make sure:\n\
                 1. The file is valid YAML (see config/config.yaml)\n\
                 2. All referenced environment variables are set\n\
                 3. Create a .env file if needed",
                config_path,
                e
            )
        })?
    } else {
        info!("No config file at {}, using defaults", config_path);
        Config::default()
    };

    match command.as_str() {
        "generate" => {
            let result = pipeline::run(&config).await.map_err(|e| {
                error!("Generation failed: {}", e);
                anyhow::anyhow!("Failed to generate tables: {}", e)
            })?;
            info!(
                "Generated {} power, {} temperature, {} solar and {} merged rows",
                result.tables.power.len(),
                result.tables.temperature.len(),
                result.tables.solar.len(),
                result.merged.len()
            );
        }
        "merge" => {
            let merged = pipeline::run_merge_only(&config)?;
            info!(
                "Merged {} rows into {}",
                merged.len(),
                config.output.merged_path().display()
            );
        }
        other => {
            anyhow::bail!("Unknown command '{}', expected 'generate' or 'merge'", other);
        }
    }

    Ok(())
}
