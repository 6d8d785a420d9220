mod cli;

use anyhow::Result;
use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Commands};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::{Path, PathBuf};

use vg_imaging::{Outcome, TranscodeInput};
use vrgate::config;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting vrgate");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Metrics recorder not installed: {}", e);
            None
        }
    };

    vg_server::start(config, metrics).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vrgate=trace,vg_server=trace,vg_imaging=debug,vg_core=debug,tower_http=debug".to_string()
        } else {
            "vrgate=info,vg_server=info,vg_imaging=info,vg_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Transcode {
            input,
            output,
            content_type,
        } => transcode_file(&input, output, content_type),
        Commands::GenerateToken => generate_token(),
        Commands::Version => {
            println!("vrgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Origin: {}", config.origin.base_url());
    println!("  Credential header: {}", config.origin.credential_header);
    println!("  Health endpoint: {}", config.origin.graphql_endpoint());
    match config.timeouts.transfer() {
        Some(t) => println!("  Transfer timeout: {}s", t.as_secs()),
        None => println!("  Transfer timeout: unbounded"),
    }
    println!("  Probe timeout: {}s", config.timeouts.probe_secs);
    println!(
        "  Concurrent transcodes: {}",
        config.images.transcode_permits()
    );
    println!("  Auth enabled: {}", config.auth.enabled);

    for warning in config.validate() {
        println!("  ! {}", warning);
    }

    Ok(())
}

fn transcode_file(
    input: &Path,
    output: Option<PathBuf>,
    content_type: Option<String>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let data = std::fs::read(input)?;
    let content_type = content_type.unwrap_or_else(|| guess_image_type(input).to_string());
    let input_len = data.len();

    let result = vg_imaging::transcode(TranscodeInput {
        bytes: Bytes::from(data),
        content_type,
    });

    match &result.outcome {
        Outcome::Transcoded => println!("Transcoded to {}", result.content_type),
        Outcome::Passthrough(reason) => println!("Passed through unchanged ({})", reason),
    }
    if let Some(dims) = result.dimensions {
        println!("Size: {}x{}", dims.width, dims.height);
    }
    println!("Bytes: {} -> {}", input_len, result.bytes.len());

    let output = output.unwrap_or_else(|| input.with_extension("vrgate.jpg"));
    if result.is_transcoded() {
        std::fs::write(&output, &result.bytes)?;
        println!("Wrote {}", output.display());
    }

    Ok(())
}

fn guess_image_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn generate_token() -> Result<()> {
    let bytes: [u8; 32] = rand::random();
    println!("{}", hex::encode(bytes));
    Ok(())
}
