mod cli;

use clipvault::{
    config,
    delivery::{DeliveryService, Precedence},
    server,
};
use clipvault_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn open_pool(config: &config::Config) -> Result<clipvault_db::pool::DbPool> {
    let db_path = config.database.path.to_string_lossy();
    tracing::info!("Opening database at {}", db_path);
    init_pool(&db_path).with_context(|| format!("Failed to open database {}", db_path))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Clipvault server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let pool = open_pool(&config)?;
    let result = server::start_server(config, pool).await;

    tracing::info!("Shutting down...");
    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipvault=trace,clipvault_db=debug,tower_http=debug".to_string()
        } else {
            "clipvault=debug,clipvault_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Locate { handle, slug, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(locate(&handle, slug, json, cli.config.as_deref()))
        }
        Commands::Version => {
            println!("clipvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn locate(handle: &str, slug: bool, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_pool(&config)?;
    let service = DeliveryService::from_config(&config, pool);

    let precedence = if slug {
        Precedence::SlugFirst
    } else {
        Precedence::IdFirst
    };
    let diagnosis = service.diagnose(handle, precedence).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
        return Ok(());
    }

    println!("Handle: {}", diagnosis.handle);
    println!("Lookup: {}", diagnosis.lookup.as_str());
    println!("Video: {} (version {}, {})", diagnosis.video_id, diagnosis.version, diagnosis.status);
    if let Some(ref slug) = diagnosis.slug {
        println!("Slug: {}", slug);
    }
    if let Some(ref url) = diagnosis.redirect {
        println!("Redirects to: {}", url);
    }
    match (&diagnosis.path, diagnosis.storage_strategy) {
        (Some(path), Some(strategy)) => {
            println!("File: {}", path.display());
            println!("Found by: {}", strategy);
            if let Some(size) = diagnosis.size {
                println!("Size: {} bytes", size);
            }
            if let Some(ref etag) = diagnosis.etag {
                println!("ETag: {}", etag);
            }
        }
        _ => {
            println!(
                "File: not found ({})",
                diagnosis.error.as_deref().unwrap_or("unknown")
            );
        }
    }

    println!("\nAttempted paths: {}", diagnosis.attempted.len());
    for (i, path) in diagnosis.attempted.iter().enumerate() {
        println!("  [{}] {}", i, path.display());
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Diagnostics: {}", config.server.diagnostics);
            println!("  Database: {}", config.database.path.display());
            println!("  Upload root: {}", config.storage.upload_root.display());
            println!("  Storage roots: {}", config.storage.roots.len());
            for root in &config.storage.roots {
                let marker = if root.path.is_dir() { "✓" } else { "✗" };
                println!("    {} {:?} {}", marker, root.kind, root.path.display());
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage roots: {}", config.storage.roots.len());
        }
    }

    Ok(())
}
