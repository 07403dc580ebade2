//! Leaf Diagnosis server and CLI
//!
//! `serve` (the default) runs the upload web app; `predict` classifies images
//! from the command line with the same model and preprocessing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info, warn};

use leaf_diagnosis::server::{self, load_predictor, AppState};
use leaf_diagnosis::upload::allowed_file;
use leaf_diagnosis::utils::format_millis;
use leaf_diagnosis::utils::logging::{init_logging, LogConfig};
use leaf_diagnosis::{Predictor, ServerConfig};

/// Tomato leaf disease recognition
#[derive(Parser, Debug)]
#[command(name = "leaf-diagnosis")]
#[command(version)]
#[command(about = "Web front-end for tomato leaf disease recognition", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LEAF_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "LEAF_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// ONNX model artifact
    #[arg(long, env = "LEAF_MODEL", global = true)]
    model: Option<PathBuf>,

    /// Class names file (one label per line, in model output order)
    #[arg(long, env = "LEAF_CLASS_NAMES", global = true)]
    class_names: Option<PathBuf>,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web application
    Serve {
        /// Host to bind to
        #[arg(long, env = "LEAF_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "LEAF_PORT")]
        port: Option<u16>,

        /// Directory uploaded images are stored in
        #[arg(long, env = "LEAF_UPLOAD_DIR")]
        upload_dir: Option<PathBuf>,
    },

    /// Classify an image or every image in a directory
    Predict {
        /// Path to input image or directory
        #[arg(short, long)]
        input: PathBuf,

        /// Print results as JSON lines
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_flags(cli.verbose, cli.quiet, cli.log_level.as_deref());
    init_logging(&log_config)?;
    debug!("Log level: {}", log_config.level);

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_toml_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(class_names) = cli.class_names {
        config.class_names_path = class_names;
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        upload_dir: None,
    });

    match command {
        Commands::Serve {
            host,
            port,
            upload_dir,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(upload_dir) = upload_dir {
                config.upload_dir = upload_dir;
            }
            cmd_serve(config).await
        }
        Commands::Predict { input, json } => {
            let predictor = tokio::task::spawn_blocking(move || load_predictor(&config))
                .await
                .context("model loading task panicked")??;
            cmd_predict(&predictor, &input, json)
        }
    }
}

async fn cmd_serve(config: ServerConfig) -> Result<()> {
    info!("Leaf Diagnosis Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Model:       {:?}", config.model_path);
    info!("  Class names: {:?}", config.class_names_path);
    info!("  Upload dir:  {:?}", config.upload_dir);
    info!(
        "  Input:       {}x{} ({:?}, {:?})",
        config.preprocess.width,
        config.preprocess.height,
        config.preprocess.normalization,
        config.preprocess.layout
    );

    let addr = config.socket_addr()?;
    let state = tokio::task::spawn_blocking(move || AppState::load(config))
        .await
        .context("model loading task panicked")?
        .context("failed to load model")?;

    server::serve(Arc::new(state), addr).await?;
    Ok(())
}

fn cmd_predict(predictor: &Predictor, input: &Path, json: bool) -> Result<()> {
    let files = collect_images(input)?;
    if files.is_empty() {
        warn!("No .png/.jpg/.jpeg images found at {:?}", input);
        return Ok(());
    }

    for path in &files {
        match predictor.predict_file(path) {
            Ok(prediction) if json => {
                println!("{}", serde_json::to_string(&prediction)?);
            }
            Ok(prediction) => {
                let label = if prediction.healthy {
                    prediction.display_name.green().bold()
                } else {
                    prediction.display_name.red().bold()
                };
                println!(
                    "{} {} ({}%, {})",
                    format!("{}:", path.display()).cyan(),
                    label,
                    prediction.confidence_label(),
                    format_millis(prediction.inference_time_ms)
                );
                for (i, score) in prediction.top_k.iter().enumerate().skip(1) {
                    println!(
                        "    {}. {} - {:.2}%",
                        i + 1,
                        score.display_name,
                        score.score * 100.0
                    );
                }
            }
            Err(e) => {
                println!("{} {}: {}", "Error:".red(), path.display(), e);
            }
        }
    }

    Ok(())
}

fn collect_images(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        anyhow::bail!("input path not found: {}", input.display());
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(allowed_file)
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}
