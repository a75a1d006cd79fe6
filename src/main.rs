mod cli;

use mediaforge::orchestrator::{stage_upload, Orchestrator};
use mediaforge::{config, jobs, probe};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mediaforge_common::JobStatus;
use std::path::Path;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaforge=trace,mediaforge_av=trace,mediaforge_common=debug".to_string()
        } else {
            "mediaforge=info,mediaforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            options,
            mime,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(&input, &options, mime, cli.config.as_deref()))
        }
        Commands::Identify { file, mime } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(identify_file(&file, mime, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediaforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Inline JSON, or `@path` to read the payload from a file.
fn read_options(raw: &str) -> Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("Options are not valid JSON")
}

async fn convert_file(
    input: &Path,
    raw_options: &str,
    mime: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let options = read_options(raw_options)?;
    let mime = mime.unwrap_or_else(|| jobs::guess_mime(input).to_string());
    let original = jobs::OriginalFile::from_path(input, mime)?;

    let orchestrator = Orchestrator::from_config(&config);
    // Options are checked before anything is copied.
    mediaforge_av::OptionSet::parse_and_validate(original.category(), &options)?;
    let upload = stage_upload(&config.storage.upload_dir, input).await?;
    let id = match orchestrator.submit(original, options, upload.clone()) {
        Ok(id) => id,
        Err(e) => {
            let _ = tokio::fs::remove_file(&upload).await;
            return Err(e.into());
        }
    };
    println!("Job {} accepted", id);

    let mut last_progress = None;
    let job = loop {
        let job = orchestrator.status(id)?;
        if last_progress != Some(job.progress) {
            println!("  {:>3}% {}", job.progress, job.status);
            last_progress = Some(job.progress);
        }
        if job.is_terminal() {
            break job;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };
    orchestrator.shutdown().await;

    match job.status {
        JobStatus::Completed => {
            if let Some(ref output) = job.output_path {
                println!("\nConversion complete!");
                println!("Output: {}", output.display());
            }
            Ok(())
        }
        _ => anyhow::bail!(
            "Conversion failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

async fn identify_file(
    file: &Path,
    mime: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let mime = mime.unwrap_or_else(|| jobs::guess_mime(file).to_string());
    let identification = probe::identify(&config.tools.resolve(), file, &mime).await?;

    println!("{}", serde_json::to_string_pretty(&identification)?);
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = mediaforge_av::check_tools(&config.tools.resolve());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all conversions.");
    }

    Ok(())
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

    println!("  Upload dir: {}", config.storage.upload_dir.display());
    println!("  Output dir: {}", config.storage.output_dir.display());
    println!("  Relay capacity: {}", config.jobs.relay_capacity);
    println!("  Max job age: {}s", config.jobs.max_job_age_secs);

    Ok(())
}
