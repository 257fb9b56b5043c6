//! cdn-release CLI
//!
//! Gate, bundle and publish a client-side library to GitHub and jsDelivr

use anyhow::Result;
use cdn_release::core::{ConfigLoadOptions, ConfigLoader, ReleaseError};
use cdn_release::orchestration::{ConsoleReporter, ReleasePipeline, Reporter};
use cdn_release::publish::GitHubCoordinator;
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Gate, bundle and publish a client-side library to the CDN
#[derive(Parser)]
#[command(name = "cdn-release")]
#[command(version)]
#[command(about = "Gate, bundle and publish a client-side library to the CDN", long_about = None)]
struct Cli {
    /// Project path (defaults to current directory)
    #[arg(value_name = "PROJECT_PATH", default_value = ".")]
    project_path: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli.project_path).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            if let Some(release_error) = e.downcast_ref::<ReleaseError>() {
                for action in release_error.suggested_actions() {
                    eprintln!("  💡 {}", action);
                }
            }
            process::exit(1);
        }
    }
}

async fn run(project_path: PathBuf) -> Result<i32> {
    let options = ConfigLoadOptions {
        project_path: project_path.clone(),
        env: env::vars().collect(),
    };
    let config = ConfigLoader::load(options).await?;

    let validation = ConfigLoader::validate(&config);
    if !validation.valid {
        println!("{}", ConfigLoader::format_validation_result(&validation));
        return Ok(1);
    }
    for warning in &validation.warnings {
        println!("⚠️  [{}] {}", warning.field, warning.message);
    }

    let config = Arc::new(config);
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new());
    let coordinator = Arc::new(GitHubCoordinator::new(
        Arc::clone(&config),
        &project_path,
        Arc::clone(&reporter),
    )?);

    let pipeline = ReleasePipeline::new(
        Arc::clone(&config),
        &project_path,
        reporter,
        coordinator,
    );
    let result = pipeline.run().await?;

    if result.is_success() {
        println!("\n🌐 CDN URL: {}", config.cdn_url());
        println!("📦 GitHub: {}", config.repository_url());
    }

    Ok(result.exit_code())
}
