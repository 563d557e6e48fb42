//! Package command handlers
//!
//! Pushing archives consumed by `Archive` steps and fetching them back.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use courier_client::OrchestratorClient;
use std::path::Path;

use crate::config::Config;

/// Package subcommands
#[derive(Subcommand)]
pub enum PackageCommands {
    /// Upload a package version; replaces an earlier upload of it
    Push {
        /// Path to the archive
        path: String,

        #[arg(short, long)]
        version: String,

        /// Stored file name (defaults to the file name of the path)
        #[arg(short, long)]
        name: Option<String>,

        #[arg(long, default_value = "application/zip")]
        content_type: String,
    },
    /// Download a package; latest version when none is given
    Get {
        file_name: String,

        #[arg(short, long)]
        version: Option<String>,

        /// Where to write the body (defaults to the file name)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List all package versions
    List,
}

/// Handle package commands
pub async fn handle_package_command(command: PackageCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        PackageCommands::Push {
            path,
            version,
            name,
            content_type,
        } => push_package(&client, &path, &version, name, &content_type).await,
        PackageCommands::Get {
            file_name,
            version,
            output,
        } => get_package(&client, &file_name, version.as_deref(), output).await,
        PackageCommands::List => list_packages(&client).await,
    }
}

async fn push_package(
    client: &OrchestratorClient,
    path: &str,
    version: &str,
    name: Option<String>,
    content_type: &str,
) -> Result<()> {
    let file_name = match name {
        Some(name) => name,
        None => Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a file name from {}", path))?,
    };

    let body = std::fs::read(path).with_context(|| format!("Failed to read package: {}", path))?;
    let size = body.len();
    let id = client
        .upload_package(&file_name, version, content_type, body)
        .await?;

    println!("{}", "✓ Package uploaded successfully!".green().bold());
    println!("  ID:   {}", id.cyan());
    println!("  Size: {}", format!("{} bytes", size).dimmed());

    Ok(())
}

async fn get_package(
    client: &OrchestratorClient,
    file_name: &str,
    version: Option<&str>,
    output: Option<String>,
) -> Result<()> {
    let package = client.get_package(file_name, version).await?;
    let body = package
        .body
        .with_context(|| format!("Package {} came back without a body", package.id))?;

    let output = output.unwrap_or_else(|| package.file_name.clone());
    std::fs::write(&output, &body).with_context(|| format!("Failed to write {}", output))?;

    println!(
        "{} {} {}",
        "✓".green(),
        format!("{} version {}", package.file_name, package.version).bold(),
        format!("written to {} ({} bytes)", output, body.len()).dimmed()
    );

    Ok(())
}

async fn list_packages(client: &OrchestratorClient) -> Result<()> {
    let packages = client.list_packages().await?;

    if packages.is_empty() {
        println!("{}", "No packages found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} package version(s):", packages.len()).bold());
    println!();
    for package in packages {
        println!(
            "  {} {} {} {}",
            "▸".cyan(),
            package.file_name.bold(),
            package.version.cyan(),
            format!(
                "({}, uploaded {})",
                package.content_type,
                package.uploaded_at.format("%Y-%m-%d %H:%M:%S")
            )
            .dimmed()
        );
    }

    Ok(())
}
