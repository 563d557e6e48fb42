//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod execution;
mod package;
mod template;
mod variables;

pub use execution::ExecutionCommands;
pub use package::PackageCommands;
pub use template::TemplateCommands;
pub use variables::VariableCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Execution management
    Execution {
        #[command(subcommand)]
        command: ExecutionCommands,
    },
    /// Template management
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Variable set management
    Variables {
        #[command(subcommand)]
        command: VariableCommands,
    },
    /// Package management
    Package {
        #[command(subcommand)]
        command: PackageCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Execution { command } => {
            execution::handle_execution_command(command, config).await
        }
        Commands::Template { command } => template::handle_template_command(command, config).await,
        Commands::Variables { command } => {
            variables::handle_variable_command(command, config).await
        }
        Commands::Package { command } => package::handle_package_command(command, config).await,
    }
}

/// Parse a single key=value pair
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;

    if key.trim().is_empty() {
        anyhow::bail!("invalid KEY=value: empty key in `{}`", s);
    }

    Ok((key.trim().to_string(), value.to_string()))
}

/// Print a variable map sorted by key
pub(crate) fn print_values<'a>(values: impl IntoIterator<Item = (&'a String, &'a String)>) {
    let mut values: Vec<_> = values.into_iter().collect();
    values.sort();
    for (key, value) in values {
        println!("  {} = {}", key.cyan(), value);
    }
}
