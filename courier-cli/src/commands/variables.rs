//! Variable set command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use courier_client::OrchestratorClient;
use courier_core::domain::instance::Instance;
use courier_core::domain::variables::VariableSet;
use courier_core::dto::variables::CreateVariableSet;
use std::collections::HashMap;

use super::{parse_key_val, print_values};
use crate::config::Config;

/// Variable set subcommands
#[derive(Subcommand)]
pub enum VariableCommands {
    /// Create a variable set for an instance
    Create {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        environment: String,

        /// JSON file with a flat `{"Key": "value"}` object
        #[arg(short, long)]
        file: Option<String>,

        /// Values as key=value pairs; win over the file
        #[arg(short, long = "var", value_parser = parse_key_val)]
        var: Vec<(String, String)>,
    },
    /// Get a variable set
    Get { id: i64 },
    /// Find the variable sets of an instance
    Find {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        environment: String,
    },
}

/// Handle variable set commands
pub async fn handle_variable_command(command: VariableCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        VariableCommands::Create {
            tenant,
            environment,
            file,
            var,
        } => {
            let mut values = match file {
                Some(path) => read_values(&path)?,
                None => HashMap::new(),
            };
            values.extend(var);

            let req = CreateVariableSet {
                instance: Instance::new(tenant, environment),
                values,
            };
            create_variable_set(&client, req).await
        }
        VariableCommands::Get { id } => {
            let set = client.get_variable_set(id).await?;
            print_variable_set(&set);
            Ok(())
        }
        VariableCommands::Find {
            tenant,
            environment,
        } => find_variable_sets(&client, &Instance::new(tenant, environment)).await,
    }
}

fn read_values(path: &str) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read variables file: {}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Variables file {} is not a flat JSON object of strings", path))
}

async fn create_variable_set(client: &OrchestratorClient, req: CreateVariableSet) -> Result<()> {
    let set = client.create_variable_set(&req).await?;

    println!("{}", "✓ Variable set created successfully!".green().bold());
    println!("  ID:       {}", set.id.to_string().cyan());
    println!("  Instance: {}", set.instance.to_string().bold());
    println!("  Values:   {}", set.values.len().to_string().dimmed());

    Ok(())
}

async fn find_variable_sets(client: &OrchestratorClient, instance: &Instance) -> Result<()> {
    let sets = client.find_variable_sets(instance).await?;

    if sets.is_empty() {
        println!(
            "{}",
            format!("No variable sets found for {}.", instance).yellow()
        );
        return Ok(());
    }

    for set in sets {
        print_variable_set(&set);
        println!();
    }

    Ok(())
}

fn print_variable_set(set: &VariableSet) {
    println!(
        "{} {}",
        format!("Variable set {}", set.id).bold(),
        format!("({})", set.instance).dimmed()
    );
    if set.values.is_empty() {
        println!("  {}", "(no values)".dimmed());
    } else {
        print_values(&set.values);
    }
}
