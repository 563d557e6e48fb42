//! Execution command handlers
//!
//! Creating executions for an instance and inspecting their progress.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use courier_client::OrchestratorClient;
use courier_core::domain::execution::{Execution, ExecutionState, StepState};
use courier_core::domain::instance::Instance;
use courier_core::dto::execution::{CreateExecution, ExecutionFilter};
use std::collections::HashMap;

use super::{parse_key_val, print_values};
use crate::config::Config;

/// Execution subcommands
#[derive(Subcommand)]
pub enum ExecutionCommands {
    /// Create an execution; supersedes pending ones of the same instance
    Create {
        /// Template id
        #[arg(short, long)]
        template: i64,

        /// Variable set id
        #[arg(short = 's', long)]
        variables: Option<i64>,

        #[arg(long)]
        tenant: String,

        #[arg(long)]
        environment: String,

        /// Variable overrides as key=value pairs
        #[arg(short, long = "var", value_parser = parse_key_val)]
        var: Vec<(String, String)>,
    },
    /// Get execution details with step logs
    Get {
        id: i64,

        /// Hide step logs
        #[arg(long)]
        no_logs: bool,
    },
    /// List executions, newest first
    List {
        #[arg(long)]
        tenant: Option<String>,

        #[arg(long)]
        environment: Option<String>,
    },
}

/// Handle execution commands
pub async fn handle_execution_command(command: ExecutionCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        ExecutionCommands::Create {
            template,
            variables,
            tenant,
            environment,
            var,
        } => {
            let req = CreateExecution {
                template_id: template,
                variable_set_id: variables,
                instance: Instance::new(tenant, environment),
                variable_overrides: var.into_iter().collect::<HashMap<_, _>>(),
            };
            create_execution(&client, req).await
        }
        ExecutionCommands::Get { id, no_logs } => get_execution(&client, id, !no_logs).await,
        ExecutionCommands::List {
            tenant,
            environment,
        } => list_executions(&client, ExecutionFilter { tenant, environment }).await,
    }
}

async fn create_execution(client: &OrchestratorClient, req: CreateExecution) -> Result<()> {
    let instance = req.instance.clone();
    let id = client.create_execution(&req).await?;

    println!("{}", "✓ Execution queued!".green().bold());
    println!("  ID:       {}", id.to_string().cyan());
    println!("  Instance: {}", instance.to_string().bold());
    println!(
        "  {}",
        "Pending executions of this instance were declined.".dimmed()
    );

    Ok(())
}

async fn get_execution(client: &OrchestratorClient, id: i64, show_logs: bool) -> Result<()> {
    let execution = client.get_execution(id).await?;
    print_execution_details(&execution, show_logs);
    Ok(())
}

async fn list_executions(client: &OrchestratorClient, filter: ExecutionFilter) -> Result<()> {
    let executions = client.list_executions(&filter).await?;

    if executions.is_empty() {
        println!("{}", "No executions found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} execution(s):", executions.len()).bold()
    );
    println!();
    for execution in executions {
        println!(
            "  {} Execution {}",
            "▸".cyan(),
            execution.id.to_string().dimmed()
        );
        println!("    Instance: {}", execution.instance);
        println!("    Template: {}", execution.template_id.to_string().dimmed());
        println!("    State:    {}", colorize_state(execution.state));
        println!(
            "    Created:  {}",
            execution
                .created_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
        println!();
    }

    Ok(())
}

fn print_execution_details(execution: &Execution, show_logs: bool) {
    println!("{}", "Execution Details:".bold());
    println!("  ID:           {}", execution.id.to_string().cyan());
    println!("  Instance:     {}", execution.instance);
    println!("  Template:     {}", execution.template_id);
    if let Some(set) = execution.variable_set_id {
        println!("  Variable Set: {}", set);
    }
    println!("  State:        {}", colorize_state(execution.state));
    println!("  Retries:      {}", execution.retry_count);
    println!(
        "  Created:      {}",
        execution.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:      {}",
        execution.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if !execution.variable_overrides.is_empty() {
        println!("\n{}", "Overrides:".bold());
        print_values(&execution.variable_overrides);
    }

    if execution.steps_states.is_empty() {
        println!("\n{}", "No steps reported yet.".yellow());
        return;
    }

    println!("\n{}", "Steps:".bold());
    for step in &execution.steps_states {
        print_step(step, show_logs);
    }
}

fn print_step(step: &StepState, show_logs: bool) {
    let marker = if step.success { "✓".green() } else { "✗".red() };

    println!(
        "  {} {} {} {}",
        marker,
        format!("[{}]", step.step_id).dimmed(),
        step.step_name.bold(),
        format!(
            "by {} at {}",
            step.executor,
            step.reported_at.format("%H:%M:%S")
        )
        .dimmed()
    );

    if show_logs {
        for line in &step.log {
            println!("      {}", line);
        }
    }
}

/// Colorize execution state for display
fn colorize_state(state: ExecutionState) -> colored::ColoredString {
    let text = state.to_string();
    match state {
        ExecutionState::Added => text.yellow(),
        ExecutionState::Retrying => text.cyan(),
        ExecutionState::Succeeded => text.green(),
        ExecutionState::Failed => text.red(),
        ExecutionState::Declined => text.dimmed(),
    }
}
