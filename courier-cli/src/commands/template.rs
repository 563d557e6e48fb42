//! Template command handlers
//!
//! Templates are authored as JSON files (`{"name": ..., "steps": [...]}`)
//! and managed through these commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use courier_client::OrchestratorClient;
use courier_core::domain::template::{Step, StepType, Template};
use courier_core::dto::template::CreateTemplate;

use crate::config::Config;

/// Template subcommands
#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Create a template from a JSON file
    Create {
        /// Path to the template JSON file
        #[arg(short, long)]
        file: String,

        /// Override the template name from the file
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List all templates
    List,
    /// Get template details
    Get { id: i64 },
    /// Delete a template
    Delete { id: i64 },
}

/// Handle template commands
pub async fn handle_template_command(command: TemplateCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        TemplateCommands::Create { file, name } => create_template(&client, &file, name).await,
        TemplateCommands::List => list_templates(&client).await,
        TemplateCommands::Get { id } => get_template(&client, id).await,
        TemplateCommands::Delete { id } => delete_template(&client, id).await,
    }
}

async fn create_template(
    client: &OrchestratorClient,
    path: &str,
    name_override: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file: {}", path))?;
    let mut req = parse_template(&content)
        .with_context(|| format!("Failed to parse template file: {}", path))?;

    if let Some(name) = name_override {
        req.name = name;
    }

    let template = client.create_template(&req).await?;

    println!("{}", "✓ Template created successfully!".green().bold());
    println!("  ID:    {}", template.id.to_string().cyan());
    println!("  Name:  {}", template.name.bold());
    println!(
        "  Steps: {}",
        template
            .ordered_steps()
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
            .dimmed()
    );

    Ok(())
}

fn parse_template(content: &str) -> Result<CreateTemplate> {
    let req: CreateTemplate = serde_json::from_str(content)?;
    if req.name.trim().is_empty() {
        anyhow::bail!("template has no name");
    }
    Ok(req)
}

async fn list_templates(client: &OrchestratorClient) -> Result<()> {
    let templates = client.list_templates().await?;

    if templates.is_empty() {
        println!("{}", "No templates found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} template(s):", templates.len()).bold());
    println!();
    for template in templates {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            template.name.bold(),
            format!("(id {}, {} steps)", template.id, template.steps.len()).dimmed()
        );
    }

    Ok(())
}

async fn get_template(client: &OrchestratorClient, id: i64) -> Result<()> {
    let template = client.get_template(id).await?;
    print_template_details(&template);
    Ok(())
}

async fn delete_template(client: &OrchestratorClient, id: i64) -> Result<()> {
    client.delete_template(id).await?;
    println!("{}", format!("✓ Template {} deleted", id).green());
    Ok(())
}

fn print_template_details(template: &Template) {
    println!("{}", "Template Details:".bold());
    println!("  ID:      {}", template.id.to_string().cyan());
    println!("  Name:    {}", template.name);
    println!(
        "  Created: {}",
        template.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated: {}",
        template.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if template.steps.is_empty() {
        println!("\n{}", "No steps.".yellow());
        return;
    }

    println!("\n{}", "Steps:".bold());
    for step in template.ordered_steps() {
        print_step(step);
    }
}

fn print_step(step: &Step) {
    println!(
        "  {} {} {}",
        format!("{}.", step.order).dimmed(),
        step.name.bold(),
        format!("[{}]", step.step_type).cyan()
    );
    println!("      Folder:  {}", step.working_folder);
    match step.step_type {
        StepType::Archive => {
            println!(
                "      Package: {}",
                step.file_name.as_deref().unwrap_or("-")
            );
        }
        _ => println!("      Command: {}", step.command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template_file() {
        let req = parse_template(
            r#"{
                "name": "deploy",
                "steps": [
                    {"order": 1, "name": "unpack", "type": "Archive",
                     "working_folder": "./{Tenant}", "file_name": "app.zip"},
                    {"order": 2, "name": "run", "type": "CMD",
                     "command": "sh ./run.sh", "working_folder": "./{Tenant}"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(req.name, "deploy");
        assert_eq!(req.steps.len(), 2);
        assert_eq!(req.steps[0].step_type, StepType::Archive);
        assert_eq!(req.steps[1].step_type, StepType::Cmd);
    }

    #[test]
    fn test_parse_template_requires_name() {
        assert!(parse_template(r#"{"steps": []}"#).is_err());
        assert!(parse_template("not json").is_err());
    }
}
