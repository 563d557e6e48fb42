//! Step executor
//!
//! Runs the pipeline of one execution: resolves its variables, runs the
//! template steps in order and reports each of them through the log
//! shipper. The first failing step ends the pipeline and carries the final
//! `Failed` result; otherwise the last step carries `Successed`.

use anyhow::Context;
use courier_core::domain::execution::ExecutionState;
use courier_core::domain::instance::Instance;
use courier_core::domain::template::{Step, StepType};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use super::archive;
use super::log_shipper::{EXECUTOR_STEP_ID, LogShipper};
use super::runner::{CommandRunner, RunOutput};
use super::variables::Variables;
use crate::config::Toolchain;
use crate::repository::ExecutionRepository;

/// Executes the steps of dispatched executions
pub struct StepExecutor {
    repository: Arc<dyn ExecutionRepository>,
    runner: Arc<dyn CommandRunner>,
    shipper: LogShipper,
    toolchain: Toolchain,
    default_folder: PathBuf,
}

impl StepExecutor {
    pub fn new(
        repository: Arc<dyn ExecutionRepository>,
        runner: Arc<dyn CommandRunner>,
        shipper: LogShipper,
        toolchain: Toolchain,
        default_folder: PathBuf,
    ) -> Self {
        Self {
            repository,
            runner,
            shipper,
            toolchain,
            default_folder,
        }
    }

    /// Runs an execution to completion
    ///
    /// Errors while setting the pipeline up are reported as a terminal
    /// failure of the execution.
    pub async fn run(&self, instance: &Instance, execution_id: i64) {
        info!("Starting execution {} on {}", execution_id, instance);

        if let Err(e) = self.execute(instance, execution_id).await {
            error!("Execution {} failed: {:#}", execution_id, e);
            self.shipper.log_error(execution_id, &e);
        }
    }

    async fn execute(&self, instance: &Instance, execution_id: i64) -> anyhow::Result<()> {
        let execution = self
            .repository
            .get_execution(execution_id)
            .await
            .with_context(|| format!("Failed to fetch execution {}", execution_id))?;

        let template = self
            .repository
            .get_template(execution.template_id)
            .await
            .with_context(|| format!("Failed to fetch template {}", execution.template_id))?;

        let variable_set = match execution.variable_set_id {
            Some(id) => Some(
                self.repository
                    .get_variable_set(id)
                    .await
                    .with_context(|| format!("Failed to fetch variable set {}", id))?,
            ),
            None => None,
        };

        let variables =
            Variables::resolve(variable_set.as_ref(), &execution.variable_overrides, instance);

        let steps = template.ordered_steps();
        if steps.is_empty() {
            self.shipper.log_step(
                execution_id,
                EXECUTOR_STEP_ID,
                &template.name,
                true,
                vec![format!("Template '{}' has no steps", template.name)],
                Some(ExecutionState::Succeeded),
            );
            return Ok(());
        }

        let last = steps.len() - 1;
        for (index, step) in steps.into_iter().enumerate() {
            let output = self.run_step(execution_id, step, &variables).await;

            let result = if !output.success {
                Some(ExecutionState::Failed)
            } else if index == last {
                Some(ExecutionState::Succeeded)
            } else {
                None
            };

            self.shipper.log_step(
                execution_id,
                step.order,
                &step.name,
                output.success,
                output.logs,
                result,
            );

            if !output.success {
                info!("Execution {} stopped at step {}", execution_id, step.order);
                return Ok(());
            }
        }

        info!("Execution {} finished all steps", execution_id);
        Ok(())
    }

    /// Runs one step; every failure ends up in the returned logs
    async fn run_step(&self, execution_id: i64, step: &Step, variables: &Variables) -> RunOutput {
        let mut logs = vec![format!("Starting step {}: '{}'", step.order, step.name)];

        let success = match self.try_run_step(step, variables, &mut logs).await {
            Ok(success) => success,
            Err(e) => {
                error!("Step {} of execution {} errored: {:#}", step.order, execution_id, e);
                logs.extend(e.chain().map(|cause| cause.to_string()));
                false
            }
        };

        if success {
            logs.push(format!("Step {} - '{}' finished", step.order, step.name));
            RunOutput::succeeded(logs)
        } else {
            logs.push(format!("Step '{}' failed.", step.name));
            RunOutput::failed(logs)
        }
    }

    async fn try_run_step(
        &self,
        step: &Step,
        variables: &Variables,
        logs: &mut Vec<String>,
    ) -> anyhow::Result<bool> {
        let command = if step.command.trim().is_empty() {
            String::new()
        } else {
            variables.substitute(&step.command)?
        };
        let working_folder = variables.substitute(&step.working_folder)?;

        let folder = resolve_folder(&self.default_folder, &working_folder);
        if !tokio::fs::try_exists(&folder).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&folder)
                .await
                .with_context(|| format!("Failed to create folder {}", folder.display()))?;
            logs.push(format!("Folder: '{}' created.", folder.display()));
        }
        logs.push(format!("Executing at folder: '{}'", folder.display()));

        let invocation = match step.step_type {
            StepType::Archive => return self.run_archive(step, &folder, variables, logs).await,
            StepType::Cmd => &self.toolchain.cmd,
            StepType::PShell => &self.toolchain.pshell,
            StepType::Docker => &self.toolchain.docker,
            StepType::DockerCompose => &self.toolchain.docker_compose,
        };

        let output = self.runner.run(invocation, &folder, &command).await;
        logs.extend(output.logs);
        Ok(output.success)
    }

    async fn run_archive(
        &self,
        step: &Step,
        folder: &Path,
        variables: &Variables,
        logs: &mut Vec<String>,
    ) -> anyhow::Result<bool> {
        let file_name = step
            .file_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .context("Archive step has no file name")?;
        let file_name = variables.substitute(file_name)?;

        let package = self
            .repository
            .get_package(&file_name, None)
            .await
            .with_context(|| format!("Failed to fetch package {}", file_name))?;
        let body = package
            .body
            .with_context(|| format!("Package {} has no body", package.id))?;

        let entries = archive::extract(body, folder).await?;
        logs.push(format!(
            "Extracted {} entries of {} version {}",
            entries, package.file_name, package.version
        ));

        logs.extend(archive::substitute_files(folder, variables).await?);
        Ok(true)
    }
}

/// Resolves a step folder against the default folder and normalises it
/// lexically (no symlink resolution)
pub fn resolve_folder(default_folder: &Path, working_folder: &str) -> PathBuf {
    let joined = default_folder.join(working_folder);
    let mut normalized = PathBuf::new();

    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::archive::zip_bytes;
    use crate::testing::{
        FakeRepository, FakeRunner, execution, step, template, wait_for_reports,
    };
    use courier_core::domain::variables::VariableSet;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        repository: Arc<FakeRepository>,
        runner: Arc<FakeRunner>,
        executor: StepExecutor,
        cancel: CancellationToken,
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let repository = Arc::new(FakeRepository::default());
        let runner = Arc::new(FakeRunner::default());
        let cancel = CancellationToken::new();
        let (shipper, _) = LogShipper::start(
            repository.clone(),
            "agent-1",
            Duration::from_millis(5),
            cancel.clone(),
        );
        let executor = StepExecutor::new(
            repository.clone(),
            runner.clone(),
            shipper,
            Toolchain::default(),
            root.clone(),
        );

        Harness {
            repository,
            runner,
            executor,
            cancel,
            _dir: dir,
            root,
        }
    }

    fn instance() -> Instance {
        Instance::new("Some", "Prod")
    }

    #[test]
    fn test_resolve_folder() {
        let root = Path::new("/srv/agent");
        assert_eq!(resolve_folder(root, "./Some"), PathBuf::from("/srv/agent/Some"));
        assert_eq!(resolve_folder(root, "a/../b/./c"), PathBuf::from("/srv/agent/b/c"));
        assert_eq!(resolve_folder(root, "/opt/app"), PathBuf::from("/opt/app"));
        assert_eq!(resolve_folder(root, ""), PathBuf::from("/srv/agent"));
        assert_eq!(resolve_folder(Path::new("."), ""), PathBuf::from("."));
        assert_eq!(resolve_folder(Path::new("."), "../x"), PathBuf::from("../x"));
    }

    #[tokio::test]
    async fn test_pipeline_reports_each_step_and_final_success() {
        let h = harness();
        h.repository.add_execution(execution(1, 10, None));
        h.repository.add_template(template(
            10,
            vec![
                step(2, StepType::Cmd, "echo second", "."),
                step(1, StepType::Cmd, "echo first", "./{Tenant}"),
            ],
        ));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 2).await;
        assert_eq!(reports[0].step_state.step_id, 1);
        assert_eq!(reports[0].result, None);
        assert_eq!(reports[1].step_state.step_id, 2);
        assert_eq!(reports[1].result, Some(ExecutionState::Succeeded));

        let calls = h.runner.calls();
        assert_eq!(calls[0].1, h.root.join("Some"));
        assert_eq!(calls[0].2, "echo first");
        assert!(h.root.join("Some").is_dir());

        let first_log = &reports[0].step_state.log;
        assert_eq!(first_log[0], "Starting step 1: 'step 1'");
        assert!(first_log.iter().any(|l| l.starts_with("Folder: '")));
        assert_eq!(first_log.last().unwrap(), "Step 1 - 'step 1' finished");
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_failing_step_short_circuits() {
        let h = harness();
        h.repository.add_execution(execution(1, 10, None));
        h.repository.add_template(template(
            10,
            vec![
                step(1, StepType::Cmd, "please fail", "."),
                step(2, StepType::Cmd, "echo never", "."),
            ],
        ));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(h.repository.reports().len(), 1);
        assert_eq!(reports[0].step_state.step_id, 1);
        assert!(!reports[0].step_state.success);
        assert_eq!(reports[0].result, Some(ExecutionState::Failed));
        assert_eq!(reports[0].step_state.log.last().unwrap(), "Step 'step 1' failed.");
        assert_eq!(h.runner.calls().len(), 1);
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_variables_reach_commands() {
        let h = harness();
        let mut exec = execution(1, 10, Some(5));
        exec.variable_overrides = HashMap::from([("ExecutionVariable".to_string(), "EV".to_string())]);
        h.repository.add_execution(exec);
        h.repository.add_variable_set(VariableSet {
            id: 5,
            instance: instance(),
            values: HashMap::from([("TemplateVariable".to_string(), "TV".to_string())]),
        });
        h.repository.add_template(template(
            10,
            vec![step(
                1,
                StepType::Cmd,
                "echo {Tenant}{Environment}{TemplateVariable}{ExecutionVariable}",
                ".",
            )],
        ));

        h.executor.run(&instance(), 1).await;
        wait_for_reports(&h.repository, 1).await;

        assert_eq!(h.runner.calls()[0].2, "echo SomeProdTVEV");
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_cyclic_variables_fail_the_step() {
        let h = harness();
        let mut exec = execution(1, 10, None);
        exec.variable_overrides = HashMap::from([
            ("A".to_string(), "{B}".to_string()),
            ("B".to_string(), "{A}".to_string()),
        ]);
        h.repository.add_execution(exec);
        h.repository.add_template(template(10, vec![step(1, StepType::Cmd, "echo {A}", ".")]));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 1).await;
        assert_eq!(reports[0].result, Some(ExecutionState::Failed));
        assert!(h.runner.calls().is_empty());
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_setup_error_reports_terminal_failure() {
        let h = harness();
        h.repository.add_execution(execution(1, 404, None));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 1).await;
        assert_eq!(reports[0].step_state.step_id, EXECUTOR_STEP_ID);
        assert_eq!(reports[0].step_state.step_name, "Failed to execute");
        assert_eq!(reports[0].result, Some(ExecutionState::Failed));
        assert_eq!(reports[0].step_state.log[0], "Failed to fetch template 404");
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_empty_template_succeeds() {
        let h = harness();
        h.repository.add_execution(execution(1, 10, None));
        h.repository.add_template(template(10, vec![]));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 1).await;
        assert!(reports[0].step_state.success);
        assert_eq!(reports[0].result, Some(ExecutionState::Succeeded));
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_archive_step_extracts_and_substitutes() {
        let h = harness();
        let mut exec = execution(1, 10, None);
        exec.variable_overrides = HashMap::from([("Caller".to_string(), "Johny".to_string())]);
        h.repository.add_execution(exec);
        h.repository.add_package(
            "somescript.zip",
            "1.0.1",
            zip_bytes(&[("somescript.sh", "echo \"{Caller}, It's Alive!!!\"")]),
        );

        let mut archive_step = step(1, StepType::Archive, "", "./{Tenant}");
        archive_step.file_name = Some("somescript.zip".to_string());
        h.repository.add_template(template(10, vec![archive_step]));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 1).await;
        assert!(reports[0].step_state.success, "{:?}", reports[0].step_state.log);
        let script = std::fs::read_to_string(h.root.join("Some/somescript.sh")).unwrap();
        assert_eq!(script, "echo \"Johny, It's Alive!!!\"");
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn test_missing_package_fails_the_step() {
        let h = harness();
        h.repository.add_execution(execution(1, 10, None));
        let mut archive_step = step(1, StepType::Archive, "", ".");
        archive_step.file_name = Some("missing.zip".to_string());
        h.repository.add_template(template(
            10,
            vec![archive_step, step(2, StepType::Cmd, "echo never", ".")],
        ));

        h.executor.run(&instance(), 1).await;

        let reports = wait_for_reports(&h.repository, 1).await;
        assert_eq!(reports[0].step_state.step_id, 1);
        assert_eq!(reports[0].result, Some(ExecutionState::Failed));
        assert!(
            reports[0]
                .step_state
                .log
                .iter()
                .any(|l| l == "Failed to fetch package missing.zip")
        );
        assert!(h.runner.calls().is_empty());
        h.cancel.cancel();
    }
}
