//! In-memory fakes shared by the unit tests

use async_trait::async_trait;
use courier_client::{ClientError, Result};
use courier_core::domain::execution::{Execution, ExecutionState, StepState};
use courier_core::domain::instance::Instance;
use courier_core::domain::package::Package;
use courier_core::domain::template::{Step, StepType, Template};
use courier_core::domain::variables::VariableSet;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::Invocation;
use crate::repository::ExecutionRepository;
use crate::service::log_shipper::StepReport;
use crate::service::runner::{CommandRunner, RunOutput};

#[derive(Default)]
pub struct FakeRepository {
    executions: Mutex<HashMap<i64, Execution>>,
    templates: Mutex<HashMap<i64, Template>>,
    variable_sets: Mutex<HashMap<i64, VariableSet>>,
    packages: Mutex<Vec<Package>>,
    pending: Mutex<VecDeque<i64>>,
    check_delay: Mutex<Option<Duration>>,
    checked: Mutex<Vec<String>>,
    report_failures: Mutex<VecDeque<ClientError>>,
    report_attempts: Mutex<usize>,
    reports: Mutex<Vec<StepReport>>,
}

impl FakeRepository {
    pub fn add_execution(&self, execution: Execution) {
        self.executions.lock().unwrap().insert(execution.id, execution);
    }

    pub fn add_template(&self, template: Template) {
        self.templates.lock().unwrap().insert(template.id, template);
    }

    pub fn add_variable_set(&self, set: VariableSet) {
        self.variable_sets.lock().unwrap().insert(set.id, set);
    }

    pub fn add_package(&self, file_name: &str, version: &str, body: Vec<u8>) {
        self.packages.lock().unwrap().push(Package {
            id: Package::package_id(file_name, version),
            file_name: file_name.to_string(),
            content_type: "application/zip".to_string(),
            version: version.to_string(),
            uploaded_at: chrono::Utc::now(),
            body: Some(body),
        });
    }

    /// Makes the next `check` return `id`
    pub fn push_pending(&self, id: i64) {
        self.pending.lock().unwrap().push_back(id);
    }

    /// Makes every `check` wait before answering
    pub fn delay_checks(&self, delay: Duration) {
        *self.check_delay.lock().unwrap() = Some(delay);
    }

    /// Instances passed to `check`, in call order
    pub fn checked_instances(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }

    /// Makes the next report delivery fail with `error`
    pub fn fail_reports_with(&self, error: ClientError) {
        self.report_failures.lock().unwrap().push_back(error);
    }

    pub fn report_attempts(&self) -> usize {
        *self.report_attempts.lock().unwrap()
    }

    pub fn reports(&self) -> Vec<StepReport> {
        self.reports.lock().unwrap().clone()
    }
}

fn not_found(what: String) -> ClientError {
    ClientError::api_error(404, what)
}

#[async_trait]
impl ExecutionRepository for FakeRepository {
    async fn check(&self, instance: &Instance, _timeout: Duration) -> Result<Option<i64>> {
        self.checked.lock().unwrap().push(instance.to_string());

        let delay = *self.check_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn get_execution(&self, id: i64) -> Result<Execution> {
        self.executions
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("Execution {} not found", id)))
    }

    async fn get_template(&self, id: i64) -> Result<Template> {
        self.templates
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("Template {} not found", id)))
    }

    async fn get_variable_set(&self, id: i64) -> Result<VariableSet> {
        self.variable_sets
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("Variable set {} not found", id)))
    }

    async fn get_package(&self, file_name: &str, version: Option<&str>) -> Result<Package> {
        self.packages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.file_name == file_name)
            .filter(|p| version.is_none_or(|v| p.version == v))
            .max_by(|a, b| a.version.cmp(&b.version))
            .cloned()
            .ok_or_else(|| not_found(format!("Package {} not found", file_name)))
    }

    async fn report_step(
        &self,
        execution_id: i64,
        step_state: &StepState,
        result: Option<ExecutionState>,
    ) -> Result<()> {
        *self.report_attempts.lock().unwrap() += 1;

        if let Some(error) = self.report_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        self.reports.lock().unwrap().push(StepReport {
            execution_id,
            step_state: step_state.clone(),
            result,
        });
        Ok(())
    }
}

/// Waits until `count` reports were delivered
pub async fn wait_for_reports(repository: &FakeRepository, count: usize) -> Vec<StepReport> {
    for _ in 0..500 {
        let reports = repository.reports();
        if reports.len() >= count {
            return reports;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!(
        "expected {} reports, got {}",
        count,
        repository.reports().len()
    );
}

/// Runner that records commands and fails those containing "fail"
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<(String, PathBuf, String)>>,
}

impl FakeRunner {
    pub fn calls(&self) -> Vec<(String, PathBuf, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation, folder: &Path, command: &str) -> RunOutput {
        self.calls.lock().unwrap().push((
            invocation.program.clone(),
            folder.to_path_buf(),
            command.to_string(),
        ));

        let logs = vec![format!("ran {}", command)];
        if command.contains("fail") {
            RunOutput::failed(logs)
        } else {
            RunOutput::succeeded(logs)
        }
    }
}

pub fn execution(id: i64, template_id: i64, variable_set_id: Option<i64>) -> Execution {
    Execution {
        id,
        template_id,
        variable_set_id,
        instance: Instance::new("Some", "Prod"),
        retry_count: 0,
        state: ExecutionState::Added,
        steps_states: Vec::new(),
        variable_overrides: HashMap::new(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

pub fn step(order: i32, step_type: StepType, command: &str, working_folder: &str) -> Step {
    Step {
        order,
        name: format!("step {}", order),
        step_type,
        command: command.to_string(),
        working_folder: working_folder.to_string(),
        file_name: None,
    }
}

pub fn template(id: i64, steps: Vec<Step>) -> Template {
    Template {
        id,
        name: format!("template {}", id),
        steps,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}
