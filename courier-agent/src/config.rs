//! Agent configuration
//!
//! Defines all configurable parameters for the agent: the instances it
//! serves, polling and shipping intervals, the working folder and the
//! programs used to run each step type.

use anyhow::Context;
use courier_core::domain::instance::Instance;
use std::path::PathBuf;
use std::time::Duration;

/// How a step type is turned into a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to spawn
    pub program: String,
    /// Arguments placed before the command
    pub prefix: Vec<String>,
    /// Split the command into arguments instead of passing it as one
    pub split_command: bool,
}

impl Invocation {
    /// Shell-style invocation: the command is a single argument after the prefix
    pub fn shell(program: impl Into<String>, prefix: &[&str]) -> Self {
        Self {
            program: program.into(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            split_command: false,
        }
    }

    /// Tool-style invocation: the command is split into arguments
    pub fn tool(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
            split_command: true,
        }
    }

    /// Full argument list for `command`
    pub fn arguments(&self, command: &str) -> Vec<String> {
        let mut args = self.prefix.clone();
        if self.split_command {
            args.extend(split_arguments(command));
        } else {
            args.push(command.to_string());
        }
        args
    }
}

/// Splits a command line on whitespace, keeping double-quoted runs together
pub fn split_arguments(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in command.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }

    args
}

/// Programs used for the process-backed step types
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub cmd: Invocation,
    pub pshell: Invocation,
    pub docker: Invocation,
    pub docker_compose: Invocation,
}

impl Default for Toolchain {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                cmd: Invocation::shell("cmd", &["/C"]),
                pshell: Invocation::shell("powershell", &["-Command"]),
                docker: Invocation::tool("docker"),
                docker_compose: Invocation::tool("docker-compose"),
            }
        } else {
            Self {
                cmd: Invocation::shell("sh", &["-c"]),
                pshell: Invocation::shell("pwsh", &["-Command"]),
                docker: Invocation::tool("docker"),
                docker_compose: Invocation::tool("docker-compose"),
            }
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported as the executor of every step
    pub agent_name: String,

    /// Orchestrator base URL (e.g., "http://localhost:8080")
    pub orchestrator_url: String,

    /// Deployment targets this agent serves
    pub instances: Vec<Instance>,

    /// Folder relative step folders are resolved against
    pub default_folder: PathBuf,

    /// Pause between poll cycles
    pub poll_interval: Duration,

    /// Long-poll window requested from the orchestrator
    pub check_timeout: Duration,

    /// Pause before retrying a report after a transient failure
    pub log_ship_interval: Duration,

    /// Max executions running at the same time
    pub max_parallel_executions: usize,

    /// Folder of the local log file
    pub log_dir: PathBuf,

    pub toolchain: Toolchain,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(orchestrator_url: String, instances: Vec<Instance>) -> Self {
        Self {
            agent_name: host_name(),
            orchestrator_url,
            instances,
            default_folder: PathBuf::from("."),
            poll_interval: Duration::from_secs(3),
            check_timeout: Duration::from_secs(600),
            log_ship_interval: Duration::from_millis(100),
            max_parallel_executions: 4,
            log_dir: PathBuf::from("logs"),
            toolchain: Toolchain::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ORCHESTRATOR_URL (required)
    /// - AGENT_INSTANCES (required, comma-separated `tenant/environment`)
    /// - AGENT_NAME (optional, default: host name)
    /// - DEFAULT_FOLDER (optional, default: .)
    /// - POLL_INTERVAL (optional, seconds, default: 3)
    /// - CHECK_TIMEOUT (optional, seconds, default: 600)
    /// - LOG_SHIP_INTERVAL (optional, milliseconds, default: 100)
    /// - MAX_PARALLEL_EXECUTIONS (optional, default: 4)
    /// - LOG_DIR (optional, default: logs)
    /// - CMD_PROGRAM, PSHELL_PROGRAM, DOCKER_PROGRAM, DOCKER_COMPOSE_PROGRAM
    ///   (optional, override the program of a step type)
    pub fn from_env() -> anyhow::Result<Self> {
        let orchestrator_url = std::env::var("ORCHESTRATOR_URL")
            .map_err(|_| anyhow::anyhow!("ORCHESTRATOR_URL environment variable not set"))?;

        let instances = std::env::var("AGENT_INSTANCES")
            .map_err(|_| anyhow::anyhow!("AGENT_INSTANCES environment variable not set"))?;
        let instances = parse_instances(&instances).context("Invalid AGENT_INSTANCES")?;

        let mut config = Self::new(orchestrator_url, instances);

        if let Ok(name) = std::env::var("AGENT_NAME") {
            config.agent_name = name;
        }

        if let Ok(folder) = std::env::var("DEFAULT_FOLDER") {
            config.default_folder = PathBuf::from(folder);
        }

        if let Some(secs) = env_parse::<u64>("POLL_INTERVAL") {
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("CHECK_TIMEOUT") {
            config.check_timeout = Duration::from_secs(secs);
        }

        if let Some(millis) = env_parse::<u64>("LOG_SHIP_INTERVAL") {
            config.log_ship_interval = Duration::from_millis(millis);
        }

        if let Some(max) = env_parse::<usize>("MAX_PARALLEL_EXECUTIONS") {
            config.max_parallel_executions = max;
        }

        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        let toolchain = &mut config.toolchain;
        for (var, invocation) in [
            ("CMD_PROGRAM", &mut toolchain.cmd),
            ("PSHELL_PROGRAM", &mut toolchain.pshell),
            ("DOCKER_PROGRAM", &mut toolchain.docker),
            ("DOCKER_COMPOSE_PROGRAM", &mut toolchain.docker_compose),
        ] {
            if let Ok(program) = std::env::var(var) {
                invocation.program = program;
            }
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_name.is_empty() {
            anyhow::bail!("agent_name cannot be empty");
        }

        if !self.orchestrator_url.starts_with("http://")
            && !self.orchestrator_url.starts_with("https://")
        {
            anyhow::bail!("orchestrator_url must start with http:// or https://");
        }

        if self.instances.is_empty() {
            anyhow::bail!("at least one instance must be configured");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.check_timeout.is_zero() {
            anyhow::bail!("check_timeout must be greater than 0");
        }

        if self.max_parallel_executions == 0 {
            anyhow::bail!("max_parallel_executions must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "http://localhost:8080".to_string(),
            vec![Instance::new("default", "default")],
        )
    }
}

/// Parses a comma-separated list of `tenant/environment` pairs
pub fn parse_instances(value: &str) -> anyhow::Result<Vec<Instance>> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            Instance::parse(part)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a tenant/environment pair", part.trim()))
        })
        .collect()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// Best-effort host name of this machine
fn host_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "courier-agent".to_string())
}
