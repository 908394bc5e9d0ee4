use crate::config::{is_identifier, ServiceProbeConfig};
use crate::runner::CommandRunner;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServiceStatus {
    Running { message: String },
    /// Containers exist but none answered the ping: restart, don't deploy.
    NotActive { message: String },
    NotRunning { message: String },
}

impl ServiceStatus {
    pub fn tag(&self) -> &'static str {
        match self {
            ServiceStatus::Running { .. } => "running",
            ServiceStatus::NotActive { .. } => "not_active",
            ServiceStatus::NotRunning { .. } => "not_running",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceStatus::Running { message }
            | ServiceStatus::NotActive { message }
            | ServiceStatus::NotRunning { message } => message,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ServiceStatus::Running { .. })
    }
}

pub const STATUS_TAGS: [&str; 3] = ["running", "not_active", "not_running"];

pub async fn probe_service(runner: &dyn CommandRunner, cfg: &ServiceProbeConfig) -> ServiceStatus {
    let discovered = runner.run(&cfg.discovery_command()).await;
    let containers = container_names(&discovered);

    if !containers.is_empty() {
        for container in &containers {
            if !is_identifier(container) {
                warn!(service = %cfg.name, container = %container, "skipping container with unexpected name");
                continue;
            }
            let output = runner.run(&cfg.container_ping_command(container)).await;
            if output.contains(&cfg.alive_signature) {
                return ServiceStatus::Running {
                    message: format!("{} container {} is active and running", cfg.name, container),
                };
            }
            debug!(service = %cfg.name, container = %container, "container did not answer ping");
        }
        return ServiceStatus::NotActive {
            message: format!(
                "{} containers are running but none responded to ping",
                cfg.name
            ),
        };
    }

    let output = runner.run(&cfg.native_ping_command).await;
    if output.contains(&cfg.alive_signature) {
        return ServiceStatus::Running {
            message: format!("{} service is active and running natively", cfg.name),
        };
    }

    ServiceStatus::NotRunning {
        message: format!(
            "{} service is not running in a container or natively",
            cfg.name
        ),
    }
}

fn container_names(discovered: &str) -> Vec<&str> {
    discovered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
