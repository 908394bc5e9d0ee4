use crate::collectors::cpu::{collect_cpu, CpuStat};
use crate::collectors::memory::{collect_memory, MemoryStat};
use crate::collectors::network::{collect_network, NetworkStat};
use crate::collectors::storage::{collect_storage, StorageStat};
use crate::collectors::time::{collect_time, ServerTime};
use crate::config::{NetworkConfig, ServiceProbeConfig, StorageConfig};
use crate::probe::{probe_service, ServiceStatus};
use crate::runner::CommandRunner;
use futures::future::join_all;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub server_time: ServerTime,
    pub cpu: CpuStat,
    pub memory: MemoryStat,
    pub network: NetworkStat,
    pub storage: StorageStat,
    pub services: ServiceStatuses,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStatuses(pub Vec<(String, ServiceStatus)>);

impl ServiceStatuses {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceStatus)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }
}

impl Serialize for ServiceStatuses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, status) in &self.0 {
            map.serialize_entry(name, status)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub services: Vec<ServiceProbeConfig>,
}

impl From<&crate::config::Config> for CheckSettings {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            network: cfg.network.clone(),
            storage: cfg.storage.clone(),
            services: cfg.services.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Reporter {
    runner: Arc<dyn CommandRunner>,
    settings: Arc<CheckSettings>,
}

impl Reporter {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: CheckSettings) -> Self {
        Self {
            runner,
            settings: Arc::new(settings),
        }
    }

    pub async fn check(&self) -> Report {
        let start = Instant::now();
        let runner = self.runner.as_ref();
        let settings = self.settings.as_ref();

        let probes = join_all(
            settings
                .services
                .iter()
                .map(|svc| async move { (svc.name.clone(), probe_service(runner, svc).await) }),
        );

        let (cpu, memory, network, storage, services) = tokio::join!(
            collect_cpu(runner),
            collect_memory(runner),
            collect_network(
                runner,
                &settings.network.interface,
                &settings.network.probe_host
            ),
            collect_storage(runner, &settings.storage.mount),
            probes,
        );

        let report = Report {
            server_time: collect_time(),
            cpu,
            memory,
            network,
            storage,
            services: ServiceStatuses(services),
        };

        for (name, status) in report.services.iter() {
            debug!(service = %name, status = status.tag(), message = status.message(), "service probed");
        }
        debug!(
            elapsed = %humantime::format_duration(start.elapsed()),
            services = report.services.0.len(),
            "check finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::cpu::{CORES_COMMAND, LOADAVG_COMMAND};
    use crate::collectors::memory::FREE_COMMAND;
    use crate::collectors::network::{ping_command, NET_DEV_COMMAND};
    use crate::collectors::storage::df_command;
    use crate::collectors::Field;
    use crate::runner::fake::ScriptedRunner;

    fn service(name: &str, signature: &str) -> ServiceProbeConfig {
        ServiceProbeConfig {
            name: name.to_string(),
            discovery_command: None,
            container_ping_command: format!("docker exec {{container}} {name}-ping"),
            native_ping_command: format!("{name}-ping"),
            alive_signature: signature.to_string(),
        }
    }

    fn settings() -> CheckSettings {
        CheckSettings {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            services: vec![
                service("redis", "PONG"),
                service("mongodb", "\"ok\" : 1"),
                service("mysql", "mysqld is alive"),
            ],
        }
    }

    #[tokio::test]
    async fn every_command_failing_still_yields_full_shape() {
        let reporter = Reporter::new(Arc::new(ScriptedRunner::new()), settings());
        let report = reporter.check().await;
        let json = serde_json::to_value(&report).unwrap();

        for key in ["server_time", "cpu", "memory", "network", "storage", "services"] {
            assert!(json.get(key).is_some(), "missing top-level key {key}");
        }
        assert_eq!(json["cpu"]["total"], "unknown");
        assert_eq!(json["cpu"]["percentage_used"], "unknown");
        assert_eq!(json["memory"]["usage"], "unknown");
        assert_eq!(json["network"]["status"], "disconnected");
        assert_eq!(json["network"]["download"], "unknown");
        assert_eq!(json["storage"]["disk_total"], "unknown");
        assert_eq!(json["storage"]["swap_total"], 0);
        for name in ["redis", "mongodb", "mysql"] {
            assert_eq!(json["services"][name]["status"], "not_running");
        }
        assert!(json["server_time"]["current_time"].is_string());
    }

    #[tokio::test]
    async fn healthy_host_report() {
        let net_dev = "  eth0: 2048 1 0 0 0 0 0 0 4096 1 0 0 0 0 0 0\n";
        let runner = ScriptedRunner::new()
            .with(CORES_COMMAND, "4")
            .with(LOADAVG_COMMAND, "2.00 1.00 0.50 1/100 1")
            .with(FREE_COMMAND, "Mem: 8000000 4000000 1\nSwap: 0 0 0\n")
            .with(df_command("/"), "Filesystem 1B-blocks Used\n/dev/sda1 1024 512 512 50% /\n")
            .with(ping_command("google.com"), "1 packets transmitted, 1 received, 0% packet loss")
            .with(NET_DEV_COMMAND, net_dev)
            .with(
                "docker ps --filter 'name=redis' --filter 'status=running' --format '{{.Names}}'",
                "redis\n",
            )
            .with("docker exec redis redis-ping", "PONG")
            .with(
                "docker ps --filter 'name=mysql' --filter 'status=running' --format '{{.Names}}'",
                "mysql\n",
            )
            .with("mongodb-ping", "{ \"ok\" : 1 }");
        let reporter = Reporter::new(Arc::new(runner), settings());
        let report = reporter.check().await;

        assert_eq!(report.cpu.percentage_used, Field::Number(50));
        assert_eq!(report.cpu.usage, Field::Number(2));
        assert_eq!(report.memory.percentage_used, Field::Number(50));
        assert_eq!(report.storage.disk_percentage_used, Field::Number(50));
        assert_eq!(report.storage.swap_percentage_used, Field::Number(0));
        assert_eq!(report.network.download, Field::Text("2.00KB".to_string()));
        assert_eq!(report.network.upload, Field::Text("4.00KB".to_string()));

        let tags: Vec<(&str, &str)> = report.services.iter().map(|(n, s)| (n, s.tag())).collect();
        assert_eq!(
            tags,
            vec![("redis", "running"), ("mongodb", "running"), ("mysql", "not_active")]
        );
    }

    #[tokio::test]
    async fn services_keep_configuration_order() {
        let reporter = Reporter::new(Arc::new(ScriptedRunner::new()), settings());
        let report = reporter.check().await;
        let names: Vec<&str> = report.services.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["redis", "mongodb", "mysql"]);

        let text = serde_json::to_string(&report.services).unwrap();
        let redis = text.find("\"redis\"").unwrap();
        let mysql = text.find("\"mysql\"").unwrap();
        assert!(redis < mysql);
    }
}
