use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const CONTAINER_PLACEHOLDER: &str = "{container}";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: String,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub services: Vec<ServiceProbeConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_probe_host")]
    pub probe_host: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_mount")]
    pub mount: String,
}

/// How to find and ping one backing service. `container_ping_command` may
/// reference the discovered container as `{container}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceProbeConfig {
    pub name: String,
    #[serde(default)]
    pub discovery_command: Option<String>,
    pub container_ping_command: String,
    pub native_ping_command: String,
    pub alive_signature: String,
}

impl ServiceProbeConfig {
    pub fn discovery_command(&self) -> Cow<'_, str> {
        match &self.discovery_command {
            Some(cmd) => Cow::Borrowed(cmd.as_str()),
            // The name sits inside single quotes unescaped; validate_services
            // only admits identifiers, which cannot contain a quote.
            None => {
                debug_assert!(is_identifier(&self.name), "unvalidated service name");
                Cow::Owned(format!(
                    "docker ps --filter 'name={}' --filter 'status=running' --format '{{{{.Names}}}}'",
                    self.name
                ))
            }
        }
    }

    pub fn container_ping_command(&self, container: &str) -> String {
        self.container_ping_command
            .replace(CONTAINER_PLACEHOLDER, container)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            probe_host: default_probe_host(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mount: default_mount(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a host:port socket address".to_string(),
            ));
        }
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "command_timeout_ms must be > 0".to_string(),
            ));
        }

        validate_network(&self.network)?;
        validate_storage(&self.storage)?;
        validate_services(&self.services)?;

        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn validate_network(cfg: &NetworkConfig) -> Result<(), ConfigError> {
    if !is_identifier(&cfg.interface) {
        return Err(ConfigError::Validation(format!(
            "network.interface '{}' must be a plain interface name",
            cfg.interface
        )));
    }
    let host_ok = !cfg.probe_host.is_empty()
        && !cfg.probe_host.starts_with('-')
        && cfg
            .probe_host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "network.probe_host '{}' must be a host name or IP address",
            cfg.probe_host
        )));
    }
    Ok(())
}

fn validate_storage(cfg: &StorageConfig) -> Result<(), ConfigError> {
    if !cfg.mount.starts_with('/')
        || cfg
            .mount
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '"')
    {
        return Err(ConfigError::Validation(format!(
            "storage.mount '{}' must be an absolute path without spaces or quotes",
            cfg.mount
        )));
    }
    Ok(())
}

fn validate_services(services: &[ServiceProbeConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for svc in services {
        if !is_identifier(&svc.name) {
            return Err(ConfigError::Validation(format!(
                "services[*].name '{}' must be non-empty and use only letters, digits, '.', '_' or '-'",
                svc.name
            )));
        }
        if !names.insert(svc.name.clone()) {
            return Err(ConfigError::Validation(format!(
                "service name '{}' must be unique",
                svc.name
            )));
        }
        if svc
            .discovery_command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "services '{}' discovery_command must not be empty when set",
                svc.name
            )));
        }
        if svc.container_ping_command.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "services '{}' container_ping_command must not be empty",
                svc.name
            )));
        }
        if svc.native_ping_command.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "services '{}' native_ping_command must not be empty",
                svc.name
            )));
        }
        if svc.alive_signature.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "services '{}' alive_signature must not be empty",
                svc.name
            )));
        }
    }
    Ok(())
}

/// `[A-Za-z0-9][A-Za-z0-9_.-]*`, the shape of container and interface
/// names. Anything else is refused before it can reach a shell.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

const fn default_command_timeout_ms() -> u64 {
    5000
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_probe_host() -> String {
    "google.com".to_string()
}

fn default_mount() -> String {
    "/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis() -> ServiceProbeConfig {
        ServiceProbeConfig {
            name: "redis".to_string(),
            discovery_command: None,
            container_ping_command: "docker exec {container} redis-cli ping".to_string(),
            native_ping_command: "redis-cli ping".to_string(),
            alive_signature: "PONG".to_string(),
        }
    }

    fn valid_config() -> Config {
        Config {
            listen: "127.0.0.1:9110".to_string(),
            command_timeout_ms: 5000,
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            services: vec![redis()],
        }
    }

    #[test]
    fn example_config_parses_and_validates() {
        let cfg: Config = serde_yaml::from_str(Config::example_yaml()).expect("example yaml");
        cfg.validate().expect("example config must be valid");
        let names: Vec<&str> = cfg.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["redis", "mongodb", "mysql"]);
    }

    #[test]
    fn minimal_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("listen: 0.0.0.0:8080\n").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.command_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.network.interface, "eth0");
        assert_eq!(cfg.network.probe_host, "google.com");
        assert_eq!(cfg.storage.mount, "/");
        assert!(cfg.services.is_empty());
    }

    #[test]
    fn discovery_command_defaults_to_docker_name_filter() {
        assert_eq!(
            redis().discovery_command(),
            "docker ps --filter 'name=redis' --filter 'status=running' --format '{{.Names}}'"
        );
        let mut custom = redis();
        custom.discovery_command = Some("podman ps -q".to_string());
        assert_eq!(custom.discovery_command(), "podman ps -q");
    }

    #[test]
    fn quote_in_service_name_is_rejected_before_discovery() {
        let mut cfg = serde_yaml::from_str::<Config>(Config::example_yaml()).unwrap();
        cfg.services[0].name = "redis' ; rm -rf / ; echo '".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn container_placeholder_is_substituted() {
        assert_eq!(
            redis().container_ping_command("cache-1"),
            "docker exec cache-1 redis-cli ping"
        );
    }

    #[test]
    fn duplicate_service_names_are_rejected() {
        let mut cfg = valid_config();
        cfg.services.push(redis());
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_signature_is_rejected() {
        let mut cfg = valid_config();
        cfg.services[0].alive_signature = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shell_syntax_in_probe_host_is_rejected() {
        let mut cfg = valid_config();
        cfg.network.probe_host = "example.org; rm -rf /".to_string();
        assert!(cfg.validate().is_err());
        cfg.network.probe_host = "-f".to_string();
        assert!(cfg.validate().is_err());
        cfg.network.probe_host = "10.0.0.1".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn relative_mount_is_rejected() {
        let mut cfg = valid_config();
        cfg.storage.mount = "data".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = valid_config();
        cfg.command_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("mysql"));
        assert!(is_identifier("app_db.1-primary"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("-x"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("a;b"));
    }
}
