use crate::collectors::network::Connectivity;
use crate::probe::STATUS_TAGS;
use crate::report::Report;
use prometheus::core::Collector;
use prometheus::{opts, Counter, Encoder, Gauge, GaugeVec, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Gauges whose value came back unknown keep their previous reading.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub checks_total: Counter,
    pub check_duration_seconds: Gauge,
    pub last_check_timestamp_seconds: Gauge,
    pub cpu_usage_percent: Gauge,
    pub memory_usage_percent: Gauge,
    pub disk_usage_percent: Gauge,
    pub network_connected: Gauge,
    pub service_up: GaugeVec,
    pub service_state: GaugeVec,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let checks_total = Counter::with_opts(opts!(
            "hostpulse_checks_total",
            "Number of health checks performed"
        ))?;
        let check_duration_seconds = Gauge::with_opts(opts!(
            "hostpulse_check_duration_seconds",
            "Wall-clock duration of the last health check"
        ))?;
        let last_check_timestamp_seconds = Gauge::with_opts(opts!(
            "hostpulse_last_check_timestamp_seconds",
            "Unix time of the last health check"
        ))?;
        let cpu_usage_percent = Gauge::with_opts(opts!(
            "hostpulse_cpu_usage_percent",
            "1-minute load average relative to core count, in percent"
        ))?;
        let memory_usage_percent = Gauge::with_opts(opts!(
            "hostpulse_memory_usage_percent",
            "Used memory in percent"
        ))?;
        let disk_usage_percent = Gauge::with_opts(opts!(
            "hostpulse_disk_usage_percent",
            "Used space on the monitored mount in percent"
        ))?;
        let network_connected = Gauge::with_opts(opts!(
            "hostpulse_network_connected",
            "1 when the connectivity probe got exactly one reply"
        ))?;
        let service_up = GaugeVec::new(
            opts!("hostpulse_service_up", "1 when the service answered its ping"),
            &["service"],
        )?;
        let service_state = GaugeVec::new(
            opts!(
                "hostpulse_service_state",
                "1 for the current liveness state of each service"
            ),
            &["service", "state"],
        )?;

        register(&registry, &checks_total)?;
        register(&registry, &check_duration_seconds)?;
        register(&registry, &last_check_timestamp_seconds)?;
        register(&registry, &cpu_usage_percent)?;
        register(&registry, &memory_usage_percent)?;
        register(&registry, &disk_usage_percent)?;
        register(&registry, &network_connected)?;
        register(&registry, &service_up)?;
        register(&registry, &service_state)?;

        Ok(Arc::new(Self {
            registry,
            checks_total,
            check_duration_seconds,
            last_check_timestamp_seconds,
            cpu_usage_percent,
            memory_usage_percent,
            disk_usage_percent,
            network_connected,
            service_up,
            service_state,
        }))
    }

    pub fn observe_report(&self, report: &Report, elapsed: Duration) {
        self.checks_total.inc();
        self.check_duration_seconds.set(elapsed.as_secs_f64());
        self.last_check_timestamp_seconds.set(now_unix() as f64);

        if let Some(v) = report.cpu.percentage_used.as_number() {
            self.cpu_usage_percent.set(v as f64);
        }
        if let Some(v) = report.memory.percentage_used.as_number() {
            self.memory_usage_percent.set(v as f64);
        }
        if let Some(v) = report.storage.disk_percentage_used.as_number() {
            self.disk_usage_percent.set(v as f64);
        }
        let connected = report.network.status == Connectivity::Connected;
        self.network_connected
            .set(if connected { 1.0 } else { 0.0 });

        for (name, status) in report.services.iter() {
            self.service_up
                .with_label_values(&[name])
                .set(if status.is_running() { 1.0 } else { 0.0 });
            for tag in STATUS_TAGS {
                let value = if status.tag() == tag { 1.0 } else { 0.0 };
                self.service_state.with_label_values(&[name, tag]).set(value);
            }
        }
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
