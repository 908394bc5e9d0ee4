mod collectors;
mod config;
mod format;
mod http;
mod metrics;
mod probe;
mod report;
mod runner;

use axum::serve;
use clap::Parser;
use config::Config;
use metrics::Metrics;
use report::{CheckSettings, Reporter};
use runner::ShellRunner;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostpulse")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    /// Run a single check, print the report to stdout and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match Config::load_from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let runner = Arc::new(ShellRunner::new(cfg.command_timeout()));
    let reporter = Reporter::new(runner, CheckSettings::from(&cfg));

    if cli.once {
        let report = reporter.check().await;
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                error!(error = %err, "failed to serialize report");
                std::process::exit(1);
            }
        }
        return;
    }

    info!(
        listen = %cfg.listen,
        interface = %cfg.network.interface,
        services = cfg.services.len(),
        "starting hostpulse"
    );

    let metrics = match Metrics::new() {
        Ok(m) => m,
        Err(err) => {
            error!(error = %err, "failed to initialise metrics");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut http_task = {
        let listen = cfg.listen.clone();
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let app = http::build_router(metrics, reporter);
            let addr: SocketAddr = match listen.parse() {
                Ok(addr) => addr,
                Err(err) => {
                    error!(error = %err, listen = %listen, "invalid listen address");
                    return;
                }
            };

            let listener = match TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(err) => {
                    error!(error = %err, "failed to bind HTTP listener");
                    return;
                }
            };

            let server = serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });

            if let Err(err) = server.await {
                error!(error = %err, "HTTP server error");
            }
        })
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                error!(error = %err, "failed to wait for Ctrl+C");
            }
            info!("received Ctrl+C, shutting down");
            let _ = shutdown_tx.send(true);
            let _ = http_task.await;
        }
        _ = &mut http_task => {
            error!("HTTP server stopped unexpectedly");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
