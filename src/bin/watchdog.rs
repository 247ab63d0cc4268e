use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use portal_watchdog::{
    BroadcastSink, WatchdogEvent, WatchdogService,
    login::HttpTransport,
    probe::PingProber,
    store::json::JsonFileStore,
    util::get_config_dir,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Keeps a captive-portal network session logged in")]
struct Args {
    /// Directory holding config.json (defaults to WATCHDOG_CONFIG_DIR or the platform config dir)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Trace-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Defaults to `run`
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Serve the control API and wait for ctrl-c
    Run {
        /// Do not start the HTTP API
        #[arg(long)]
        no_api: bool,

        /// Start the monitor loop right away
        #[arg(long)]
        autostart: bool,
    },
    /// Probe the configured target once
    Ping,
    /// Run one portal login attempt
    Login,
    /// Inspect or reset the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigAction {
    Show,
    Reset,
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![("portal_watchdog", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config_dir = args.config_dir.clone().unwrap_or_else(get_config_dir);
    let store = JsonFileStore::new(&config_dir);
    debug!("using config file {}", store.path().display());

    let sink = Arc::new(BroadcastSink::default());
    let service = Arc::new(WatchdogService::new(
        Arc::new(store),
        Arc::new(PingProber::new()),
        Arc::new(HttpTransport::new()?),
        sink.clone(),
    ));

    let command = args.command.unwrap_or(Command::Run {
        no_api: false,
        autostart: false,
    });

    match command {
        Command::Run { no_api, autostart } => run(service, sink, no_api, autostart).await,
        Command::Ping => {
            let result = service.test_ping().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Login => {
            let result = service.do_login().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Config { action } => {
            let config = match action {
                ConfigAction::Show => service.get_config().await?,
                ConfigAction::Reset => service.reset_config().await?,
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run(
    service: Arc<WatchdogService>,
    sink: Arc<BroadcastSink>,
    no_api: bool,
    autostart: bool,
) -> anyhow::Result<()> {
    tokio::spawn(log_events(sink.subscribe()));

    if !no_api {
        serve_api(service.clone(), &sink).await?;
    }

    if autostart {
        service.start_monitor().await;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    service.shutdown().await;
    Ok(())
}

#[cfg(feature = "api")]
async fn serve_api(service: Arc<WatchdogService>, sink: &BroadcastSink) -> anyhow::Result<()> {
    use portal_watchdog::{
        api::{ApiConfig, ApiState, spawn_api_server},
        util::{get_api_addr, get_api_token},
    };

    let config = ApiConfig {
        bind_addr: get_api_addr(),
        auth_token: get_api_token(),
        enable_cors: true,
    };
    if config.auth_token.is_none() {
        warn!("WATCHDOG_API_TOKEN not set, API is unauthenticated");
    }

    spawn_api_server(config, ApiState::new(service, sink.sender())).await?;
    Ok(())
}

#[cfg(not(feature = "api"))]
async fn serve_api(_service: Arc<WatchdogService>, _sink: &BroadcastSink) -> anyhow::Result<()> {
    warn!("built without the api feature, running without HTTP API");
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<WatchdogEvent>) {
    loop {
        match events.recv().await {
            Ok(WatchdogEvent::PingStatus {
                host,
                success,
                failure_count,
                ..
            }) => {
                info!("ping {host}: success={success} failures={failure_count}");
            }
            Ok(WatchdogEvent::LoginStatus {
                success,
                status_code,
                message,
                ..
            }) => {
                info!("login: success={success} status={status_code} {message}");
            }
            Err(RecvError::Lagged(skipped)) => debug!("event log skipped {skipped} events"),
            Err(RecvError::Closed) => break,
        }
    }
}
