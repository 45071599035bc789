mod command;
mod config;
mod error;
mod led;
mod registry;
mod subsystems;
mod transport;

use anyhow::{Context as _, Result};
use clap::Parser;
use command::{CommandDispatcher, HandlerContext};
use config::AppConfig;
use led::{run_status_led, PatternTable, TracePin};
use registry::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use subsystems::sim::{SimCamera, SimFan, SimLed, SimMonitoring, SimSystem, SimWifi};
use subsystems::{DeviceConfig, DeviceConfigStore, FileConfigStore, LedController};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use transport::{run_http, run_serial, TcpLineListener};

/// Command core for the eye-tracking camera board
#[derive(Parser)]
#[command(name = "iris-device", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "IRIS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load_or_default(args.config.as_deref())?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Device starting: {} {}", config.device.board, config.device.version);

    let store: Arc<FileConfigStore> = match &config.config_path {
        Some(path) => Arc::new(FileConfigStore::open(path).await?),
        None => {
            warn!("No config_path set, device config is kept in memory");
            Arc::new(FileConfigStore::in_memory(DeviceConfig::default()))
        }
    };
    let initial = store.snapshot().await;

    let (led_tx, led_rx) = mpsc::channel(8);
    tokio::spawn(run_status_led(TracePin, PatternTable::default(), led_rx));

    let system = Arc::new(
        SimSystem::new(
            config.device.mac_bytes()?,
            config.device.board.clone(),
            config.device.version.clone(),
        )
        .with_status_led(led_tx.clone()),
    );
    let wifi = SimWifi::new(store.clone(), SimWifi::demo_access_points())
        .with_scan_latency(config.timing.scan_latency())
        .with_status_led(led_tx);

    let led = Arc::new(SimLed::new());
    led.set_external_duty_cycle(initial.led_external_pwm_duty_cycle).await?;

    let registry = Registry::builder()
        .with_config(store.clone())
        .with_led(led)
        .with_fan(Arc::new(SimFan::new(
            config.fan.band(),
            initial.fan_pwm_duty_cycle,
        )))
        .with_monitoring(Arc::new(SimMonitoring::new(
            config.monitoring.led_current_ma,
            config.monitoring.battery_mv,
        )))
        .with_wifi(Arc::new(wifi))
        .with_camera(Arc::new(SimCamera::new()))
        .with_system(system.clone())
        .build();

    let mut ctx = HandlerContext::new(Arc::new(registry));
    ctx.restart_delay = config.timing.restart_delay();
    ctx.streaming_delay = config.timing.streaming_delay();

    let dispatcher = Arc::new(CommandDispatcher::new(ctx));
    info!("{:?}", dispatcher.registry());

    // HTTP adapter
    let http_dispatcher = dispatcher.clone();
    let http_bind = config.http.bind.clone();
    tokio::spawn(async move {
        if let Err(e) = run_http(&http_bind, http_dispatcher).await {
            error!("[HTTP] {:#}", e);
        }
    });

    // Serial line adapter
    match config.serial.serial_config() {
        Some(serial) => {
            tokio::spawn(run_serial(serial, dispatcher.clone()));
        }
        None => info!("[SERIAL] no port configured"),
    }

    // TCP line adapter
    if let Some(bind) = &config.line_tcp.bind {
        let listener = TcpLineListener::bind(bind).await?;
        let tcp_dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            if let Err(e) = listener.run(tcp_dispatcher).await {
                error!("[TCP] {:#}", e);
            }
        });
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
        _ = system.wait_for_restart() => {
            info!("Restart requested, exiting");
        }
    }

    Ok(())
}
