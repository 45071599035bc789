//! Serial line channel (USB CDC or UART)

use crate::command::CommandDispatcher;
use crate::transport::line::serve_lines;
use crate::transport::traits::TransportStream;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{info, warn};

/// Serial port settings
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Delay before the port is reopened after it went away
    pub reopen_delay: Duration,
}

fn open(config: &SerialConfig) -> Result<SerialStream> {
    tokio_serial::new(&config.port, config.baud_rate)
        .open_native_async()
        .with_context(|| format!("failed to open serial port {}", config.port))
}

#[async_trait]
impl TransportStream for SerialStream {
    async fn shutdown(&mut self) -> Result<()> {
        AsyncWriteExt::shutdown(self).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SERIAL"
    }
}

/// Serve the serial port, reopening it whenever it drops
pub async fn run_serial(config: SerialConfig, dispatcher: Arc<CommandDispatcher>) {
    loop {
        match open(&config) {
            Ok(stream) => {
                info!("[SERIAL] listening on {} @ {} baud", config.port, config.baud_rate);
                if let Err(e) = serve_lines(stream, &dispatcher).await {
                    warn!("[SERIAL] channel error: {:#}", e);
                }
            }
            Err(e) => warn!("[SERIAL] {:#}", e),
        }

        tokio::time::sleep(config.reopen_delay).await;
    }
}
