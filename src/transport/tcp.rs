//! TCP line channel
//!
//! Carries the same line protocol as the serial port, one session per
//! accepted connection.

use crate::command::CommandDispatcher;
use crate::transport::line::serve_lines;
use crate::transport::traits::TransportStream;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

#[async_trait]
impl TransportStream for TcpStream {
    async fn shutdown(&mut self) -> Result<()> {
        AsyncWriteExt::shutdown(self).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TCP"
    }
}

/// Listener accepting line-protocol sessions
pub struct TcpLineListener {
    listener: TcpListener,
}

impl TcpLineListener {
    pub async fn bind(address: &str) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind line listener on {address}"))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, serving each on its own task
    pub async fn run(self, dispatcher: Arc<CommandDispatcher>) -> Result<()> {
        info!("[TCP] line listener on {}", self.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("[TCP] session from {}", peer);

            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_lines(stream, &dispatcher).await {
                    warn!("[TCP] session {} ended: {:#}", peer, e);
                }
            });
        }
    }
}
