//! Transport trait abstraction for line-oriented command channels

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A byte stream that carries line-framed commands
#[async_trait]
pub trait TransportStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Close the transport gracefully
    async fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}
