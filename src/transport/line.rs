//! Line adapter shared by the serial and TCP channels
//!
//! Each inbound line is one self-describing command message or a batch of
//! them. The response is written back as-is, without a terminator. Any bytes
//! from the host cancel the startup countdown.

use super::traits::TransportStream;
use crate::command::CommandDispatcher;
use anyhow::{anyhow, Result};
use iris_shared::codec::LineDecoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

/// Serve commands on `stream` until the peer closes it
pub async fn serve_lines<S: TransportStream>(mut stream: S, dispatcher: &CommandDispatcher) -> Result<()> {
    let name = stream.name();
    let mut decoder = LineDecoder::new();
    let mut read_buf = vec![0u8; 512];

    loop {
        let n = stream.read(&mut read_buf).await?;
        if n == 0 {
            info!("[{}] peer closed the channel", name);
            break;
        }

        if let Some(system) = dispatcher.registry().system() {
            system.notify_command_received().await;
        }
        decoder.extend(&read_buf[..n]);

        // Process all complete lines
        while let Some(line) = decoder.decode_next() {
            debug!("[{}] received {} bytes", name, line.len());
            let reply = dispatcher.execute_line(&line).await;
            let encoded = reply
                .to_vec()
                .map_err(|e| anyhow!("failed to encode response: {}", e))?;
            stream.write_all(&encoded).await?;
            stream.flush().await?;
        }
    }

    TransportStream::shutdown(&mut stream).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::command::handlers::testing::{rig, Rig};
    use crate::subsystems::DeviceConfigStore;
    use async_trait::async_trait;
    use bytes::BytesMut;
    use iris_shared::codec::decode_envelope;
    use iris_shared::{BatchEnvelope, Envelope, Status};
    use tokio::io::DuplexStream;

    #[async_trait]
    impl TransportStream for DuplexStream {
        async fn shutdown(&mut self) -> Result<()> {
            AsyncWriteExt::shutdown(self).await?;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "DUPLEX"
        }
    }

    /// Write `input` to a channel served with `rig` and return the raw output
    async fn serve_raw(rig: &Rig, input: &[u8]) -> Vec<u8> {
        let dispatcher = CommandDispatcher::new(rig.ctx.clone());
        let (mut host, device) = tokio::io::duplex(4096);

        let server = tokio::spawn(async move { serve_lines(device, &dispatcher).await });

        host.write_all(input).await.unwrap();
        AsyncWriteExt::shutdown(&mut host).await.unwrap();

        let mut raw = Vec::new();
        host.read_to_end(&mut raw).await.unwrap();
        server.await.unwrap().unwrap();
        raw
    }

    /// Write `input` to a served channel and collect every response
    pub(crate) async fn exchange(input: &[u8]) -> Vec<Envelope> {
        let raw = serve_raw(&rig(), input).await;

        let mut buf = BytesMut::from(&raw[..]);
        let mut envelopes = Vec::new();
        while let Some(envelope) = decode_envelope(&mut buf).unwrap() {
            envelopes.push(envelope);
        }
        envelopes
    }

    #[tokio::test]
    async fn test_one_response_per_line() {
        let envelopes = exchange(b"{\"command\":\"ping\"}\r\n\n{\"command\":\"get_device_mode\"}\n").await;

        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].result.message(), Some("pong"));
        assert_eq!(envelopes[1].result.data["mode"], "Setup");
    }

    #[tokio::test]
    async fn test_bad_lines_get_failure_responses() {
        let envelopes = exchange(b"not json\n{\"data\":{}}\n").await;

        assert_eq!(envelopes.len(), 2);
        assert!(envelopes.iter().all(|e| e.status() == Status::Failure));
        assert_eq!(envelopes[0].result.message(), Some("malformed payload"));
        assert_eq!(envelopes[1].result.message(), Some("unknown command"));
    }

    #[tokio::test]
    async fn test_responses_are_unterminated() {
        let raw = serve_raw(&rig(), b"{\"command\":\"ping\"}\n").await;
        assert_eq!(raw, br#"{"result":{"status":"success","message":"pong"}}"#);
    }

    #[tokio::test]
    async fn test_batch_line_gets_results_array() {
        let rig = rig();
        let raw = serve_raw(
            &rig,
            b"{\"commands\":[{\"command\":\"get_device_mode\"},{\"command\":\"set_mdns\",\"data\":{\"hostname\":\"eye\"}}]}\n",
        )
        .await;

        let batch: BatchEnvelope = serde_json::from_slice(&raw).unwrap();
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.results[0].result.data["mode"], "Setup");
        assert!(batch.results[1].is_success());
        assert_eq!(rig.store.snapshot().await.mdns_hostname, "eye");
    }

    #[tokio::test]
    async fn test_host_bytes_cancel_startup() {
        let rig = rig();
        assert!(!rig.system.is_startup_cancelled());

        // even a line that fails to parse counts as host activity
        serve_raw(&rig, b"garbage\n").await;
        assert!(rig.system.is_startup_cancelled());
    }

    #[tokio::test]
    async fn test_silent_session_leaves_startup_alone() {
        let rig = rig();
        assert!(serve_raw(&rig, b"").await.is_empty());
        assert!(!rig.system.is_startup_cancelled());
    }
}
