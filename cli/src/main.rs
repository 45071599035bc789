//! Host-side tool for sending one command to a device over its line channel

use anyhow::{bail, Context as _, Result};
use bytes::BytesMut;
use clap::{Args, Parser, Subcommand};
use iris_shared::codec::{decode_envelope, encode_request};
use iris_shared::{catalog, CommandMessage, Envelope, OperationId, Payload};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iris-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a command and print the result
    Send {
        #[command(flatten)]
        target: Target,

        /// Operation name, e.g. `get_who_am_i`
        operation: OperationId,

        /// JSON object passed as the command data
        #[arg(short, long)]
        data: Option<String>,

        /// How long to wait for the response
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },
    /// List every operation with its fields
    List,
}

#[derive(Args)]
struct Target {
    /// Serial device, e.g. /dev/ttyACM0
    #[arg(short, long, conflicts_with = "tcp", required_unless_present = "tcp")]
    port: Option<String>,

    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// TCP line listener, e.g. 192.168.4.1:2323
    #[arg(long)]
    tcp: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the device reported success
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::List => {
            for op in OperationId::ALL {
                let fields: Vec<_> = catalog::field_specs(op).iter().map(|f| f.name).collect();
                println!("{:<24} {}", op.as_str(), fields.join(", "));
            }
            Ok(true)
        }
        Command::Send {
            target,
            operation,
            data,
            timeout_ms,
        } => {
            let data = parse_data(data.as_deref())?;
            let request = encode_request(&CommandMessage::new(operation, data))?;
            let timeout = Duration::from_millis(timeout_ms);

            let envelope = match (&target.tcp, &target.port) {
                (Some(addr), _) => {
                    let stream = TcpStream::connect(addr)
                        .await
                        .with_context(|| format!("failed to connect to {addr}"))?;
                    round_trip(stream, &request, timeout).await?
                }
                (None, Some(port)) => {
                    let stream = tokio_serial::new(port, target.baud)
                        .open_native_async()
                        .with_context(|| format!("failed to open {port}"))?;
                    round_trip(stream, &request, timeout).await?
                }
                (None, None) => bail!("either --port or --tcp is required"),
            };

            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(envelope.is_success())
        }
    }
}

fn parse_data(data: Option<&str>) -> Result<Payload> {
    let Some(raw) = data else {
        return Ok(Payload::new());
    };
    match serde_json::from_str(raw).context("--data is not valid JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("--data must be a JSON object"),
    }
}

async fn round_trip<S>(mut stream: S, request: &[u8], timeout: Duration) -> Result<Envelope>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await?;
    stream.flush().await?;
    debug!("sent {} bytes", request.len());

    let mut buf = BytesMut::with_capacity(1024);
    let read = async {
        loop {
            if let Some(envelope) = decode_envelope(&mut buf)? {
                return Ok::<_, anyhow::Error>(envelope);
            }
            let n = stream.read_buf(&mut buf).await?;
            if n == 0 {
                bail!("device closed the channel before responding");
            }
            debug!("received {} bytes", n);
        }
    };

    tokio::time::timeout(timeout, read)
        .await
        .context("timed out waiting for a response")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data() {
        assert!(parse_data(None).unwrap().is_empty());
        let data = parse_data(Some(r#"{"dutyCycle":40}"#)).unwrap();
        assert_eq!(data["dutyCycle"], 40);
        assert!(parse_data(Some("[1,2]")).is_err());
        assert!(parse_data(Some("{")).is_err());
    }

    #[tokio::test]
    async fn test_round_trip_skips_log_noise() {
        let (host, mut device) = tokio::io::duplex(1024);

        let device_side = tokio::spawn(async move {
            let mut line = vec![0u8; 64];
            let n = device.read(&mut line).await.unwrap();
            assert!(line[..n].ends_with(b"\n"));
            device
                .write_all(b"I (123) boot: ok\r\n{\"result\":{\"status\":\"success\",\"message\":\"pong\"}}")
                .await
                .unwrap();
            device
        });

        let request = encode_request(&CommandMessage::new(OperationId::Ping, Payload::new())).unwrap();
        let envelope = round_trip(host, &request, Duration::from_secs(1)).await.unwrap();
        assert_eq!(envelope.result.message(), Some("pong"));
        drop(device_side.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_times_out() {
        let (host, _device) = tokio::io::duplex(1024);
        let err = round_trip(host, b"{}\n", Duration::from_millis(100)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
