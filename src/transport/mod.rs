//! Transport adapters feeding the command dispatcher

pub mod http;
pub mod line;
pub mod serial;
pub mod tcp;
pub mod traits;

pub use http::run_http;
pub use serial::{run_serial, SerialConfig};
pub use tcp::TcpLineListener;
