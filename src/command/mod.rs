//! Command execution core
//!
//! This module handles:
//! - Parsing and validating command payloads against the operation catalog
//! - Dispatching to the handler for each operation
//! - Converting every outcome into a result envelope

mod dispatcher;
pub mod handlers;

pub use dispatcher::CommandDispatcher;
pub use handlers::HandlerContext;
