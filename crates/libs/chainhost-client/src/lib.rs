//! Chain lifecycle and JSON-RPC routing on top of a shared light-client engine.
//!
//! A [`Client`] owns one [`Engine`] and hands out [`Chain`] handles. The client enforces the
//! lifecycle rules before anything reaches the engine:
//!
//! - once [`Client::terminate`] succeeds (or the engine crashes) every call fails
//! - once [`Chain::remove`] succeeds every call on that chain fails
//! - chains created with JSON-RPC disabled refuse JSON-RPC traffic
//! - requests of 64 MiB or more are refused as malformed
//!
//! Chain specifications, database content and JSON-RPC payloads are opaque strings here.
//! [`engine::loopback::LoopbackEngine`] implements [`Engine`] in-process for tests and smoke
//! runs.

mod client;
pub mod config;
pub mod engine;
mod error;
mod lifecycle;
pub mod log_sink;
mod options;
mod registry;
mod relay;
mod responses;
mod router;
mod types;

pub use client::{Chain, Client};
pub use config::ClientConfig;
pub use engine::{CreateChainRequest, Engine, EngineError};
pub use error::{code as error_code, ClientError, DestroyedResource};
pub use lifecycle::{ChainLifecycle, ClientLifecycle, Operation};
pub use log_sink::{LogFacadeSink, LogLevel, LogSink, Logger};
pub use options::AddChainOptions;
pub use registry::ChainRegistry;
pub use relay::resolve_relay_chains;
pub use router::MAX_JSON_RPC_REQUEST_LEN;
pub use types::{ChainId, ChainToken};
