//! Gateway control-plane transport.
//!
//! The controller talks to the gateway through one request/response seam so
//! tests can script completions and alternative carriers can slot in without
//! touching reconciliation logic.

mod http;

pub use http::HttpTransport;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Protocol method names understood by the gateway control plane.
pub mod methods {
    pub const CONFIG_GET: &str = "config.get";
    pub const CONFIG_SCHEMA: &str = "config.schema";
    pub const CONFIG_SET: &str = "config.set";
    pub const CONFIG_APPLY: &str = "config.apply";
    pub const UPDATE_RUN: &str = "update.run";
}

/// One gateway round trip: a method name and loose params in, the decoded
/// result payload out. Implementations map their own failure modes onto
/// `anyhow` errors carrying the gateway's message where one exists.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}
