use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::ControlTransport;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP carrier for the gateway control plane: `POST {base}/rpc` with a
/// `{"method", "params"}` body and an optional bearer token, answered by a
/// `{"result"}` or `{"error"}` envelope.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building gateway HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token,
        })
    }
}

#[async_trait]
impl ControlTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let url = format!("{}/rpc", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&json!({ "method": method, "params": params }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("requesting {method} from the gateway"))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("decoding {method} response from the gateway"))?;

        if let Some(error) = body.get("error") {
            let message = error
                .as_str()
                .map_or_else(|| error.to_string(), str::to_string);
            bail!("gateway rejected {method}: {message}");
        }
        if !status.is_success() {
            bail!("gateway returned {status} for {method}");
        }
        Ok(match body {
            Value::Object(mut map) => map.shift_remove("result").unwrap_or(Value::Null),
            _ => Value::Null,
        })
    }
}
