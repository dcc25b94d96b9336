use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::{Fetch, FetchRequest};
use crate::error::ClientError;

/// [`Fetch`] over `reqwest`, resolving request paths against the tool's origin.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: Client,
    base_url: Url,
}

impl ReqwestFetch {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(&self, request: FetchRequest) -> Result<Value, ClientError> {
        let url = self
            .base_url
            .join(&request.url)
            .map_err(|e| ClientError::Network(format!("invalid URL {}: {}", request.url, e)))?;

        let mut builder = self.client.request(request.method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
