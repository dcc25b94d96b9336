//! `LtiService` backed by a standalone LTI endpoint service reached over HTTP.
//!
//! Every protocol step is a JSON call against a base URL. Inbound requests
//! are forwarded as [`LtiRequest`] and pre-rendered pages come back as
//! [`LtiResponse`]. Bearer-protected calls forward the tool JWT unchanged.
//!
//! A 4xx reply is a protocol answer and reaches the browser as sent. A 5xx
//! reply is an internal failure of the service and never does.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::claims::ValidatedLaunch;
use super::deep_link::DeepLinkPayload;
use super::registration::{
    PlatformConfiguration, PlatformResponse, RegistrationContext, ToolConfiguration,
};
use super::request::{LtiRequest, LtiResponse};
use super::service::{LtiService, ToolConfigurationFn};
use super::tool_jwt::ToolJwt;
use crate::error::LtiError;

/// Default timeout for calls to the LTI service.
pub const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct InitCall<'a> {
    request: &'a LtiRequest,
    init_script: &'a str,
}

#[derive(Serialize)]
struct FinishCall<'a> {
    request: &'a LtiRequest,
    tool_configuration: &'a ToolConfiguration,
}

#[derive(Deserialize)]
struct SignedJwt {
    jwt: String,
}

/// HTTP client for the external LTI component.
#[derive(Debug, Clone)]
pub struct HttpLtiService {
    client: Client,
    base_url: Url,
}

impl HttpLtiService {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LtiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LtiError::Transport(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// Create a service over an existing `reqwest` client.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, LtiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| LtiError::Transport(format!("invalid service URL {}: {}", base_url, e)))?;

        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, LtiError> {
        self.base_url
            .join(path)
            .map_err(|e| LtiError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, LtiError> {
        let builder = self.client.get(self.endpoint(path)?);
        self.send(path, with_bearer(builder, bearer)).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, bearer: Option<&str>) -> Result<T, LtiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.client.post(self.endpoint(path)?).json(body);
        self.send(path, with_bearer(builder, bearer)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, LtiError> {
        debug!(endpoint = path, "Calling LTI service");

        let response = builder.send().await.map_err(|e| {
            warn!(endpoint = path, error = %e, "LTI service call failed");
            LtiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                warn!(endpoint = path, status = status.as_u16(), "LTI service failed");
            } else {
                debug!(endpoint = path, status = status.as_u16(), "LTI service rejected call");
            }
            return Err(LtiError::from_reply(status, body, content_type));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LtiError::InvalidResponse(format!("{}: {}", path, e)))
    }
}

fn with_bearer(builder: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
    match bearer {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

#[async_trait]
impl LtiService for HttpLtiService {
    async fn jwks(&self) -> Result<Value, LtiError> {
        self.get("jwks", None).await
    }

    async fn init(&self, request: LtiRequest, init_script: &str) -> Result<LtiResponse, LtiError> {
        let call = InitCall {
            request: &request,
            init_script,
        };
        self.post("init", &call, None).await
    }

    async fn redirect(&self, request: LtiRequest) -> Result<LtiResponse, LtiError> {
        self.post("redirect", &request, None).await
    }

    async fn validate_launch(&self, request: LtiRequest) -> Result<ValidatedLaunch, LtiError> {
        self.post("launch", &request, None).await
    }

    async fn sign_tool_jwt(&self, claims: &ToolJwt) -> Result<String, LtiError> {
        let signed: SignedJwt = self.post("tool_jwt", claims, None).await?;
        Ok(signed.jwt)
    }

    async fn registration_init(
        &self,
        request: LtiRequest,
    ) -> Result<RegistrationContext, LtiError> {
        self.post("registration/init", &request, None).await
    }

    async fn registration_finish(
        &self,
        request: LtiRequest,
        tool_configuration: &ToolConfigurationFn,
    ) -> Result<PlatformResponse, LtiError> {
        let platform: PlatformConfiguration = self
            .post("registration/platform_configuration", &request, None)
            .await?;

        let configuration = tool_configuration(&platform);
        let call = FinishCall {
            request: &request,
            tool_configuration: &configuration,
        };
        self.post("registration/finish", &call, None).await
    }

    async fn names_and_roles(&self, tool_jwt: &str) -> Result<Value, LtiError> {
        self.get("names_and_roles", Some(tool_jwt)).await
    }

    async fn sign_deep_link(
        &self,
        tool_jwt: &str,
        items: &[DeepLinkPayload],
    ) -> Result<String, LtiError> {
        let signed: SignedJwt = self.post("sign_deep_link", items, Some(tool_jwt)).await?;
        Ok(signed.jwt)
    }
}
