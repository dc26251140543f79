//! HTTP adapter for the medication API
//!
//! Endpoints:
//! - `GET    {base}/health`
//! - `GET    {base}/users/{owner}/medications`
//! - `POST   {base}/users/{owner}/medications`
//! - `GET    {base}/users/{owner}/medications/{id}`
//! - `PUT    {base}/users/{owner}/medications/{id}`
//! - `DELETE {base}/users/{owner}/medications/{id}`
//!
//! Collection calls carry the `x-api-key` header. Successful bodies are
//! wrapped in `{"data": ...}`; failures may carry `{"error": {code, message}}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::RemoteError;
use super::wire::{DataEnvelope, DeletedPayload, HealthStatus, RemoteMedication};
use super::RemoteClient;
use crate::config::Config;
use crate::models::{MedicationPatch, NewMedication};

const API_KEY_HEADER: &str = "x-api-key";

/// `RemoteClient` backed by the medication REST API
pub struct HttpRemoteClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpRemoteClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let invalid = |message: String| RemoteError::InvalidUrl {
            url: base_url.to_string(),
            message,
        };

        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: parsed,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Create a client from the `api_url`, `api_key` and timeout settings
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let url = config.require_api_url()?;
        Ok(Self::new(
            url,
            config.api_key.clone(),
            config.request_timeout(),
        )?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL (each segment is percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn collection_url(&self, owner: &str) -> Url {
        self.endpoint(&["users", owner, "medications"])
    }

    fn item_url(&self, owner: &str, id: &str) -> Url {
        self.endpoint(&["users", owner, "medications", id])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        match self.api_key {
            Some(ref key) => req.header(API_KEY_HEADER, key.as_str()),
            None => req,
        }
    }

    /// Send a request and decode the body when the status is accepted
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<T, RemoteError> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Remote request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%method, %url, status = status.as_u16(), "Remote response");

        if !accepted.contains(&status) {
            return Err(RemoteError::from_status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
            message: e.to_string(),
            body,
        })
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn list(&self, owner: &str) -> Result<Vec<RemoteMedication>, RemoteError> {
        let req = self.request(Method::GET, self.collection_url(owner));
        let envelope: DataEnvelope<Vec<RemoteMedication>> = self.send(req, &[StatusCode::OK]).await?;
        Ok(envelope.data)
    }

    async fn get(&self, owner: &str, id: &str) -> Result<RemoteMedication, RemoteError> {
        let req = self.request(Method::GET, self.item_url(owner, id));
        let envelope: DataEnvelope<RemoteMedication> = self.send(req, &[StatusCode::OK]).await?;
        Ok(envelope.data)
    }

    async fn create(
        &self,
        owner: &str,
        body: &NewMedication,
    ) -> Result<RemoteMedication, RemoteError> {
        let req = self
            .request(Method::POST, self.collection_url(owner))
            .json(body);
        let envelope: DataEnvelope<RemoteMedication> = self
            .send(req, &[StatusCode::OK, StatusCode::CREATED])
            .await?;
        Ok(envelope.data)
    }

    async fn update(
        &self,
        owner: &str,
        id: &str,
        body: &MedicationPatch,
    ) -> Result<RemoteMedication, RemoteError> {
        let req = self
            .request(Method::PUT, self.item_url(owner, id))
            .json(body);
        let envelope: DataEnvelope<RemoteMedication> = self.send(req, &[StatusCode::OK]).await?;
        Ok(envelope.data)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), RemoteError> {
        let req = self.request(Method::DELETE, self.item_url(owner, id));
        let _: DataEnvelope<DeletedPayload> = self.send(req, &[StatusCode::OK]).await?;
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, RemoteError> {
        let req = self
            .client
            .get(self.endpoint(&["health"]))
            .header(ACCEPT, "application/json");
        self.send(req, &[StatusCode::OK]).await
    }
}
