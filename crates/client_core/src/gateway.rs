//! HTTP mapping of the five record operations.
//!
//! One [`HttpEntityApi`] exists per collection. Every call is a single round
//! trip: no retries, no timeouts beyond the client defaults, no batching.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::RecordId,
    error::{ApiError, ApiException},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::form::FormRecord;

/// A REST collection exposed by the records API.
pub trait Resource: Send + Sync + 'static {
    /// Record as returned by the server.
    type Record: DeserializeOwned + Clone + Send + Sync + 'static;
    /// Body sent on create and update, edited through a form.
    type Input: FormRecord + Serialize + Clone + Send + Sync + 'static;

    /// Path segment of the collection, e.g. `courses`.
    const COLLECTION: &'static str;

    fn record_id(record: &Self::Record) -> Option<&RecordId>;
    fn input_id(input: &Self::Input) -> Option<&RecordId>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned {status}: {source}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("failed to decode response of {method} {url}: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait EntityApi<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R::Record>, GatewayError>;
    async fn get_one(&self, id: &RecordId) -> Result<R::Record, GatewayError>;
    async fn create(&self, input: &R::Input) -> Result<R::Record, GatewayError>;
    async fn update(&self, id: &RecordId, input: &R::Input) -> Result<R::Record, GatewayError>;
    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError>;
}

pub struct HttpEntityApi<R: Resource> {
    http: Client,
    collection_url: Url,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpEntityApi<R> {
    pub fn new(base_url: &Url) -> Result<Self, GatewayError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &Url) -> Result<Self, GatewayError> {
        Ok(Self {
            http,
            collection_url: collection_url(base_url, R::COLLECTION)?,
            _resource: PhantomData,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, id: &RecordId) -> Result<Url, GatewayError> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl(self.collection_url.to_string()))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&R::Input>,
    ) -> Result<String, GatewayError> {
        debug!(%method, %url, "dispatching records api request");
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let res = request.send().await.map_err(|source| GatewayError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;
        let status = res.status();
        let text = res.text().await.map_err(|source| GatewayError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                source: ApiError::from_response(status.as_u16(), &text).into(),
            });
        }
        Ok(text)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&R::Input>,
    ) -> Result<T, GatewayError> {
        let text = self.send(method.clone(), url.clone(), body).await?;
        serde_json::from_str(&text).map_err(|source| GatewayError::Decode {
            method,
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl<R: Resource> EntityApi<R> for HttpEntityApi<R> {
    async fn list(&self) -> Result<Vec<R::Record>, GatewayError> {
        self.send_json(Method::GET, self.collection_url.clone(), None)
            .await
    }

    async fn get_one(&self, id: &RecordId) -> Result<R::Record, GatewayError> {
        let url = self.item_url(id)?;
        self.send_json(Method::GET, url, None).await
    }

    async fn create(&self, input: &R::Input) -> Result<R::Record, GatewayError> {
        self.send_json(Method::POST, self.collection_url.clone(), Some(input))
            .await
    }

    async fn update(&self, id: &RecordId, input: &R::Input) -> Result<R::Record, GatewayError> {
        let url = self.item_url(id)?;
        self.send_json(Method::PUT, url, Some(input)).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        let url = self.item_url(id)?;
        // The acknowledgement body varies between deployments and is ignored.
        self.send(Method::DELETE, url, None).await.map(|_| ())
    }
}

fn collection_url(base_url: &Url, collection: &str) -> Result<Url, GatewayError> {
    if base_url.cannot_be_a_base() {
        return Err(GatewayError::InvalidUrl(base_url.to_string()));
    }
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(collection)
        .map_err(|err| GatewayError::InvalidUrl(format!("{base}{collection}: {err}")))
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
