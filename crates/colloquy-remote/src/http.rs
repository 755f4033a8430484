//! `RemoteStore` over the service's JSON HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use colloquy_core::config::RemoteConfig;
use colloquy_core::types::{Message, Session, SessionId};

use crate::error::RemoteError;
use crate::store::{
    AskRequest, AskResponse, CreateSessionResponse, RemoteStore, RenameRequest, SessionHistory,
};

/// HTTP client for the session/answer service.
#[derive(Clone, Debug)]
pub struct HttpRemote {
    client: Client,
    base: Url,
}

impl HttpRemote {
    /// Creates a client for the service at `base_url`.
    ///
    /// `timeout` bounds every request; an expired timeout surfaces as a
    /// `RemoteError::Transport`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl {
                url: base_url.to_string(),
                message: "URL cannot carry a path".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport {
                endpoint: "client",
                message: e.to_string(),
                timed_out: false,
            })?;

        Ok(Self { client, base })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| RemoteError::InvalidUrl {
                url: self.base.to_string(),
                message: "URL cannot carry a path".to_string(),
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn execute(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, RemoteError> {
        let response = request.send().await.map_err(|err| RemoteError::Transport {
            endpoint,
            message: err.to_string(),
            timed_out: err.is_timeout(),
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "Remote returned error status");
            return Err(RemoteError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: Response,
    ) -> Result<T, RemoteError> {
        response.json::<T>().await.map_err(|err| RemoteError::Decode {
            endpoint,
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn list_sessions(&self) -> Result<Vec<Session>, RemoteError> {
        let url = self.url(&["sessions"])?;
        tracing::debug!(%url, "Listing sessions");
        let response = self.execute("/sessions", self.client.get(url)).await?;
        Self::decode("/sessions", response).await
    }

    async fn create_session(&self) -> Result<SessionId, RemoteError> {
        let url = self.url(&["create-session"])?;
        let response = self
            .execute("/create-session", self.client.post(url))
            .await?;
        let created: CreateSessionResponse = Self::decode("/create-session", response).await?;
        Ok(created.id)
    }

    async fn session_messages(&self, id: &SessionId) -> Result<Vec<Message>, RemoteError> {
        let url = self.url(&["session", id.as_str()])?;
        tracing::debug!(%url, "Loading session history");
        let response = self.execute("/session", self.client.get(url)).await?;
        let history: SessionHistory = Self::decode("/session", response).await?;
        Ok(history.messages)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), RemoteError> {
        let url = self.url(&["delete-session", id.as_str()])?;
        self.execute("/delete-session", self.client.put(url))
            .await?;
        Ok(())
    }

    async fn rename_session(&self, id: &SessionId, new_name: &str) -> Result<(), RemoteError> {
        let url = self.url(&["rename-session", id.as_str()])?;
        let body = RenameRequest {
            new_name: new_name.to_string(),
        };
        self.execute("/rename-session", self.client.put(url).json(&body))
            .await?;
        Ok(())
    }

    async fn ask(&self, request: &AskRequest) -> Result<String, RemoteError> {
        let url = self.url(&["ask"])?;
        let response = self
            .execute("/ask", self.client.post(url).json(request))
            .await?;
        let answer: AskResponse = Self::decode("/ask", response).await?;
        Ok(answer.answer)
    }
}
