use std::collections::BTreeMap;

use reqwest::header;
use serde::de::DeserializeOwned;

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::models::envelope::ApiEnvelope;
use crate::models::group::GroupInfo;
use crate::models::token::{TokenPage, TokenPayload, TokenRecord};

/// Thin REST client for the gateway's token endpoints. Responses all use the
/// `{success, message, data}` envelope; a `success=false` message is passed
/// through verbatim for the caller to surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_cookie: config.session_cookie.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(cookie) = &self.session_cookie {
            req = req.header(header::COOKIE, cookie);
        }
        req
    }

    async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiEnvelope<T>, ConsoleError> {
        let resp = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("GET {path} failed: {e}");
                ConsoleError::Fetch(e.to_string())
            })?;
        resp.json().await.map_err(|e| {
            tracing::error!("GET {path} returned an unreadable body: {e}");
            ConsoleError::Fetch(e.to_string())
        })
    }

    async fn send_payload(
        &self,
        method: reqwest::Method,
        path: &str,
        payload: &TokenPayload,
    ) -> Result<(), ConsoleError> {
        let label = method.as_str().to_owned();
        let resp = self
            .request(method, path)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("{label} {path} failed: {e}");
                ConsoleError::Submit(e.to_string())
            })?;
        let envelope: ApiEnvelope<serde_json::Value> = resp.json().await.map_err(|e| {
            tracing::error!("{label} {path} returned an unreadable body: {e}");
            ConsoleError::Submit(e.to_string())
        })?;
        if !envelope.success {
            return Err(ConsoleError::Submit(envelope.message));
        }
        Ok(())
    }

    /// GET /api/user/models — model names the account may use.
    pub async fn get_models(&self) -> Result<Vec<String>, ConsoleError> {
        let envelope: ApiEnvelope<Vec<String>> = self.fetch_envelope("/api/user/models").await?;
        if !envelope.success {
            return Err(ConsoleError::Fetch(envelope.message));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    /// GET /api/user/self/groups — groups the account may bind tokens to.
    pub async fn get_groups(&self) -> Result<BTreeMap<String, GroupInfo>, ConsoleError> {
        let envelope: ApiEnvelope<BTreeMap<String, GroupInfo>> =
            self.fetch_envelope("/api/user/self/groups").await?;
        if !envelope.success {
            return Err(ConsoleError::Fetch(envelope.message));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    /// GET /api/token/{id} — fetch one token for editing.
    pub async fn get_token(&self, id: i64) -> Result<TokenRecord, ConsoleError> {
        let envelope: ApiEnvelope<TokenRecord> =
            self.fetch_envelope(&format!("/api/token/{id}")).await?;
        if !envelope.success {
            return Err(ConsoleError::Fetch(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| ConsoleError::Fetch("token response had no data".into()))
    }

    /// GET /api/token/?p=&size= — one page of the account's tokens.
    pub async fn list_tokens(&self, page: u32, size: u32) -> Result<TokenPage, ConsoleError> {
        let envelope: ApiEnvelope<TokenPage> = self
            .fetch_envelope(&format!("/api/token/?p={page}&size={size}"))
            .await?;
        if !envelope.success {
            return Err(ConsoleError::Fetch(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| ConsoleError::Fetch("token list response had no data".into()))
    }

    /// POST /api/token/ — create one token.
    pub async fn create_token(&self, payload: &TokenPayload) -> Result<(), ConsoleError> {
        self.send_payload(reqwest::Method::POST, "/api/token/", payload)
            .await
    }

    /// PUT /api/token/ — update the token named by `payload.id`.
    pub async fn update_token(&self, payload: &TokenPayload) -> Result<(), ConsoleError> {
        self.send_payload(reqwest::Method::PUT, "/api/token/", payload)
            .await
    }

    /// DELETE /api/token/{id}.
    pub async fn delete_token(&self, id: i64) -> Result<(), ConsoleError> {
        let path = format!("/api/token/{id}");
        let resp = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("DELETE {path} failed: {e}");
                ConsoleError::Submit(e.to_string())
            })?;
        let envelope: ApiEnvelope<serde_json::Value> = resp.json().await.map_err(|e| {
            tracing::error!("DELETE {path} returned an unreadable body: {e}");
            ConsoleError::Submit(e.to_string())
        })?;
        if !envelope.success {
            return Err(ConsoleError::Submit(envelope.message));
        }
        Ok(())
    }
}
