//! Helius DAS `getTokenAccounts` integration.
//!
//! Pages through every token account of a mint via JSON-RPC.
//!
//! API docs: https://docs.helius.dev/compression-and-das-api/digital-asset-standard-das-api/get-token-accounts
//! Auth: `?api-key=` query parameter.
//! End of data: `result.token_accounts` missing or empty.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{AccountIndex, IndexError, PageFetch, TokenAccount};
use crate::config::IndexerConfig;

const INDEX_NAME: &str = "helius";
const METHOD: &str = "getTokenAccounts";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    id: &'a str,
    params: PageParams<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageParams<'a> {
    page: u32,
    limit: u32,
    display_options: DisplayOptions,
    mint: &'a str,
}

/// Serialized as `{}`; the tracker needs no display extensions.
#[derive(Debug, Serialize)]
struct DisplayOptions {}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<TokenAccountsResult>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct TokenAccountsResult {
    #[serde(default)]
    token_accounts: Option<Vec<TokenAccount>>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Helius account-index client.
pub struct HeliusClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    request_id: String,
}

impl HeliusClient {
    /// Create a new client.
    ///
    /// `timeout` is optional; without one the request waits as long as the
    /// server keeps the connection open.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<SecretString>,
        request_id: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent("TIERDRAW/0.1.0 (holder-tracker)");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("Failed to build HTTP client for Helius")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            request_id: request_id.into(),
        })
    }

    /// Build a client from the `[indexer]` config section.
    pub fn from_config(cfg: &IndexerConfig, api_key: Option<SecretString>) -> Result<Self> {
        Self::new(
            cfg.endpoint.clone(),
            api_key,
            cfg.request_id.clone(),
            cfg.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Endpoint URL including the API key, if one is configured.
    fn request_url(&self) -> String {
        match &self.api_key {
            Some(key) if !key.expose_secret().is_empty() => format!(
                "{}?api-key={}",
                self.endpoint,
                urlencoding::encode(key.expose_secret())
            ),
            _ => self.endpoint.clone(),
        }
    }

    fn request_body<'a>(&'a self, mint: &'a str, page: u32, limit: u32) -> RpcRequest<'a> {
        RpcRequest {
            jsonrpc: "2.0",
            method: METHOD,
            id: &self.request_id,
            params: PageParams {
                page,
                limit,
                display_options: DisplayOptions {},
                mint,
            },
        }
    }

    /// Interpret a successful (2xx) response body.
    fn parse_page(body: &str) -> Result<PageFetch, IndexError> {
        let resp: RpcResponse = serde_json::from_str(body)?;

        if let Some(err) = resp.error {
            return Err(IndexError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        match resp.result.and_then(|r| r.token_accounts) {
            Some(accounts) if !accounts.is_empty() => Ok(PageFetch::Accounts(accounts)),
            _ => Ok(PageFetch::Exhausted),
        }
    }
}

// ---------------------------------------------------------------------------
// AccountIndex trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl AccountIndex for HeliusClient {
    async fn fetch_page(
        &self,
        mint: &str,
        page: u32,
        limit: u32,
    ) -> Result<PageFetch, IndexError> {
        debug!(page, limit, mint, "Fetching token account page");

        let resp = self
            .http
            .post(self.request_url())
            .json(&self.request_body(mint, page, limit))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(IndexError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_page(&body)
    }

    fn name(&self) -> &str {
        INDEX_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
