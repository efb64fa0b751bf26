//! Account index integration.
//!
//! Defines the `AccountIndex` trait over the paginated token-account
//! service and provides the Helius JSON-RPC implementation.

pub mod helius;

use async_trait::async_trait;
use serde::Deserialize;

/// One token account as reported by the index.
///
/// Only the fields the tracker needs are deserialized; an owner may hold
/// several accounts for the same mint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenAccount {
    pub owner: String,
    /// Raw integer amount, before decimal normalization.
    #[serde(default)]
    pub amount: u64,
}

/// Outcome of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    /// A non-empty page; more pages may follow.
    Accounts(Vec<TokenAccount>),
    /// No accounts on this page: pagination is finished.
    Exhausted,
}

/// Fatal errors from the account index. Any of these aborts the scan.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Abstraction over paginated token-account indexes.
#[async_trait]
pub trait AccountIndex: Send + Sync {
    /// Fetch one page (1-based) of token accounts for `mint`.
    async fn fetch_page(&self, mint: &str, page: u32, limit: u32)
        -> Result<PageFetch, IndexError>;

    /// Index name for logging and identification.
    fn name(&self) -> &str;
}
