//! Outbound fetch policy.
//!
//! Hosts on the trusted allowlist are fetched directly; everything else goes
//! through the proxied client. Both paths share the same timeouts, redirect
//! policy and body cap.

pub mod client;
mod fetcher;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::config::EgressConfig;
use crate::error::Result;

pub use fetcher::{FetchError, FetchResponse, Fetcher, HttpFetcher};

/// Which client a URL is fetched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Proxied,
}

/// Immutable after construction; share it behind an `Arc`.
pub struct EgressPolicy {
    trusted_domains: HashSet<String>,
    direct: Arc<dyn Fetcher>,
    proxied: Arc<dyn Fetcher>,
}

impl EgressPolicy {
    pub fn new<I, S>(trusted_domains: I, direct: Arc<dyn Fetcher>, proxied: Arc<dyn Fetcher>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted_domains: trusted_domains
                .into_iter()
                .map(|d| d.into().to_ascii_lowercase())
                .collect(),
            direct,
            proxied,
        }
    }

    /// Build both reqwest-backed fetchers from configuration.
    ///
    /// The direct client refuses redirects that leave the allowlist, so an
    /// untrusted host is never reached without the proxy.
    pub fn from_config(config: &EgressConfig) -> Result<Self> {
        let trusted: HashSet<String> = config
            .trusted_domains
            .iter()
            .map(|d| d.to_ascii_lowercase())
            .collect();

        let direct = HttpFetcher::new(
            client::build_client(config, None, Some(&trusted))?,
            config.max_response_bytes,
        );
        let proxied = HttpFetcher::new(
            client::build_client(config, config.proxy_url.as_deref(), None)?,
            config.max_response_bytes,
        );

        Ok(Self::new(trusted, Arc::new(direct), Arc::new(proxied)))
    }

    /// Exact host match against the allowlist; URLs without a host are proxied.
    pub fn route(&self, url: &Url) -> Route {
        match url.host_str() {
            Some(host) if self.trusted_domains.contains(&host.to_ascii_lowercase()) => {
                Route::Direct
            }
            _ => Route::Proxied,
        }
    }

    pub async fn fetch(&self, url: &Url) -> std::result::Result<FetchResponse, FetchError> {
        let route = self.route(url);
        debug!(host = url.host_str().unwrap_or(""), ?route, "Fetching image");

        match route {
            Route::Direct => self.direct.get(url).await,
            Route::Proxied => self.proxied.get(url).await,
        }
    }
}

impl std::fmt::Debug for EgressPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EgressPolicy")
            .field("trusted_domains", &self.trusted_domains)
            .finish_non_exhaustive()
    }
}
