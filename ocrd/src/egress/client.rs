use std::collections::HashSet;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, Proxy};

use crate::config::EgressConfig;
use crate::error::{OcrdError, Result};

/// Follow up to `max_redirects` hops and refuse to revisit a URL already
/// seen in the chain.
///
/// With `allowed_hosts`, a hop to any host outside the set is an error. The
/// unproxied client uses this so a trusted host cannot bounce it elsewhere.
pub fn redirect_policy(max_redirects: usize, allowed_hosts: Option<HashSet<String>>) -> Policy {
    // `previous()` already holds the URL that answered with this redirect.
    Policy::custom(move |attempt| {
        let leaves_allowed = allowed_hosts.as_ref().is_some_and(|hosts| {
            attempt
                .url()
                .host_str()
                .map_or(true, |host| !hosts.contains(&host.to_ascii_lowercase()))
        });

        if leaves_allowed {
            attempt.error("redirect to an untrusted host")
        } else if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if attempt.previous().iter().any(|seen| seen == attempt.url()) {
            attempt.error("redirect cycle detected")
        } else {
            attempt.follow()
        }
    })
}

/// Build an HTTP client for image fetches.
///
/// Environment proxies are always ignored; `proxy_url`, when given, routes
/// every request through that proxy (`socks5h://`, `http://`, ...).
/// `allowed_hosts` (lowercase) restricts where redirects may lead.
pub fn build_client(
    config: &EgressConfig,
    proxy_url: Option<&str>,
    allowed_hosts: Option<&HashSet<String>>,
) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(redirect_policy(
            config.max_redirects,
            allowed_hosts.cloned(),
        ))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .user_agent(concat!("ocrd/", env!("CARGO_PKG_VERSION")))
        .no_proxy();

    if let Some(proxy_url) = proxy_url {
        let proxy = Proxy::all(proxy_url)
            .map_err(|e| OcrdError::Config(format!("Invalid proxy URL '{proxy_url}': {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| OcrdError::Config(format!("Failed to create HTTP client: {e}")))
}
