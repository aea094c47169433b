use serde::Deserialize;
use std::env;
use std::path::PathBuf;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_list(val: &str) -> Vec<String> {
    val.split([',', '+'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `OCR_REVISIONS`.
/// Format: comma-separated `name=tessdata_dir` pairs, e.g. `fast=/usr/share/tessdata_fast,best=/usr/share/tessdata_best`
fn parse_revisions() -> Vec<RevisionConfig> {
    match env::var("OCR_REVISIONS") {
        Ok(val) if !val.trim().is_empty() => val
            .split(',')
            .filter_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                let name = parts.next()?.trim();
                let path = parts.next()?.trim();
                if name.is_empty() || path.is_empty() {
                    tracing::warn!("Invalid revision pair '{}' in OCR_REVISIONS, skipping", pair);
                    None
                } else {
                    Some(RevisionConfig {
                        name: name.to_string(),
                        data_path: Some(PathBuf::from(path)),
                    })
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub const DEFAULT_REVISION: &str = "default";

/// Image hosts fetched directly instead of through the proxy.
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "i.redd.it",
    "i.imgur.com",
    "pbs.twimg.com",
    "media.tenor.com",
    "cdn.discordapp.com",
    "media.discordapp.net",
    "raw.githubusercontent.com",
    "images-ext-1.discordapp.net",
    "images-ext-2.discordapp.net",
];

pub const DEFAULT_PROXY_URL: &str = "socks5h://127.1.1.1:9999";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub batch: BatchConfig,
    pub egress: EgressConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Body cap for `POST /`.
    pub max_body_bytes: usize,
    /// Body cap for `POST /batch`.
    pub max_batch_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Items of one batch recognized at the same time. 0 means no limit.
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    pub trusted_domains: Vec<String>,
    pub proxy_url: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
    pub max_redirects: usize,
    /// Upper bound on a fetched body after decompression.
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevisionConfig {
    pub name: String,
    /// tessdata directory; `None` lets tesseract use `TESSDATA_PREFIX` or its built-in path.
    pub data_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Engine revisions, first one is the default. Never empty.
    pub revisions: Vec<RevisionConfig>,
    /// Default tesseract language codes (`eng`, `deu`, ...).
    pub languages: Vec<String>,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub cache_size: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            revisions: vec![RevisionConfig {
                name: DEFAULT_REVISION.to_string(),
                data_path: None,
            }],
            languages: vec!["eng".to_string()],
            timeout_secs: 60,
            max_image_dimension: 4096,
            cache_size: 8,
        }
    }
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            trusted_domains: DEFAULT_TRUSTED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            proxy_url: Some(DEFAULT_PROXY_URL.to_string()),
            connect_timeout_secs: 2,
            read_timeout_secs: 60,
            pool_idle_timeout_secs: 60,
            pool_max_idle_per_host: 32,
            max_redirects: 20,
            max_response_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let egress_defaults = EgressConfig::default();
        let ocr_defaults = OcrConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("OCRD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("OCRD_PORT", 8080),
                max_body_bytes: parse_env_or("OCRD_MAX_BODY_BYTES", 24 * 1024 * 1024),
                max_batch_body_bytes: parse_env_or("OCRD_MAX_BATCH_BODY_BYTES", 128 * 1024 * 1024),
            },
            batch: BatchConfig {
                max_concurrency: parse_env_or("OCRD_BATCH_CONCURRENCY", 8),
            },
            egress: EgressConfig {
                trusted_domains: env::var("OCRD_TRUSTED_DOMAINS")
                    .map(|domains| {
                        parse_list(&domains)
                            .into_iter()
                            .map(|d| d.to_lowercase())
                            .collect()
                    })
                    .unwrap_or(egress_defaults.trusted_domains),
                proxy_url: match env::var("OCRD_PROXY_URL") {
                    Ok(url) if url.trim().is_empty() => None,
                    Ok(url) => Some(url.trim().to_string()),
                    Err(_) => egress_defaults.proxy_url,
                },
                connect_timeout_secs: parse_env_or(
                    "OCRD_CONNECT_TIMEOUT",
                    egress_defaults.connect_timeout_secs,
                ),
                read_timeout_secs: parse_env_or(
                    "OCRD_READ_TIMEOUT",
                    egress_defaults.read_timeout_secs,
                ),
                pool_idle_timeout_secs: parse_env_or(
                    "OCRD_POOL_IDLE_TIMEOUT",
                    egress_defaults.pool_idle_timeout_secs,
                ),
                pool_max_idle_per_host: parse_env_or(
                    "OCRD_POOL_MAX_IDLE",
                    egress_defaults.pool_max_idle_per_host,
                ),
                max_redirects: parse_env_or("OCRD_MAX_REDIRECTS", egress_defaults.max_redirects),
                max_response_bytes: parse_env_or(
                    "OCRD_MAX_RESPONSE_BYTES",
                    egress_defaults.max_response_bytes,
                ),
            },
            ocr: OcrConfig {
                revisions: {
                    let revisions = parse_revisions();
                    if revisions.is_empty() {
                        ocr_defaults.revisions
                    } else {
                        revisions
                    }
                },
                languages: env::var("OCR_LANGUAGES")
                    .map(|langs| parse_list(&langs))
                    .ok()
                    .filter(|langs| !langs.is_empty())
                    .unwrap_or(ocr_defaults.languages),
                timeout_secs: parse_env_or("OCR_TIMEOUT", ocr_defaults.timeout_secs),
                max_image_dimension: parse_env_or(
                    "OCR_MAX_DIMENSION",
                    ocr_defaults.max_image_dimension,
                ),
                cache_size: parse_env_or("OCR_ENGINE_CACHE_SIZE", ocr_defaults.cache_size),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
