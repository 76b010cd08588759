use crate::error::ScanError;
use crate::types::{HttpProbeResult, Scheme};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

/// Maximum number of body bytes kept from an HTTP response, after UTF-8 decoding.
pub const BODY_PREFIX_LIMIT: usize = 2048;

/// Raw bytes read off the wire; the slack lets a character straddling the limit decode whole.
const RAW_BODY_LIMIT: usize = BODY_PREFIX_LIMIT + 3;

/// Network operations the scan coordinator needs for one host.
///
/// Both methods report expected failures (refused, filtered, timed out, bad TLS) as
/// `false` / `None` instead of an error.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe_port(&self, ip: Ipv4Addr, port: u16, timeout: Duration) -> bool;

    async fn fetch(
        &self,
        ip: Ipv4Addr,
        port: u16,
        scheme: Scheme,
        timeout: Duration,
    ) -> Option<HttpProbeResult>;
}

/// [`Prober`] that talks to the real network.
#[derive(Debug, Clone)]
pub struct NetworkProber {
    client: Client,
}

impl NetworkProber {
    /// Build the shared HTTP client. Certificate validation is off: hypervisor
    /// management interfaces almost always serve self-signed certificates.
    /// LAN targets are always contacted directly, never through a system proxy.
    pub fn new() -> Result<Self, ScanError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .no_proxy()
            .user_agent(concat!("hv-scan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn probe_port(&self, ip: Ipv4Addr, port: u16, timeout: Duration) -> bool {
        probe_port(SocketAddr::from((ip, port)), timeout).await
    }

    async fn fetch(
        &self,
        ip: Ipv4Addr,
        port: u16,
        scheme: Scheme,
        timeout: Duration,
    ) -> Option<HttpProbeResult> {
        let url = format!("{}://{}:{}", scheme.http_scheme(), ip, port);
        match fetch_url(&self.client, &url, timeout).await {
            Ok(res) => Some(res),
            Err(e) => {
                debug!(%url, error = %e, "http probe failed");
                None
            }
        }
    }
}

/// TCP connect check. `true` iff the connection is established within `timeout`.
pub async fn probe_port(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(time::timeout(timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
}

/// Single GET against `url`, following redirects, keeping only the first
/// [`BODY_PREFIX_LIMIT`] bytes of the decoded body. No retries.
pub async fn fetch_url(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<HttpProbeResult, reqwest::Error> {
    let mut resp = client.get(url).timeout(timeout).send().await?;

    let status = resp.status().as_u16();
    let final_url = resp.url().to_string();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in resp.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(&value);
            })
            .or_insert(value);
    }

    let mut raw = Vec::with_capacity(RAW_BODY_LIMIT);
    while raw.len() < RAW_BODY_LIMIT {
        match resp.chunk().await? {
            Some(chunk) => {
                let take = (RAW_BODY_LIMIT - raw.len()).min(chunk.len());
                raw.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }

    Ok(HttpProbeResult {
        status,
        headers,
        body: decode_body_prefix(&raw),
        final_url,
    })
}

/// Lossy UTF-8 decode, then cut at the last char boundary within [`BODY_PREFIX_LIMIT`].
///
/// Invalid bytes become U+FFFD (3 bytes each), so the cut must happen after decoding.
fn decode_body_prefix(raw: &[u8]) -> String {
    let mut body = String::from_utf8_lossy(raw).into_owned();
    if body.len() > BODY_PREFIX_LIMIT {
        let mut end = BODY_PREFIX_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
