#![allow(dead_code)]

use async_trait::async_trait;
use hv_scan::probe::Prober;
use hv_scan::types::{HttpProbeResult, Scheme};
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Scripted host for the in-memory network.
#[derive(Clone, Default)]
pub struct FakeHost {
    pub open: Vec<u16>,
    pub pages: HashMap<u16, HttpProbeResult>,
    /// Added to every probe against this host.
    pub delay: Duration,
    pub panic: bool,
}

impl FakeHost {
    pub fn with_ports(open: &[u16]) -> Self {
        Self {
            open: open.to_vec(),
            ..Default::default()
        }
    }

    pub fn page(mut self, port: u16, body: &str) -> Self {
        self.pages.insert(port, page(body));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Deterministic [`Prober`] backed by a map of scripted hosts; unknown hosts are dark.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    pub hosts: HashMap<Ipv4Addr, FakeHost>,
}

impl FakeNetwork {
    pub fn host(mut self, ip: Ipv4Addr, host: FakeHost) -> Self {
        self.hosts.insert(ip, host);
        self
    }
}

#[async_trait]
impl Prober for FakeNetwork {
    async fn probe_port(&self, ip: Ipv4Addr, port: u16, _timeout: Duration) -> bool {
        let Some(host) = self.hosts.get(&ip) else {
            return false;
        };
        if host.panic {
            panic!("scripted failure for {ip}");
        }
        if !host.delay.is_zero() {
            tokio::time::sleep(host.delay).await;
        }
        host.open.contains(&port)
    }

    async fn fetch(
        &self,
        ip: Ipv4Addr,
        port: u16,
        scheme: Scheme,
        _timeout: Duration,
    ) -> Option<HttpProbeResult> {
        let host = self.hosts.get(&ip)?;
        let mut resp = host.pages.get(&port)?.clone();
        resp.final_url = format!("{}://{}:{}/", scheme.http_scheme(), ip, port);
        Some(resp)
    }
}

pub fn page(body: &str) -> HttpProbeResult {
    HttpProbeResult {
        status: 200,
        headers: BTreeMap::new(),
        body: body.to_string(),
        final_url: String::new(),
    }
}
