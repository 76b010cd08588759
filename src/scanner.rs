use crate::classify::{classify, is_interesting};
use crate::error::ScanError;
use crate::netdetect;
use crate::ports::{self, LIVENESS_PORTS, PORT_CHECKS};
use crate::probe::{NetworkProber, Prober};
use crate::types::{HostResult, ScanReport};
use ::time::{format_description::well_known, OffsetDateTime};
use ipnet::Ipv4Net;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Tunables for a subnet scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum number of hosts scanned at once.
    pub concurrency: usize,
    /// Connect timeout for the 22/80/443 reachability check.
    pub liveness_timeout: Duration,
    /// Connect timeout for each port of the full port list.
    pub port_timeout: Duration,
    /// Whole-request timeout for each HTTP(S) fetch.
    pub http_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 50,
            liveness_timeout: Duration::from_secs(1),
            port_timeout: Duration::from_secs(2),
            http_timeout: Duration::from_secs(5),
        }
    }
}

/// What scanning one host produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    /// No answer on any liveness port; nothing else was probed.
    Offline,
    /// Classified, but filtered out of the report.
    Unremarkable(HostResult),
    /// Classified and reported.
    Interesting(HostResult),
    /// Dropped because the scan was cancelled.
    Abandoned,
}

/// Live counters and results, shareable with an observer while a scan runs.
#[derive(Clone, Debug)]
pub struct SharedProgress {
    pub hosts_done: Arc<AtomicU64>,
    pub hosts_alive: Arc<AtomicU64>,
    pub found: Arc<AtomicU64>,
    pub entries: Arc<Mutex<Vec<HostResult>>>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self {
            hosts_done: Arc::new(AtomicU64::new(0)),
            hosts_alive: Arc::new(AtomicU64::new(0)),
            found: Arc::new(AtomicU64::new(0)),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for SharedProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan every host address of `subnet` over the real network.
pub async fn scan(subnet: Ipv4Net, config: &ScanConfig) -> Result<ScanReport, ScanError> {
    scan_with_cancel(subnet, config, CancellationToken::new()).await
}

/// Variant that accepts a `CancellationToken`; a cancelled scan returns a partial report.
pub async fn scan_with_cancel(
    subnet: Ipv4Net,
    config: &ScanConfig,
    cancel: CancellationToken,
) -> Result<ScanReport, ScanError> {
    let prober = Arc::new(NetworkProber::new()?);
    scan_with_prober(prober, subnet, config, cancel, SharedProgress::new()).await
}

/// Scan `subnet` using `prober` for all network access.
///
/// - Hosts run concurrently, at most `config.concurrency` at a time (`Semaphore`).
/// - Each host is scanned in its own task; a task that panics contributes nothing.
/// - On cancellation no new hosts start and in-flight hosts are abandoned.
/// - The returned hosts are sorted by address.
pub async fn scan_with_prober<P>(
    prober: Arc<P>,
    subnet: Ipv4Net,
    config: &ScanConfig,
    cancel: CancellationToken,
    shared: SharedProgress,
) -> Result<ScanReport, ScanError>
where
    P: Prober + 'static,
{
    let targets = netdetect::expand_hosts(subnet);
    if targets.is_empty() {
        return Err(ScanError::EmptySubnet(subnet));
    }
    let started_at = now_iso_like();
    let config = *config;
    info!(
        %subnet,
        hosts = targets.len(),
        concurrency = config.concurrency,
        "starting hypervisor scan"
    );

    let sem = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut set = JoinSet::new();

    for ip in targets.iter().copied() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = sem.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
        };
        let prober = prober.clone();
        let cancel = cancel.clone();
        let shared = shared.clone();

        set.spawn(async move {
            let _permit = permit; // keep permit until task completes

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => HostOutcome::Abandoned,
                outcome = scan_host(prober.as_ref(), ip, &config) => outcome,
            };

            match &outcome {
                HostOutcome::Offline => debug!(%ip, "no answer on liveness ports"),
                HostOutcome::Unremarkable(host) => {
                    shared.hosts_alive.fetch_add(1, Ordering::Relaxed);
                    debug!(%ip, ports = ?host.open_ports, "host not interesting");
                }
                HostOutcome::Interesting(host) => {
                    shared.hosts_alive.fetch_add(1, Ordering::Relaxed);
                    shared.found.fetch_add(1, Ordering::Relaxed);
                    info!(
                        %ip,
                        kind = %host.kind,
                        ports = ?host.open_ports,
                        "found {} at {}",
                        host.kind,
                        ip
                    );
                    shared.entries.lock().await.push(host.clone());
                }
                HostOutcome::Abandoned => return,
            }
            shared.hosts_done.fetch_add(1, Ordering::Relaxed);
        });
    }

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "host scan task failed; host skipped");
        }
    }

    let mut hosts = shared.entries.lock().await.clone();
    hosts.sort_by_key(|h| h.ip);

    let interrupted = cancel.is_cancelled();
    let report = ScanReport {
        subnet: subnet.to_string(),
        started_at,
        finished_at: now_iso_like(),
        hosts_total: targets.len() as u64,
        hosts_scanned: shared.hosts_done.load(Ordering::Relaxed),
        hosts_alive: shared.hosts_alive.load(Ordering::Relaxed),
        interrupted,
        hosts,
    };
    if interrupted {
        info!(
            scanned = report.hosts_scanned,
            found = report.hosts.len(),
            "scan interrupted; returning partial report"
        );
    } else {
        info!(found = report.hosts.len(), alive = report.hosts_alive, "scan complete");
    }
    Ok(report)
}

/// Scan a single host: liveness check, full port list, HTTP fetches on open web ports,
/// then classification and the interestingness filter.
///
/// Ports are probed one after another; the scan parallelises across hosts instead.
pub async fn scan_host<P>(prober: &P, ip: Ipv4Addr, config: &ScanConfig) -> HostOutcome
where
    P: Prober + ?Sized,
{
    if !is_alive(prober, ip, config.liveness_timeout).await {
        return HostOutcome::Offline;
    }

    let mut open_ports = Vec::new();
    let mut http = BTreeMap::new();
    for check in PORT_CHECKS {
        if !prober.probe_port(ip, check.port, config.port_timeout).await {
            continue;
        }
        debug!(%ip, port = check.port, service = check.service, "port open");
        open_ports.push(check.port);
        if ports::is_web_port(check.port) {
            if let Some(resp) = prober
                .fetch(ip, check.port, check.scheme, config.http_timeout)
                .await
            {
                http.insert(check.port, resp);
            }
        }
    }

    let host = classify(ip, &open_ports, &http);
    if is_interesting(&host) {
        HostOutcome::Interesting(host)
    } else {
        HostOutcome::Unremarkable(host)
    }
}

/// Stops at the first liveness port that answers.
async fn is_alive<P>(prober: &P, ip: Ipv4Addr, timeout: Duration) -> bool
where
    P: Prober + ?Sized,
{
    for &port in LIVENESS_PORTS {
        if prober.probe_port(ip, port, timeout).await {
            return true;
        }
    }
    false
}

fn now_iso_like() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
