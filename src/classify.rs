use crate::ports::{
    self, HTTP, HTTPS, PROXMOX_WEB, SSH, VCENTER_WEB, VMWARE_AUTHD, WINRM_HTTP, WINRM_HTTPS,
};
use crate::types::{HostResult, HttpProbeResult, HypervisorKind};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Content signature that identifies a platform from one HTTP response.
///
/// A response matches when any of these hold:
/// - it came from `port`
/// - the lower-cased body contains every `body_all` keyword and at least one `body_any` keyword
/// - some header value contains one of `header_any`
struct Signature {
    kind: HypervisorKind,
    port: Option<u16>,
    body_all: &'static [&'static str],
    body_any: &'static [&'static str],
    header_any: &'static [&'static str],
    /// Candidate management ports; the first open one becomes the access URL.
    url_ports: &'static [u16],
}

/// Checked in order for each response; the first match wins.
const SIGNATURES: &[Signature] = &[
    Signature {
        kind: HypervisorKind::ProxmoxVe,
        port: Some(PROXMOX_WEB),
        body_all: &[],
        body_any: &["proxmox", "pve-manager"],
        header_any: &["pve-api-daemon"],
        url_ports: &[PROXMOX_WEB, HTTPS],
    },
    Signature {
        kind: HypervisorKind::VmwareVsphere,
        port: Some(VCENTER_WEB),
        body_all: &[],
        body_any: &["vmware", "vsphere", "vcenter"],
        header_any: &["vmware"],
        url_ports: &[VCENTER_WEB, HTTPS],
    },
    Signature {
        kind: HypervisorKind::HyperV,
        port: None,
        body_all: &["microsoft"],
        body_any: &["hyper-v", "scvmm"],
        header_any: &[],
        url_ports: &[HTTPS],
    },
];

impl Signature {
    fn matches(&self, port: u16, body_lower: &str, headers_lower: &[String]) -> bool {
        if self.port == Some(port) {
            return true;
        }
        let body_hit = self.body_all.iter().all(|k| body_lower.contains(k))
            && self.body_any.iter().any(|k| body_lower.contains(k));
        body_hit
            || self
                .header_any
                .iter()
                .any(|k| headers_lower.iter().any(|v| v.contains(k)))
    }
}

/// Classify a host from its open ports and the HTTP responses captured on its web ports.
///
/// Responses are inspected in probe order and the first one matching a signature decides
/// the type; later responses are ignored. Without an HTTP match, port combinations decide.
pub fn classify(
    ip: Ipv4Addr,
    open_ports: &[u16],
    http: &BTreeMap<u16, HttpProbeResult>,
) -> HostResult {
    let mut ports_sorted = open_ports.to_vec();
    ports_sorted.sort_unstable();
    ports_sorted.dedup();
    let is_open = |p: u16| ports_sorted.contains(&p);

    let from_http = ports::WEB_PORTS.iter().find_map(|&port| {
        let resp = http.get(&port)?;
        let body_lower = resp.body.to_lowercase();
        let headers_lower: Vec<String> =
            resp.headers.values().map(|v| v.to_lowercase()).collect();
        SIGNATURES
            .iter()
            .find(|sig| sig.matches(port, &body_lower, &headers_lower))
            .map(|sig| {
                let url_port = sig.url_ports.iter().copied().find(|p| is_open(*p));
                (sig.kind, url_port.map(|p| https_url(ip, p)))
            })
    });

    let (kind, url) = match from_http {
        Some(found) => found,
        None => classify_by_ports(ip, &is_open),
    };

    HostResult {
        ip,
        kind,
        open_ports: ports_sorted,
        access_urls: url.into_iter().collect(),
    }
}

fn classify_by_ports(
    ip: Ipv4Addr,
    is_open: &dyn Fn(u16) -> bool,
) -> (HypervisorKind, Option<String>) {
    if is_open(VMWARE_AUTHD) && is_open(HTTPS) {
        (HypervisorKind::VmwareEsxiSuspected, Some(https_url(ip, HTTPS)))
    } else if (is_open(WINRM_HTTP) || is_open(WINRM_HTTPS)) && !is_open(SSH) {
        let url = is_open(HTTPS).then(|| https_url(ip, HTTPS));
        (HypervisorKind::HyperVSuspected, url)
    } else if is_open(HTTPS) {
        (HypervisorKind::PossibleHypervisor, Some(https_url(ip, HTTPS)))
    } else if is_open(HTTP) {
        (HypervisorKind::PossibleHypervisor, Some(format!("http://{ip}:{HTTP}")))
    } else {
        (HypervisorKind::Unknown, None)
    }
}

fn https_url(ip: Ipv4Addr, port: u16) -> String {
    format!("https://{ip}:{port}")
}

/// Whether a classified host belongs in the report.
///
/// Plain hosts that only expose SSH or a single generic web server are dropped.
pub fn is_interesting(host: &HostResult) -> bool {
    host.kind != HypervisorKind::Unknown
        || host.open_ports.len() >= 2
        || host.open_ports.iter().any(|p| ports::NOTABLE_PORTS.contains(p))
}
