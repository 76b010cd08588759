use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

/// Transport used to talk to a port.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Plain,
    Tls,
}

impl Scheme {
    /// URL scheme for an HTTP request over this transport.
    pub fn http_scheme(self) -> &'static str {
        match self {
            Scheme::Plain => "http",
            Scheme::Tls => "https",
        }
    }
}

/// Detected platform of a host.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HypervisorKind {
    #[serde(rename = "Proxmox VE")]
    ProxmoxVe,
    #[serde(rename = "VMware vSphere/ESXi")]
    VmwareVsphere,
    #[serde(rename = "VMware ESXi (suspected)")]
    VmwareEsxiSuspected,
    #[serde(rename = "Microsoft Hyper-V")]
    HyperV,
    #[serde(rename = "Microsoft Hyper-V (suspected)")]
    HyperVSuspected,
    #[serde(rename = "Possible Hypervisor")]
    PossibleHypervisor,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl HypervisorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HypervisorKind::ProxmoxVe => "Proxmox VE",
            HypervisorKind::VmwareVsphere => "VMware vSphere/ESXi",
            HypervisorKind::VmwareEsxiSuspected => "VMware ESXi (suspected)",
            HypervisorKind::HyperV => "Microsoft Hyper-V",
            HypervisorKind::HyperVSuspected => "Microsoft Hyper-V (suspected)",
            HypervisorKind::PossibleHypervisor => "Possible Hypervisor",
            HypervisorKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HypervisorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix of one HTTP(S) response, handed straight to the classifier.
///
/// Header names are lower-cased. A header sent more than once keeps every value,
/// joined with `", "` in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpProbeResult {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// At most [`crate::probe::BODY_PREFIX_LIMIT`] bytes of the body, lossy UTF-8.
    pub body: String,
    pub final_url: String,
}

/// Classification of a single host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HostResult {
    pub ip: Ipv4Addr,
    #[serde(rename = "type")]
    pub kind: HypervisorKind,
    /// Ascending, no duplicates.
    pub open_ports: Vec<u16>,
    pub access_urls: Vec<String>,
}

/// Outcome of a subnet scan; `hosts` is sorted by address.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanReport {
    pub subnet: String,
    pub started_at: String,
    pub finished_at: String,
    pub hosts_total: u64,
    pub hosts_scanned: u64,
    pub hosts_alive: u64,
    pub interrupted: bool,
    pub hosts: Vec<HostResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_display_name() {
        let json = serde_json::to_string(&HypervisorKind::VmwareEsxiSuspected).unwrap();
        assert_eq!(json, "\"VMware ESXi (suspected)\"");
        assert_eq!(HypervisorKind::HyperV.to_string(), "Microsoft Hyper-V");
    }

    #[test]
    fn host_result_json_shape() {
        let host = HostResult {
            ip: Ipv4Addr::new(192, 168, 1, 10),
            kind: HypervisorKind::ProxmoxVe,
            open_ports: vec![22, 8006],
            access_urls: vec!["https://192.168.1.10:8006".into()],
        };
        let v = serde_json::to_value(&host).unwrap();
        assert_eq!(v["ip"], "192.168.1.10");
        assert_eq!(v["type"], "Proxmox VE");
        assert_eq!(v["open_ports"], serde_json::json!([22, 8006]));
    }
}
