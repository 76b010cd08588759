use crate::types::Scheme;

pub const SSH: u16 = 22;
pub const HTTP: u16 = 80;
pub const HTTPS: u16 = 443;
pub const VMWARE_AUTHD: u16 = 902;
pub const PROXMOX_WEB: u16 = 8006;
pub const VCENTER_WEB: u16 = 9443;
pub const WINRM_HTTPS: u16 = 5986;
pub const WINRM_HTTP: u16 = 5985;

/// One entry of the fixed port list probed on every live host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortCheck {
    pub port: u16,
    pub scheme: Scheme,
    pub service: &'static str,
}

/// Ports probed on every host, in probe order.
///
/// 5986 is WinRM over HTTPS but is only ever TCP-probed, never fetched, so its scheme
/// does not matter to the scan.
pub const PORT_CHECKS: &[PortCheck] = &[
    PortCheck {
        port: SSH,
        scheme: Scheme::Plain,
        service: "ssh",
    },
    PortCheck {
        port: HTTP,
        scheme: Scheme::Plain,
        service: "http",
    },
    PortCheck {
        port: HTTPS,
        scheme: Scheme::Tls,
        service: "https",
    },
    PortCheck {
        port: VMWARE_AUTHD,
        scheme: Scheme::Plain,
        service: "vmware-authd",
    },
    PortCheck {
        port: PROXMOX_WEB,
        scheme: Scheme::Tls,
        service: "proxmox-web",
    },
    PortCheck {
        port: VCENTER_WEB,
        scheme: Scheme::Tls,
        service: "vcenter-web",
    },
    PortCheck {
        port: WINRM_HTTPS,
        scheme: Scheme::Plain,
        service: "winrm-https",
    },
    PortCheck {
        port: WINRM_HTTP,
        scheme: Scheme::Plain,
        service: "winrm-http",
    },
];

/// Quick reachability ports; a host answering on none of them is skipped.
pub const LIVENESS_PORTS: &[u16] = &[SSH, HTTP, HTTPS];

/// Ports whose content is fetched over HTTP(S) when open, in probe order.
pub const WEB_PORTS: &[u16] = &[HTTP, HTTPS, PROXMOX_WEB, VCENTER_WEB];

/// Any of these open makes a host worth reporting on its own.
pub const NOTABLE_PORTS: &[u16] = &[
    PROXMOX_WEB,
    VCENTER_WEB,
    VMWARE_AUTHD,
    WINRM_HTTP,
    WINRM_HTTPS,
];

pub fn is_web_port(port: u16) -> bool {
    WEB_PORTS.contains(&port)
}

/// Look up the check entry for a port from the fixed list.
pub fn port_check(port: u16) -> Option<&'static PortCheck> {
    PORT_CHECKS.iter().find(|c| c.port == port)
}
