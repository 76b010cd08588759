mod common;

use common::page;
use hv_scan::classify::{classify, is_interesting};
use hv_scan::types::HypervisorKind;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);

#[test]
fn proxmox_on_8006() {
    let http = BTreeMap::from([(8006, page("<title>pve-manager</title>"))]);
    let host = classify(IP, &[8006], &http);
    assert_eq!(host.kind, HypervisorKind::ProxmoxVe);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:8006"]);
    assert!(is_interesting(&host));
}

#[test]
fn esxi_suspected_from_902_and_443() {
    let host = classify(IP, &[902, 443], &BTreeMap::new());
    assert_eq!(host.kind, HypervisorKind::VmwareEsxiSuspected);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:443"]);
    assert_eq!(host.open_ports, vec![443, 902]);
}

#[test]
fn hyper_v_suspected_from_winrm_without_ssh() {
    let host = classify(IP, &[5985], &BTreeMap::new());
    assert_eq!(host.kind, HypervisorKind::HyperVSuspected);
    assert!(host.access_urls.is_empty());

    let with_https = classify(IP, &[443, 5986], &BTreeMap::new());
    assert_eq!(with_https.kind, HypervisorKind::HyperVSuspected);
    assert_eq!(with_https.access_urls, vec!["https://192.168.1.20:443"]);
}

#[test]
fn ssh_only_host_is_unknown_and_filtered() {
    let host = classify(IP, &[22], &BTreeMap::new());
    assert_eq!(host.kind, HypervisorKind::Unknown);
    assert!(host.access_urls.is_empty());
    assert!(!is_interesting(&host));
}

#[test]
fn first_matching_response_in_probe_order_wins() {
    // Port 80 looks like VMware, 8006 would be Proxmox; 80 is inspected first.
    let http = BTreeMap::from([
        (80, page("Welcome to VMware ESXi")),
        (443, page("")),
        (8006, page("Proxmox Virtual Environment")),
    ]);
    let host = classify(IP, &[80, 443, 8006], &http);
    assert_eq!(host.kind, HypervisorKind::VmwareVsphere);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:443"]);
}

#[test]
fn unmatched_early_response_does_not_stop_the_search() {
    let http = BTreeMap::from([
        (80, page("It works!")),
        (8006, page("")),
    ]);
    let host = classify(IP, &[22, 80, 8006], &http);
    assert_eq!(host.kind, HypervisorKind::ProxmoxVe);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:8006"]);
}

#[test]
fn proxmox_match_on_443_points_at_8006_when_open() {
    let mut resp = page("<html></html>");
    resp.headers.insert("server".into(), "pve-api-daemon/3.0".into());
    let http = BTreeMap::from([(443, resp)]);
    let host = classify(IP, &[22, 443, 8006], &http);
    assert_eq!(host.kind, HypervisorKind::ProxmoxVe);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:8006"]);

    let body_only = BTreeMap::from([(443, page("Proxmox Virtual Environment"))]);
    let host = classify(IP, &[443, 8006], &body_only);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:8006"]);
}

#[test]
fn vmware_match_on_443_points_at_9443_when_open() {
    let http = BTreeMap::from([(443, page("vSphere Web Client"))]);
    let host = classify(IP, &[443, 9443], &http);
    assert_eq!(host.kind, HypervisorKind::VmwareVsphere);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:9443"]);
}

#[test]
fn vmware_header_match() {
    let mut resp = page("<html></html>");
    resp.headers.insert("server".into(), "VMware Web Services".into());
    let http = BTreeMap::from([(443, resp)]);
    let host = classify(IP, &[443], &http);
    assert_eq!(host.kind, HypervisorKind::VmwareVsphere);
    assert_eq!(host.access_urls, vec!["https://192.168.1.20:443"]);
}

#[test]
fn single_notable_port_is_interesting_even_when_unknown() {
    let host = classify(IP, &[902], &BTreeMap::new());
    assert_eq!(host.kind, HypervisorKind::Unknown);
    assert!(is_interesting(&host));
}

#[test]
fn single_web_server_is_reported_as_possible_hypervisor() {
    let host = classify(IP, &[443], &BTreeMap::new());
    assert_eq!(host.kind, HypervisorKind::PossibleHypervisor);
    assert!(is_interesting(&host));
}
