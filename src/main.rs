use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use hv_scan::scanner::{self, ScanConfig};
use hv_scan::types::ScanReport;
use hv_scan::{logging, netdetect};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// hv-scan: finds Hyper-V, Proxmox and VMware hosts on the local IPv4 subnet.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hv-scan",
    version,
    about = "Finds Hyper-V, Proxmox and VMware hosts on the local IPv4 subnet.",
    long_about = None
)]
struct Cli {
    /// Subnet to scan as CIDR (e.g. 192.168.1.0/24) or a bare IP meaning its /24.
    /// If omitted, the local /24 is detected.
    #[arg(long)]
    subnet: Option<String>,

    /// Max hosts scanned concurrently.
    #[arg(long, default_value_t = 50)]
    concurrency: usize,

    /// Connect timeout for each probed port, in milliseconds.
    #[arg(long = "port-timeout-ms", default_value_t = 2000)]
    port_timeout_ms: u64,

    /// Connect timeout for the 22/80/443 reachability check, in milliseconds.
    #[arg(long = "liveness-timeout-ms", default_value_t = 1000)]
    liveness_timeout_ms: u64,

    /// Timeout for each HTTP(S) fetch, in milliseconds.
    #[arg(long = "http-timeout-ms", default_value_t = 5000)]
    http_timeout_ms: u64,

    /// Write the report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            concurrency: self.concurrency.max(1),
            liveness_timeout: Duration::from_millis(self.liveness_timeout_ms),
            port_timeout: Duration::from_millis(self.port_timeout_ms),
            http_timeout: Duration::from_millis(self.http_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_tracing(cli.verbose)?;

    println!("Hypervisor Network Scanner");
    println!("Detecting Hyper-V, Proxmox, and VMware hypervisors...\n");

    let subnet = match cli.subnet.as_deref() {
        Some(s) => netdetect::parse_subnet(s)?,
        None => netdetect::detect_local_subnet().context("could not determine local network")?,
    };

    println!("Scanning network: {subnet}");
    println!("This may take a few minutes...\n");

    // Ctrl-C cancels the scan; the partial report is still printed.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    let start = Instant::now();
    let report = scanner::scan_with_cancel(subnet, &cli.scan_config(), cancel).await?;

    if report.interrupted {
        println!("\n\nScan interrupted by user.");
    }
    print_results(&report);
    if !report.interrupted {
        println!("\nScan completed in {:.2} seconds", start.elapsed().as_secs_f64());
    }

    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_report_json(path, &report) {
            warn!(path = %path.display(), error = %e, "failed to write JSON report");
        } else {
            println!("Wrote JSON report to {}", path.display());
        }
    }

    Ok(())
}

fn print_results(report: &ScanReport) {
    println!("\n{}", "=".repeat(60));
    println!("HYPERVISOR SCAN RESULTS");
    println!("{}", "=".repeat(60));

    if report.hosts.is_empty() {
        println!("No hypervisors detected on the network.");
        return;
    }

    for (i, host) in report.hosts.iter().enumerate() {
        let ports: Vec<String> = host.open_ports.iter().map(u16::to_string).collect();
        println!("\n{}. {}", i + 1, host.kind);
        println!("   IP Address: {}", host.ip);
        println!("   Open Ports: {}", ports.join(", "));
        if host.access_urls.is_empty() {
            println!("   Access URLs: None detected");
        } else {
            println!("   Access URLs:");
            for url in &host.access_urls {
                println!("     - {url}");
            }
        }
    }

    println!("\nTotal hypervisors found: {}", report.hosts.len());
}

fn write_report_json(path: &std::path::Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
