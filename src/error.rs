use ipnet::Ipv4Net;
use thiserror::Error;

/// Errors that stop a scan before it starts.
///
/// Closed ports and failed HTTP fetches are not errors; they show up as `false` / `None`
/// from the probes.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not determine local network: {0}")]
    NoLocalNetwork(String),

    #[error("invalid subnet `{input}`: {reason}")]
    InvalidSubnet { input: String, reason: String },

    #[error("subnet {0} has no host addresses to scan")]
    EmptySubnet(Ipv4Net),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
