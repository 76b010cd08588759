//! Library crate for hv-scan: finds hypervisor hosts on an IPv4 subnet.
pub mod classify;
pub mod error;
pub mod logging;
pub mod netdetect;
pub mod ports;
pub mod probe;
pub mod scanner;
pub mod types;
