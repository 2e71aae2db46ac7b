//! Host address auto-detection
//!
//! Fallback chain for the public address of the machine being provisioned:
//! a fixed sequence of HTTPS address-echo services (each bounded by a short
//! timeout, tried strictly in order), then the first address of a local
//! interface, then a literal placeholder. Probe failures are recovered here
//! and never surface as errors; callers only see the provenance flag.

use std::net::IpAddr;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::params::HostAddressSource;
use crate::types::PLACEHOLDER_HOST;

/// Address-echo endpoints, tried in order. Each returns the caller's public
/// address as plain text.
pub const PROBE_ENDPOINTS: [&str; 3] = [
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
];

/// Per-probe timeout. The whole chain waits at most
/// `PROBE_ENDPOINTS.len() * PROBE_TIMEOUT`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Seam for host-address detection so the resolver is testable offline.
pub trait AddressDetector {
    /// Always succeeds; the worst case is the placeholder literal.
    fn detect(&self) -> (String, HostAddressSource);
}

// ============================================================================
// Production Detector
// ============================================================================

/// The real fallback chain: echo services, local interface, placeholder.
#[derive(Debug, Default)]
pub struct EchoServiceDetector;

impl EchoServiceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl AddressDetector for EchoServiceDetector {
    fn detect(&self) -> (String, HostAddressSource) {
        if let Some(addr) = probe_echo_services() {
            return (addr.to_string(), HostAddressSource::Probe);
        }
        if let Some(addr) = local_interface_address() {
            return (addr.to_string(), HostAddressSource::LocalInterface);
        }
        (PLACEHOLDER_HOST.to_string(), HostAddressSource::Placeholder)
    }
}

fn probe_echo_services() -> Option<IpAddr> {
    let client = match reqwest::blocking::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            debug!("could not build probe client: {}", err);
            return None;
        }
    };

    for endpoint in PROBE_ENDPOINTS {
        match client.get(endpoint).send().and_then(|r| r.text()) {
            Ok(body) => {
                if let Some(addr) = parse_echo_response(&body) {
                    debug!("address probe {} answered {}", endpoint, addr);
                    return Some(addr);
                }
                debug!("address probe {} returned unparseable body", endpoint);
            }
            Err(err) => {
                debug!("address probe {} failed: {}", endpoint, err);
            }
        }
    }
    None
}

/// Echo services answer with the address as text, sometimes with trailing
/// whitespace or a newline.
pub fn parse_echo_response(body: &str) -> Option<IpAddr> {
    body.trim().parse().ok()
}

/// First address reported by the local interfaces (`hostname -I`).
pub fn local_interface_address() -> Option<IpAddr> {
    let output = Command::new("hostname").arg("-I").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    first_address_token(&stdout)
}

fn first_address_token(text: &str) -> Option<IpAddr> {
    text.split_whitespace().find_map(|tok| tok.parse().ok())
}

// ============================================================================
// Test Detector
// ============================================================================

/// Detector that answers with a fixed probe result. Used by unit and
/// integration tests to keep the pipeline off the network.
#[derive(Debug, Clone)]
pub struct FixedDetector {
    address: String,
    source: HostAddressSource,
}

impl FixedDetector {
    /// A detector that behaves like a successful probe.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            source: HostAddressSource::Probe,
        }
    }

    /// A detector that behaves like total detection failure.
    pub fn placeholder() -> Self {
        Self {
            address: PLACEHOLDER_HOST.to_string(),
            source: HostAddressSource::Placeholder,
        }
    }
}

impl AddressDetector for FixedDetector {
    fn detect(&self) -> (String, HostAddressSource) {
        (self.address.clone(), self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_echo_response() {
        assert_eq!(
            parse_echo_response("203.0.113.9\n"),
            Some("203.0.113.9".parse().unwrap())
        );
        assert_eq!(
            parse_echo_response("  2001:db8::7 "),
            Some("2001:db8::7".parse().unwrap())
        );
        assert_eq!(parse_echo_response("<html>error</html>"), None);
        assert_eq!(parse_echo_response(""), None);
    }

    #[test]
    fn test_first_address_token() {
        assert_eq!(
            first_address_token("192.168.1.7 172.17.0.1 \n"),
            Some("192.168.1.7".parse().unwrap())
        );
        assert_eq!(first_address_token("eno1 up"), None);
        assert_eq!(first_address_token(""), None);
    }

    #[test]
    fn test_fixed_detector() {
        let (addr, source) = FixedDetector::new("198.51.100.4").detect();
        assert_eq!(addr, "198.51.100.4");
        assert_eq!(source, HostAddressSource::Probe);

        let (addr, source) = FixedDetector::placeholder().detect();
        assert_eq!(addr, PLACEHOLDER_HOST);
        assert!(source.is_degraded());
    }

    #[test]
    fn test_probe_chain_is_bounded() {
        let worst_case = PROBE_TIMEOUT * PROBE_ENDPOINTS.len() as u32;
        assert!(worst_case <= Duration::from_secs(10));
    }
}
