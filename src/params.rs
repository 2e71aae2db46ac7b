//! Parameter resolution
//!
//! Gathers and validates the raw inputs of a run (installation directory,
//! host address, permitted client addresses) into an immutable
//! `DeploymentParameters` value that every later stage reads and none
//! mutates. Pure except for the host-address detection seam, which is
//! injected so the resolver is testable without a network.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};
use crate::probe::AddressDetector;
use crate::types::{ADMIN_UI_PORT, DB_PORT, DEFAULT_INSTALL_DIR};

// ============================================================================
// Address Specifications
// ============================================================================

/// A validated permitted-client entry: a single address or a CIDR range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpec {
    pub addr: IpAddr,
    /// Prefix length when the entry was written in CIDR notation
    pub prefix: Option<u8>,
}

impl AddressSpec {
    pub fn is_ipv4(&self) -> bool {
        self.addr.is_ipv4()
    }

    /// Address pattern for the access-control file. Bare addresses get the
    /// full-length prefix of their family appended.
    pub fn hba_pattern(&self) -> String {
        let full = if self.addr.is_ipv4() { 32 } else { 128 };
        format!("{}/{}", self.addr, self.prefix.unwrap_or(full))
    }
}

impl FromStr for AddressSpec {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr_part, prefix_part) = match s.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (s, None),
        };

        let addr: IpAddr = addr_part.parse().map_err(|_| {
            ProvisionError::validation(format!(
                "invalid address '{}': not an IPv4 or IPv6 address",
                s
            ))
        })?;

        let prefix = match prefix_part {
            None => None,
            Some(p) => {
                let bits: u8 = p.parse().map_err(|_| {
                    ProvisionError::validation(format!(
                        "invalid CIDR '{}': prefix '{}' is not a number",
                        s, p
                    ))
                })?;
                let max = if addr.is_ipv4() { 32 } else { 128 };
                if bits > max {
                    return Err(ProvisionError::validation(format!(
                        "invalid CIDR '{}': prefix {} exceeds {} for this address family",
                        s, bits, max
                    )));
                }
                Some(bits)
            }
        };

        Ok(AddressSpec { addr, prefix })
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix {
            Some(bits) => write!(f, "{}/{}", self.addr, bits),
            None => write!(f, "{}", self.addr),
        }
    }
}

// ============================================================================
// Host Address Provenance
// ============================================================================

/// How the host address was obtained. Anything other than `Explicit` or
/// `Probe` is a degraded result the credentials report must flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostAddressSource {
    /// Supplied on the command line or in a saved parameters file
    Explicit,
    /// Reported by a public address-echo service
    Probe,
    /// First address of a local interface; may not be reachable externally
    LocalInterface,
    /// Detection failed entirely; a placeholder literal was substituted
    Placeholder,
}

impl HostAddressSource {
    /// True when the resolved address is a guess the operator must review.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::LocalInterface | Self::Placeholder)
    }
}

// ============================================================================
// Deployment Parameters
// ============================================================================

/// Everything a run needs to know, resolved once and then read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentParameters {
    pub install_dir: PathBuf,
    pub host_address: String,
    pub host_source: HostAddressSource,
    /// Validated, de-duplicated, first-seen order preserved
    pub permitted: Vec<AddressSpec>,
    pub db_port: u16,
    pub admin_ui_port: u16,
}

impl DeploymentParameters {
    /// True when no permitted-address list was supplied: the access-control
    /// compiler emits no terminal reject and the report must warn.
    pub fn open_access(&self) -> bool {
        self.permitted.is_empty()
    }
}

/// Raw, not-yet-validated inputs as they arrive from the CLI, environment,
/// prompts, or a saved parameters file.
#[derive(Debug, Clone, Default)]
pub struct RawParameters {
    pub install_dir: Option<PathBuf>,
    pub host_address: Option<String>,
    pub permitted: Vec<String>,
}

/// Resolve raw inputs into deployment parameters.
///
/// # Errors
///
/// Returns a validation error if:
/// - The installation directory is empty or not absolute
/// - An explicit host address does not parse as an IP address
/// - A permitted-address entry is not valid IPv4/IPv6/CIDR syntax
pub fn resolve_parameters(
    raw: &RawParameters,
    detector: &dyn AddressDetector,
) -> Result<DeploymentParameters> {
    let install_dir = validate_install_dir(
        raw.install_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_INSTALL_DIR)),
    )?;

    let (host_address, host_source) = match &raw.host_address {
        Some(explicit) => {
            let trimmed = explicit.trim();
            let addr: IpAddr = trimmed.parse().map_err(|_| {
                ProvisionError::validation(format!(
                    "invalid host address '{}': not an IPv4 or IPv6 address",
                    trimmed
                ))
            })?;
            (addr.to_string(), HostAddressSource::Explicit)
        }
        None => detector.detect(),
    };

    let permitted = parse_permitted_list(&raw.permitted)?;

    Ok(DeploymentParameters {
        install_dir,
        host_address,
        host_source,
        permitted,
        db_port: DB_PORT,
        admin_ui_port: ADMIN_UI_PORT,
    })
}

/// Validate and normalize the installation directory.
pub fn validate_install_dir(path: &Path) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ProvisionError::validation(
            "installation directory must not be empty",
        ));
    }
    if !path.is_absolute() {
        return Err(ProvisionError::validation(format!(
            "installation directory '{}' must be an absolute path",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Trim, validate, and de-duplicate permitted-address entries while
/// preserving first-seen order. Blank entries are skipped.
pub fn parse_permitted_list(entries: &[String]) -> Result<Vec<AddressSpec>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut specs = Vec::new();

    for entry in entries {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        let spec: AddressSpec = trimmed.parse()?;
        if seen.insert(spec.hba_pattern()) {
            specs.push(spec);
        }
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedDetector;
    use proptest::prelude::*;

    fn raw(dir: &str, host: Option<&str>, permitted: &[&str]) -> RawParameters {
        RawParameters {
            install_dir: Some(PathBuf::from(dir)),
            host_address: host.map(String::from),
            permitted: permitted.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_address_spec_parses_bare_ipv4() {
        let spec: AddressSpec = "10.0.0.5".parse().unwrap();
        assert!(spec.is_ipv4());
        assert_eq!(spec.prefix, None);
        assert_eq!(spec.hba_pattern(), "10.0.0.5/32");
    }

    #[test]
    fn test_address_spec_parses_cidr() {
        let spec: AddressSpec = "192.168.1.0/24".parse().unwrap();
        assert_eq!(spec.prefix, Some(24));
        assert_eq!(spec.hba_pattern(), "192.168.1.0/24");
    }

    #[test]
    fn test_address_spec_parses_ipv6() {
        let spec: AddressSpec = "2001:db8::1".parse().unwrap();
        assert!(!spec.is_ipv4());
        assert_eq!(spec.hba_pattern(), "2001:db8::1/128");

        let spec: AddressSpec = "2001:db8::/32".parse().unwrap();
        assert_eq!(spec.hba_pattern(), "2001:db8::/32");
    }

    #[test]
    fn test_address_spec_rejects_garbage() {
        assert!("10.0.0".parse::<AddressSpec>().is_err());
        assert!("not-an-ip".parse::<AddressSpec>().is_err());
        assert!("10.0.0.5/33".parse::<AddressSpec>().is_err());
        assert!("2001:db8::/129".parse::<AddressSpec>().is_err());
        assert!("10.0.0.5/abc".parse::<AddressSpec>().is_err());
    }

    #[test]
    fn test_permitted_list_dedupes_preserving_order() {
        let entries: Vec<String> = ["10.0.0.5", " 192.168.1.100 ", "10.0.0.5", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let specs = parse_permitted_list(&entries).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].hba_pattern(), "10.0.0.5/32");
        assert_eq!(specs[1].hba_pattern(), "192.168.1.100/32");
    }

    #[test]
    fn test_install_dir_must_be_absolute() {
        assert!(validate_install_dir(Path::new("relative/dir")).is_err());
        assert!(validate_install_dir(Path::new("")).is_err());
        assert!(validate_install_dir(Path::new("/opt/pgstack")).is_ok());
    }

    #[test]
    fn test_resolve_uses_default_dir() {
        let raw = RawParameters::default();
        let detector = FixedDetector::new("203.0.113.9");
        let params = resolve_parameters(&raw, &detector).unwrap();
        assert_eq!(params.install_dir, PathBuf::from(DEFAULT_INSTALL_DIR));
        assert_eq!(params.host_address, "203.0.113.9");
        assert_eq!(params.host_source, HostAddressSource::Probe);
        assert!(params.open_access());
    }

    #[test]
    fn test_resolve_explicit_host_skips_detection() {
        let raw = raw("/srv/db", Some("198.51.100.4"), &["10.0.0.5"]);
        let detector = FixedDetector::new("203.0.113.9");
        let params = resolve_parameters(&raw, &detector).unwrap();
        assert_eq!(params.host_address, "198.51.100.4");
        assert_eq!(params.host_source, HostAddressSource::Explicit);
        assert!(!params.open_access());
    }

    #[test]
    fn test_resolve_rejects_malformed_explicit_host() {
        let raw = raw("/srv/db", Some("example.com"), &[]);
        let detector = FixedDetector::new("203.0.113.9");
        assert!(resolve_parameters(&raw, &detector).is_err());
    }

    #[test]
    fn test_degraded_sources() {
        assert!(!HostAddressSource::Explicit.is_degraded());
        assert!(!HostAddressSource::Probe.is_degraded());
        assert!(HostAddressSource::LocalInterface.is_degraded());
        assert!(HostAddressSource::Placeholder.is_degraded());
    }

    proptest! {
        #[test]
        fn prop_any_ipv4_roundtrips(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
            let text = format!("{}.{}.{}.{}", a, b, c, d);
            let spec: AddressSpec = text.parse().unwrap();
            prop_assert_eq!(spec.to_string(), text);
        }

        #[test]
        fn prop_valid_ipv4_cidr_roundtrips(a in 0u8..=255, b in 0u8..=255, bits in 0u8..=32) {
            let text = format!("{}.{}.0.0/{}", a, b, bits);
            let spec: AddressSpec = text.parse().unwrap();
            prop_assert_eq!(spec.hba_pattern(), text);
        }
    }
}
