//! Access Control Compiler
//!
//! Translates the permitted-client list into an ordered sequence of
//! authentication rules for the database engine's access-control file.
//!
//! # Rule Order
//!
//! | Position | Rules |
//! |----------|-------|
//! | 1        | Trusted internal sources (unix socket, loopback v4/v6, compose subnet) |
//! | 2        | One rule per permitted address, in input order |
//! | 3        | Terminal reject pair (all IPv4, all IPv6), only when the permitted list is non-empty |
//!
//! The engine evaluates rules top to bottom, first match wins, so this
//! ordering is an invariant and not a presentation choice. An empty
//! permitted list produces no reject pair: that is the open-access
//! configuration, which the credentials report must flag.
//!
//! # Design
//!
//! - **Pure logic**: No I/O, no side effects, only generates the rule list
//! - **Validated input**: Malformed or duplicate addresses cannot reach this
//!   stage; the parameter resolver rejects them earlier
//! - **Testable**: Ordering properties are unit-tested directly

use std::fmt;

use crate::params::DeploymentParameters;
use crate::types::{AuthMethod, ConnectionType, INTERNAL_SUBNET, RuleScope};

/// Universal-match patterns for the terminal reject pair.
const ALL_IPV4: &str = "0.0.0.0/0";
const ALL_IPV6: &str = "::/0";

/// One ordered entry of the access-control file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub connection: ConnectionType,
    pub database: String,
    pub role: String,
    /// None for unix-socket rules, which carry no address column
    pub address: Option<String>,
    pub method: AuthMethod,
    pub scope: RuleScope,
}

impl AccessRule {
    fn local(method: AuthMethod) -> Self {
        Self {
            connection: ConnectionType::Local,
            database: "all".to_string(),
            role: "all".to_string(),
            address: None,
            method,
            scope: RuleScope::Internal,
        }
    }

    fn host(address: &str, method: AuthMethod, scope: RuleScope) -> Self {
        Self {
            connection: ConnectionType::Host,
            database: "all".to_string(),
            role: "all".to_string(),
            address: Some(address.to_string()),
            method,
            scope,
        }
    }

    /// True for the universal reject entries that terminate a closed policy.
    pub fn is_terminal_reject(&self) -> bool {
        self.method == AuthMethod::Reject
            && matches!(self.address.as_deref(), Some(ALL_IPV4) | Some(ALL_IPV6))
    }
}

impl fmt::Display for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.connection,
            self.database,
            self.role,
            self.address.as_deref().unwrap_or("-"),
            self.method
        )
    }
}

/// The compiled policy: an ordered rule list plus the open-access flag the
/// report renderer surfaces.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub rules: Vec<AccessRule>,
    pub open_access: bool,
}

impl AccessPolicy {
    /// Returns a summary of the policy for the confirmation gate.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Access policy ({} rules):", self.rules.len())];
        for (i, rule) in self.rules.iter().enumerate() {
            lines.push(format!("  {}. [{}] {}", i + 1, rule.scope, rule));
        }
        if self.open_access {
            lines.push("  !! no permitted-address list: open access".to_string());
        }
        lines.join("\n")
    }
}

/// Compile the ordered access rules for a deployment.
///
/// Trusted internal sources always come first, then the operator's
/// permitted addresses in input order, then (for a non-empty list) the
/// terminal reject pair covering both address families.
pub fn compile_access_rules(params: &DeploymentParameters) -> AccessPolicy {
    let mut rules = Vec::new();

    // Trusted internal sources, strongest supported method.
    rules.push(AccessRule::local(AuthMethod::ScramSha256));
    rules.push(AccessRule::host(
        "127.0.0.1/32",
        AuthMethod::ScramSha256,
        RuleScope::Internal,
    ));
    rules.push(AccessRule::host(
        "::1/128",
        AuthMethod::ScramSha256,
        RuleScope::Internal,
    ));
    rules.push(AccessRule::host(
        INTERNAL_SUBNET,
        AuthMethod::ScramSha256,
        RuleScope::Internal,
    ));

    // Operator whitelist, input order preserved.
    for spec in &params.permitted {
        rules.push(AccessRule::host(
            &spec.hba_pattern(),
            AuthMethod::ScramSha256,
            RuleScope::Network,
        ));
    }

    // Terminal reject pair. Omitted for an empty whitelist: that is the
    // open-access configuration and it is flagged, never silent.
    let open_access = params.permitted.is_empty();
    if !open_access {
        rules.push(AccessRule::host(
            ALL_IPV4,
            AuthMethod::Reject,
            RuleScope::Network,
        ));
        rules.push(AccessRule::host(
            ALL_IPV6,
            AuthMethod::Reject,
            RuleScope::Network,
        ));
    }

    AccessPolicy { rules, open_access }
}
