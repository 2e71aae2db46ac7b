//! Type-safe core types for pgprovision
//!
//! This module replaces stringly-typed configuration with proper Rust enums
//! that provide compile-time validation and exhaustive matching, plus the
//! named constants every stage of the pipeline agrees on.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ============================================================================
// Deployment Constants
// ============================================================================

/// Port the database engine listens on (host side and container side).
pub const DB_PORT: u16 = 5432;

/// Host port the admin UI is published on.
pub const ADMIN_UI_PORT: u16 = 8080;

/// Name of the application database created by the engine image.
pub const DB_NAME: &str = "appdb";

/// Default installation directory when no override is given.
pub const DEFAULT_INSTALL_DIR: &str = "/opt/pgstack";

/// Literal used when the host address cannot be detected at all.
/// Its presence must be surfaced in the credentials report.
pub const PLACEHOLDER_HOST: &str = "YOUR_SERVER_IP";

/// Internal subnet of the compose bridge network. The access-control
/// compiler and the manifest renderer both read this constant so the
/// trusted-source rule and the network definition can never disagree.
pub const INTERNAL_SUBNET: &str = "172.28.0.0/16";

/// Login identity for the admin UI (pgAdmin requires an email-shaped login).
pub const ADMIN_UI_EMAIL: &str = "admin@pgstack.local";

/// Numeric identity the official postgres image runs as.
pub const POSTGRES_UID: u32 = 999;
pub const POSTGRES_GID: u32 = 999;

/// Numeric identity the pgadmin image runs as.
pub const PGADMIN_UID: u32 = 5050;
pub const PGADMIN_GID: u32 = 5050;

// ============================================================================
// Roles
// ============================================================================

/// Logical database identities, one generated credential each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
    /// Engine superuser; owns the database cluster
    #[strum(serialize = "administrator")]
    Administrator,
    /// Read/write identity applications connect as
    #[strum(serialize = "application")]
    Application,
    /// Read-only identity for reporting and ad hoc queries
    #[strum(serialize = "read-only")]
    ReadOnly,
    /// Backup and monitoring identity
    #[strum(serialize = "backup")]
    Backup,
    /// Admin-UI login (not a database role)
    #[strum(serialize = "admin-ui")]
    AdminUi,
}

impl Role {
    /// Database role name, or None for identities that never reach the engine.
    pub fn db_role(&self) -> Option<&'static str> {
        match self {
            Role::Administrator => Some("postgres"),
            Role::Application => Some("app_user"),
            Role::ReadOnly => Some("readonly_user"),
            Role::Backup => Some("backup_user"),
            Role::AdminUi => None,
        }
    }

    /// Environment variable carrying this role's secret.
    pub fn env_var(&self) -> &'static str {
        match self {
            Role::Administrator => "POSTGRES_PASSWORD",
            Role::Application => "APP_DB_PASSWORD",
            Role::ReadOnly => "READONLY_DB_PASSWORD",
            Role::Backup => "BACKUP_DB_PASSWORD",
            Role::AdminUi => "PGADMIN_DEFAULT_PASSWORD",
        }
    }

    /// One-line description for the credentials report.
    pub fn description(&self) -> &'static str {
        match self {
            Role::Administrator => "database superuser",
            Role::Application => "application read/write access",
            Role::ReadOnly => "read-only queries and reporting",
            Role::Backup => "backups and monitoring",
            Role::AdminUi => "admin UI web login",
        }
    }
}

// ============================================================================
// Access Rule Vocabulary
// ============================================================================

/// Connection type of an access rule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionType {
    /// Unix-domain socket connections
    #[strum(serialize = "local")]
    Local,
    /// TCP/IP connections (both address families)
    #[strum(serialize = "host")]
    Host,
}

/// Authentication method of an access rule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum AuthMethod {
    /// Challenge-response authentication; the strongest method the engine
    /// supports and the only one used for accepted connections
    #[strum(serialize = "scram-sha-256")]
    ScramSha256,
    /// Unconditionally refuse the connection
    #[strum(serialize = "reject")]
    Reject,
}

/// Where a rule sits in the trust model. Ordering is significant:
/// internal rules always precede network rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RuleScope {
    /// Loopback, unix socket, or the compose-internal subnet
    #[strum(serialize = "internal")]
    Internal,
    /// Operator-supplied permitted addresses and the terminal reject pair
    #[strum(serialize = "network")]
    Network,
}

// ============================================================================
// Artifacts
// ============================================================================

/// The five artifact kinds the renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ArtifactKind {
    #[strum(serialize = "env-file")]
    EnvFile,
    #[strum(serialize = "compose-manifest")]
    ComposeManifest,
    #[strum(serialize = "access-control")]
    AccessControl,
    #[strum(serialize = "init-script")]
    InitScript,
    #[strum(serialize = "credentials-report")]
    CredentialsReport,
}

impl ArtifactKind {
    /// Target path relative to the installation directory.
    pub fn relative_path(&self) -> &'static str {
        match self {
            ArtifactKind::EnvFile => ".env",
            ArtifactKind::ComposeManifest => "docker-compose.yml",
            ArtifactKind::AccessControl => "config/pg_hba.conf",
            ArtifactKind::InitScript => "init/01-roles.sql",
            ArtifactKind::CredentialsReport => "credentials.txt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_role_display_roundtrip() {
        for role in Role::iter() {
            let serialized = role.to_string();
            let parsed = Role::from_str(&serialized);
            assert!(parsed.is_ok(), "Role {:?} should roundtrip", role);
            assert_eq!(parsed.unwrap(), role);
        }
    }

    #[test]
    fn test_role_db_mapping() {
        assert_eq!(Role::Administrator.db_role(), Some("postgres"));
        assert_eq!(Role::Application.db_role(), Some("app_user"));
        assert_eq!(Role::AdminUi.db_role(), None);
    }

    #[test]
    fn test_role_env_vars_are_distinct() {
        let vars: Vec<&str> = Role::iter().map(|r| r.env_var()).collect();
        let mut deduped = vars.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(vars.len(), deduped.len(), "env var names must be unique");
    }

    #[test]
    fn test_auth_method_serialization() {
        assert_eq!(AuthMethod::ScramSha256.to_string(), "scram-sha-256");
        assert_eq!(AuthMethod::Reject.to_string(), "reject");
    }

    #[test]
    fn test_artifact_paths_are_relative() {
        for kind in ArtifactKind::iter() {
            assert!(
                !kind.relative_path().starts_with('/'),
                "{} must be relative",
                kind
            );
        }
    }

    #[test]
    fn test_exactly_five_artifact_kinds() {
        assert_eq!(ArtifactKind::iter().count(), 5);
    }
}
