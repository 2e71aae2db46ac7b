//! Artifact Renderer
//!
//! Pure mapping from (parameters, credentials, access policy) to the five
//! output artifacts. Each artifact kind has a dedicated encoder in its own
//! submodule; this module assembles the rendered text with the permission
//! bits and owning identity the bundle writer applies.
//!
//! Every encoder reads the same `CredentialSet`, so a role's secret is
//! byte-identical in every artifact that references it. Secrets are
//! alphanumeric by construction, which is why none of the encoders carries
//! escaping logic.

pub mod compose;
pub mod env_file;
pub mod hba;
pub mod init_sql;
pub mod report;

use std::path::PathBuf;

use crate::params::DeploymentParameters;
use crate::rules::AccessPolicy;
use crate::secrets::CredentialSet;
use crate::types::{
    ArtifactKind, DB_NAME, PGADMIN_GID, PGADMIN_UID, POSTGRES_GID, POSTGRES_UID, Role,
};

/// Numeric owner applied to an artifact or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

/// Identity of the database engine container.
pub const POSTGRES_OWNER: Ownership = Ownership {
    uid: POSTGRES_UID,
    gid: POSTGRES_GID,
};

/// Identity of the admin-UI container.
pub const PGADMIN_OWNER: Ownership = Ownership {
    uid: PGADMIN_UID,
    gid: PGADMIN_GID,
};

/// One rendered output file, ready for the bundle writer.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub relative_path: PathBuf,
    pub contents: String,
    /// Unix permission bits
    pub mode: u32,
    /// None means the invoking identity keeps ownership
    pub owner: Option<Ownership>,
}

/// Render the full artifact bundle in write order.
pub fn render_bundle(
    params: &DeploymentParameters,
    credentials: &CredentialSet,
    policy: &AccessPolicy,
) -> Vec<Artifact> {
    vec![
        artifact(
            ArtifactKind::EnvFile,
            env_file::render(params, credentials),
            0o600,
            None,
        ),
        artifact(
            ArtifactKind::ComposeManifest,
            compose::render(params),
            0o644,
            None,
        ),
        artifact(
            ArtifactKind::AccessControl,
            hba::render(policy),
            0o600,
            Some(POSTGRES_OWNER),
        ),
        artifact(
            ArtifactKind::InitScript,
            init_sql::render(credentials),
            0o600,
            Some(POSTGRES_OWNER),
        ),
        artifact(
            ArtifactKind::CredentialsReport,
            report::render(params, credentials, policy),
            0o600,
            None,
        ),
    ]
}

fn artifact(kind: ArtifactKind, contents: String, mode: u32, owner: Option<Ownership>) -> Artifact {
    Artifact {
        kind,
        relative_path: PathBuf::from(kind.relative_path()),
        contents,
        mode,
        owner,
    }
}

/// Connection URL for a database role. None for identities without a
/// database login (the admin UI authenticates against its own store).
pub fn connection_url(
    role: Role,
    credentials: &CredentialSet,
    params: &DeploymentParameters,
) -> Option<String> {
    let db_role = role.db_role()?;
    Some(format!(
        "postgresql://{}:{}@{}:{}/{}",
        db_role,
        credentials.secret(role),
        params.host_address,
        params.db_port,
        DB_NAME
    ))
}
