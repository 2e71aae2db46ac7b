//! Bundle Writer
//!
//! Persists the rendered artifacts under the installation directory. Each
//! artifact is written to a temporary file in its final directory, gets its
//! permission bits and owning identity applied, and is then renamed into
//! place, so a partially-written secret-bearing file is never visible under
//! its final name. A failure aborts the remaining writes; the error names
//! the failed artifact and the report lists what completed.

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Uid, chown};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{ProvisionError, Result};
use crate::render::{Artifact, Ownership, PGADMIN_OWNER, POSTGRES_OWNER};

/// Directories created alongside the artifacts. The data directories carry
/// the numeric identities of the processes that will populate them.
const MANAGED_DIRS: [(&str, u32, Option<Ownership>); 4] = [
    ("config", 0o755, None),
    ("init", 0o755, None),
    ("data/postgres", 0o700, Some(POSTGRES_OWNER)),
    ("data/pgadmin", 0o700, Some(PGADMIN_OWNER)),
];

/// What a (possibly partial) bundle write accomplished.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Absolute paths of the artifacts renamed into place, in write order
    pub written: Vec<PathBuf>,
}

impl WriteReport {
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Wrote {} artifacts:", self.written.len())];
        for path in &self.written {
            lines.push(format!("  {}", path.display()));
        }
        lines.join("\n")
    }
}

/// Write every artifact, then the managed data directories.
///
/// # Errors
///
/// `ProvisionError::FileSystem` on the first failed write. Artifacts
/// renamed into place before the failure stay on disk and are listed in
/// the error's `completed` field.
pub fn write_bundle(install_dir: &Path, artifacts: &[Artifact]) -> Result<WriteReport> {
    let apply_owners = Uid::effective().is_root();
    if !apply_owners && artifacts.iter().any(|a| a.owner.is_some()) {
        warn!("not running as root; file ownership will be left as the invoking user");
    }

    let mut report = WriteReport::default();
    let mut completed: Vec<String> = Vec::new();

    fs::create_dir_all(install_dir)
        .map_err(|e| ProvisionError::filesystem(install_dir.display().to_string(), vec![], e))?;

    for artifact in artifacts {
        let target = install_dir.join(&artifact.relative_path);
        write_artifact(&target, artifact, apply_owners)
            .map_err(|e| ProvisionError::filesystem(artifact.kind.to_string(), completed.clone(), e))?;
        debug!("wrote {} ({:o})", target.display(), artifact.mode);
        completed.push(artifact.kind.to_string());
        report.written.push(target);
    }

    for (dir, mode, owner) in MANAGED_DIRS {
        let path = install_dir.join(dir);
        prepare_dir(&path, mode, owner, apply_owners)
            .map_err(|e| ProvisionError::filesystem(dir.to_string(), completed.clone(), e))?;
    }

    Ok(report)
}

/// Write one artifact atomically: temp file in the final directory, mode
/// and ownership applied while the file is still private, then rename.
fn write_artifact(target: &Path, artifact: &Artifact, apply_owners: bool) -> std::io::Result<()> {
    let parent = target.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    // NamedTempFile starts out 0600, so the contents are never readable by
    // other identities, even before the final bits are applied.
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(artifact.contents.as_bytes())?;
    tmp.flush()?;

    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(artifact.mode))?;
    if apply_owners {
        if let Some(owner) = artifact.owner {
            apply_ownership(tmp.path(), owner)?;
        }
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

fn prepare_dir(
    path: &Path,
    mode: u32,
    owner: Option<Ownership>,
    apply_owners: bool,
) -> std::io::Result<()> {
    fs::create_dir_all(path)?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    if apply_owners {
        if let Some(owner) = owner {
            apply_ownership(path, owner)?;
        }
    }
    Ok(())
}

fn apply_ownership(path: &Path, owner: Ownership) -> std::io::Result<()> {
    chown(
        path,
        Some(Uid::from_raw(owner.uid)),
        Some(Gid::from_raw(owner.gid)),
    )
    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
}
