//! Pipeline orchestration
//!
//! Runs the stages in order: resolve parameters, generate credentials,
//! compile access rules, render artifacts, and only then, behind an
//! explicit confirmation, write the bundle. Every hand-off is an immutable
//! value; cancelling at the gate leaves no filesystem trace.

use tracing::info;

use crate::error::{ProvisionError, Result};
use crate::params::{self, DeploymentParameters, RawParameters};
use crate::probe::AddressDetector;
use crate::render::{self, Artifact};
use crate::rules::{self, AccessPolicy};
use crate::secrets::{self, CredentialSet};
use crate::source::ParameterSource;
use crate::types::{ArtifactKind, DEFAULT_INSTALL_DIR, Role};
use crate::writer::{self, WriteReport};
use strum::IntoEnumIterator;

/// Everything computed for one run, before anything touches the disk.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub params: DeploymentParameters,
    pub credentials: CredentialSet,
    pub policy: AccessPolicy,
    pub artifacts: Vec<Artifact>,
}

impl Bundle {
    /// Run the synthesis stages on resolved inputs.
    pub fn synthesize(params: DeploymentParameters, credentials: CredentialSet) -> Self {
        let policy = rules::compile_access_rules(&params);
        let artifacts = render::render_bundle(&params, &credentials, &policy);
        Self {
            params,
            credentials,
            policy,
            artifacts,
        }
    }

    /// Human-readable summary for the confirmation gate and the plan
    /// command. Secrets appear redacted; the on-disk report carries the
    /// full values.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Install directory : {}", self.params.install_dir.display()),
            format!("Server address    : {}", self.params.host_address),
            String::new(),
        ];

        lines.push("Credentials (redacted):".to_string());
        for role in Role::iter() {
            lines.push(format!(
                "  {:<12} {}",
                role.to_string(),
                secrets::redact(self.credentials.secret(role))
            ));
        }
        lines.push(String::new());

        lines.push(self.policy.summary());
        lines.push(String::new());

        lines.push("Artifacts:".to_string());
        for artifact in &self.artifacts {
            lines.push(format!(
                "  {:<22} mode {:o}",
                artifact.relative_path.display(),
                artifact.mode
            ));
        }

        if self.params.host_source.is_degraded() {
            lines.push(String::new());
            lines.push(format!(
                "!! server address '{}' is a fallback value; pass an explicit address to override",
                self.params.host_address
            ));
        }

        lines.join("\n")
    }

    /// Absolute path of the credentials report once written.
    pub fn report_path(&self) -> std::path::PathBuf {
        self.params
            .install_dir
            .join(ArtifactKind::CredentialsReport.relative_path())
    }
}

/// Compute a bundle without writing anything. Used by the plan command.
pub fn plan(raw: &RawParameters, detector: &dyn AddressDetector) -> Result<Bundle> {
    let params = params::resolve_parameters(raw, detector)?;
    let credentials = CredentialSet::generate()?;
    Ok(Bundle::synthesize(params, credentials))
}

/// Full provisioning run: gather, synthesize, confirm, write.
///
/// # Errors
///
/// - `Validation` before anything is computed
/// - `RandomSource` if no credentials can be produced
/// - `Cancelled` when either confirmation is declined (nothing written)
/// - `FileSystem` when the writer fails partway
pub fn provision(
    raw: RawParameters,
    keep_secrets: bool,
    source: &mut dyn ParameterSource,
    detector: &dyn AddressDetector,
) -> Result<WriteReport> {
    let install_dir = params::validate_install_dir(
        raw.install_dir
            .as_deref()
            .unwrap_or(std::path::Path::new(DEFAULT_INSTALL_DIR)),
    )?;

    if !source.confirm_install_dir(&install_dir)? {
        return Err(ProvisionError::Cancelled);
    }

    let permitted = if raw.permitted.is_empty() {
        source.read_permitted_addresses()?
    } else {
        raw.permitted.clone()
    };

    let resolved_raw = RawParameters {
        install_dir: Some(install_dir),
        host_address: raw.host_address.clone(),
        permitted,
    };
    let params = params::resolve_parameters(&resolved_raw, detector)?;
    info!(
        "resolved parameters: dir={}, host={}, permitted={}",
        params.install_dir.display(),
        params.host_address,
        params.permitted.len()
    );

    let credentials = if keep_secrets {
        let prior = secrets::read_prior_secrets(&params.install_dir.join(".env"));
        info!("preserving {} prior secrets", prior.len());
        CredentialSet::generate_preserving(&prior)?
    } else {
        CredentialSet::generate()?
    };

    let bundle = Bundle::synthesize(params, credentials);

    if !source.confirm_write(&bundle.summary())? {
        return Err(ProvisionError::Cancelled);
    }

    writer::write_bundle(&bundle.params.install_dir, &bundle.artifacts)
}
