//! pgprovision library
//!
//! Configuration synthesis for a self-hosted PostgreSQL + pgAdmin stack:
//! resolve parameters, generate credentials, compile access rules, render
//! the artifact bundle, and write it atomically.

pub mod cli;
pub mod config_file;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod probe;
pub mod render;
pub mod rules;
pub mod secrets;
pub mod source;
pub mod types;
pub mod writer;

// Re-export main types for convenience
pub use config_file::ProvisionConfig;
pub use error::{ProvisionError, Result};
pub use params::{
    AddressSpec, DeploymentParameters, HostAddressSource, RawParameters, resolve_parameters,
};
pub use pipeline::{Bundle, plan, provision};
pub use probe::{AddressDetector, EchoServiceDetector, FixedDetector};
pub use render::{Artifact, Ownership, render_bundle};
pub use rules::{AccessPolicy, AccessRule, compile_access_rules};
pub use secrets::{CredentialSet, SECRET_LENGTH};
pub use source::{InteractiveSource, NonInteractiveSource, ParameterSource};
pub use types::{ArtifactKind, AuthMethod, ConnectionType, Role, RuleScope};
pub use writer::{WriteReport, write_bundle};
