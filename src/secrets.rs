//! Credential generation
//!
//! One secret per role, drawn from an OS-seeded CSPRNG and restricted to the
//! alphanumeric alphabet. The fixed alphabet means no downstream artifact
//! format ever needs escaping; that constraint is enforced here, at
//! generation time, not worked around in the renderers.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::{ProvisionError, Result};
use crate::types::Role;

/// Secret length in characters. Alphabet is `[A-Za-z0-9]`.
pub const SECRET_LENGTH: usize = 12;

/// One generated secret per role. Complete by construction: every `Role`
/// variant has exactly one entry, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    entries: Vec<(Role, String)>,
}

impl CredentialSet {
    /// Generate a fresh secret for every role.
    ///
    /// # Errors
    ///
    /// Fails only when the OS entropy source is unavailable.
    pub fn generate() -> Result<Self> {
        Self::generate_preserving(&HashMap::new())
    }

    /// Generate secrets, keeping prior values for roles present in
    /// `preserved` and drawing fresh ones for the rest.
    pub fn generate_preserving(preserved: &HashMap<Role, String>) -> Result<Self> {
        let mut rng = StdRng::try_from_os_rng()
            .map_err(|err| ProvisionError::random_source(err.to_string()))?;

        let entries = Role::iter()
            .map(|role| {
                let secret = match preserved.get(&role) {
                    Some(prior) => {
                        debug!("keeping prior secret for role '{}'", role);
                        prior.clone()
                    }
                    None => generate_secret(&mut rng),
                };
                (role, secret)
            })
            .collect();

        Ok(Self { entries })
    }

    /// The secret for a role. Total because construction covers every role.
    pub fn secret(&self, role: Role) -> &str {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, s)| s.as_str())
            .expect("CredentialSet holds every role")
    }

    /// Roles and secrets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.entries.iter().map(|(r, s)| (*r, s.as_str()))
    }
}

fn generate_secret(rng: &mut StdRng) -> String {
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(SECRET_LENGTH)
        .collect()
}

/// Best-effort read of a prior environment file, for secret preservation.
/// Unreadable files and unknown lines are skipped silently; only values for
/// known role variables are picked up.
pub fn read_prior_secrets(env_path: &Path) -> HashMap<Role, String> {
    let mut prior = HashMap::new();
    let Ok(contents) = fs::read_to_string(env_path) else {
        return prior;
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        for role in Role::iter() {
            if key == role.env_var() && !value.is_empty() {
                prior.insert(role, value.to_string());
            }
        }
    }
    prior
}

/// Display form that keeps the bulk of a secret off the terminal.
/// On-disk artifacts always carry the full value; this is for summaries.
pub fn redact(secret: &str) -> String {
    let shown: String = secret.chars().take(2).collect();
    format!("{}**********", shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_secrets_are_alphanumeric_and_fixed_length() {
        // Exercise the generator heavily; the alphabet constraint is what
        // lets every renderer skip escaping.
        let mut rng = StdRng::try_from_os_rng().unwrap();
        for _ in 0..10_000 {
            let secret = generate_secret(&mut rng);
            assert_eq!(secret.len(), SECRET_LENGTH);
            assert!(!secret.is_empty());
            assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_every_role_has_a_secret() {
        let creds = CredentialSet::generate().unwrap();
        for role in Role::iter() {
            assert_eq!(creds.secret(role).len(), SECRET_LENGTH);
        }
        assert_eq!(creds.iter().count(), Role::iter().count());
    }

    #[test]
    fn test_two_runs_differ() {
        let a = CredentialSet::generate().unwrap();
        let b = CredentialSet::generate().unwrap();
        for role in Role::iter() {
            assert_ne!(
                a.secret(role),
                b.secret(role),
                "role '{}' repeated a secret across runs",
                role
            );
        }
    }

    #[test]
    fn test_preserving_keeps_known_roles_only() {
        let mut prior = HashMap::new();
        prior.insert(Role::Application, "KeptSecret99".to_string());

        let creds = CredentialSet::generate_preserving(&prior).unwrap();
        assert_eq!(creds.secret(Role::Application), "KeptSecret99");
        assert_ne!(creds.secret(Role::Administrator), "KeptSecret99");
        assert_eq!(creds.secret(Role::ReadOnly).len(), SECRET_LENGTH);
    }

    #[test]
    fn test_read_prior_secrets() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# generated file").unwrap();
        writeln!(file, "POSTGRES_PASSWORD=AdminAbc1234").unwrap();
        writeln!(file, "APP_DB_PASSWORD=AppAbc123456").unwrap();
        writeln!(file, "SERVER_HOST=203.0.113.9").unwrap();
        writeln!(file, "garbage line").unwrap();
        file.flush().unwrap();

        let prior = read_prior_secrets(file.path());
        assert_eq!(prior.len(), 2);
        assert_eq!(prior[&Role::Administrator], "AdminAbc1234");
        assert_eq!(prior[&Role::Application], "AppAbc123456");
    }

    #[test]
    fn test_read_prior_secrets_missing_file() {
        let prior = read_prior_secrets(Path::new("/nonexistent/.env"));
        assert!(prior.is_empty());
    }

    #[test]
    fn test_redact_hides_tail() {
        let redacted = redact("AbCdEfGh1234");
        assert!(redacted.starts_with("Ab"));
        assert!(!redacted.contains("CdEfGh1234"));
    }

    proptest! {
        #[test]
        fn prop_generated_secrets_never_need_escaping(_seed in 0u8..16) {
            let creds = CredentialSet::generate().unwrap();
            for (_, secret) in creds.iter() {
                // No quoting characters can appear in any target syntax.
                prop_assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
                prop_assert_eq!(secret.len(), SECRET_LENGTH);
            }
        }
    }
}
