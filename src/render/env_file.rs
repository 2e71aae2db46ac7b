//! Environment file encoder
//!
//! Newline-separated `KEY=VALUE` pairs: one user/password pair per role,
//! the resolved host address, the port assignments, and a composed
//! connection URL per database role. Other artifacts reference these keys
//! instead of repeating values.

use strum::IntoEnumIterator;

use crate::params::DeploymentParameters;
use crate::render::connection_url;
use crate::secrets::CredentialSet;
use crate::types::{ADMIN_UI_EMAIL, DB_NAME, Role};

/// Environment variable holding a role's login name, where one exists.
fn user_env_var(role: Role) -> Option<&'static str> {
    match role {
        Role::Administrator => Some("POSTGRES_USER"),
        Role::Application => Some("APP_DB_USER"),
        Role::ReadOnly => Some("READONLY_DB_USER"),
        Role::Backup => Some("BACKUP_DB_USER"),
        Role::AdminUi => None,
    }
}

/// Environment variable holding a role's composed connection URL.
fn url_env_var(role: Role) -> Option<&'static str> {
    match role {
        Role::Administrator => Some("ADMIN_DATABASE_URL"),
        Role::Application => Some("APP_DATABASE_URL"),
        Role::ReadOnly => Some("READONLY_DATABASE_URL"),
        Role::Backup => Some("BACKUP_DATABASE_URL"),
        Role::AdminUi => None,
    }
}

pub fn render(params: &DeploymentParameters, credentials: &CredentialSet) -> String {
    let mut lines = vec![
        "# Environment for the pgstack deployment. Generated by pgprovision.".to_string(),
        "# This file contains credentials; keep it out of version control.".to_string(),
        String::new(),
    ];

    for role in Role::iter() {
        if let Some(user_var) = user_env_var(role) {
            // db_role is always present when a user variable exists
            let login = role.db_role().unwrap_or_default();
            lines.push(format!("{}={}", user_var, login));
        }
        if role == Role::AdminUi {
            lines.push(format!("PGADMIN_DEFAULT_EMAIL={}", ADMIN_UI_EMAIL));
        }
        lines.push(format!("{}={}", role.env_var(), credentials.secret(role)));
    }

    lines.push(String::new());
    lines.push(format!("POSTGRES_DB={}", DB_NAME));
    lines.push(format!("SERVER_HOST={}", params.host_address));
    lines.push(format!("DB_PORT={}", params.db_port));
    lines.push(format!("ADMIN_UI_PORT={}", params.admin_ui_port));

    lines.push(String::new());
    for role in Role::iter() {
        if let (Some(url_var), Some(url)) = (
            url_env_var(role),
            connection_url(role, credentials, params),
        ) {
            lines.push(format!("{}={}", url_var, url));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}
