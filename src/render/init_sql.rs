//! Initialization script encoder
//!
//! Statements the engine runs once against a fresh data directory: enable
//! the required extensions, create one login role per generated credential,
//! grant role-appropriate privileges. The administrator is the engine
//! superuser itself and is configured through the environment file, not
//! created here.
//!
//! Secrets are alphanumeric by construction, so the quoted password
//! literals below need no escaping.

use strum::IntoEnumIterator;

use crate::secrets::CredentialSet;
use crate::types::{DB_NAME, Role};

/// Extensions enabled on the application database.
const EXTENSIONS: [&str; 2] = ["pgcrypto", "pg_stat_statements"];

pub fn render(credentials: &CredentialSet) -> String {
    let mut lines = vec![
        "-- Database initialization. Generated by pgprovision.".to_string(),
        "-- Runs once when the engine first starts on an empty data directory.".to_string(),
        String::new(),
    ];

    for extension in EXTENSIONS {
        lines.push(format!("CREATE EXTENSION IF NOT EXISTS {};", extension));
    }
    lines.push(String::new());

    for role in Role::iter() {
        if role == Role::Administrator {
            continue;
        }
        let Some(login) = role.db_role() else {
            continue;
        };

        lines.push(format!(
            "CREATE ROLE {} LOGIN PASSWORD '{}';",
            login,
            credentials.secret(role)
        ));
        lines.extend(grants_for(role, login));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn grants_for(role: Role, login: &str) -> Vec<String> {
    match role {
        Role::Application => vec![
            format!("GRANT CONNECT ON DATABASE {} TO {};", DB_NAME, login),
            format!("GRANT USAGE, CREATE ON SCHEMA public TO {};", login),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {};",
                login
            ),
            format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA public \
                 GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO {};",
                login
            ),
        ],
        Role::ReadOnly => vec![
            format!("GRANT CONNECT ON DATABASE {} TO {};", DB_NAME, login),
            format!("GRANT USAGE ON SCHEMA public TO {};", login),
            format!("GRANT SELECT ON ALL TABLES IN SCHEMA public TO {};", login),
            format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT SELECT ON TABLES TO {};",
                login
            ),
        ],
        Role::Backup => vec![
            format!("GRANT CONNECT ON DATABASE {} TO {};", DB_NAME, login),
            format!("GRANT pg_read_all_data TO {};", login),
            format!("GRANT pg_monitor TO {};", login),
        ],
        // Administrator and AdminUi never reach this function
        _ => vec![],
    }
}
