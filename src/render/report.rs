//! Credentials report encoder
//!
//! The human-readable summary an operator keeps after provisioning: every
//! role with its secret and connection URL, plus explicit warnings for the
//! configurations that need operator attention (open access, undetected
//! host address).

use strum::IntoEnumIterator;

use crate::params::{DeploymentParameters, HostAddressSource};
use crate::render::connection_url;
use crate::rules::AccessPolicy;
use crate::secrets::CredentialSet;
use crate::types::{ADMIN_UI_EMAIL, Role};

/// Warning line emitted when no permitted-address list was supplied.
pub const OPEN_ACCESS_WARNING: &str =
    "WARNING: no permitted client addresses were supplied. No reject rule was \
     emitted; any host that can reach the database port may attempt to log in.";

/// Warning line emitted when the host address is a placeholder.
pub const PLACEHOLDER_WARNING: &str =
    "WARNING: the server address could not be detected. Replace the placeholder \
     in .env and in the connection strings below before use.";

/// Warning line emitted when only a local interface address was found.
pub const LOCAL_ADDRESS_WARNING: &str =
    "WARNING: the server address was taken from a local interface and may not \
     be reachable from outside this machine.";

fn host_label(source: HostAddressSource) -> &'static str {
    match source {
        HostAddressSource::Explicit => "operator supplied",
        HostAddressSource::Probe => "auto-detected",
        HostAddressSource::LocalInterface => "local interface",
        HostAddressSource::Placeholder => "placeholder",
    }
}

fn role_login(role: Role) -> String {
    match role.db_role() {
        Some(login) => login.to_string(),
        None => ADMIN_UI_EMAIL.to_string(),
    }
}

pub fn render(
    params: &DeploymentParameters,
    credentials: &CredentialSet,
    policy: &AccessPolicy,
) -> String {
    let mut lines = vec![
        "==============================================".to_string(),
        " pgstack deployment credentials".to_string(),
        "==============================================".to_string(),
        String::new(),
        format!("Install directory : {}", params.install_dir.display()),
        format!(
            "Server address    : {} ({})",
            params.host_address,
            host_label(params.host_source)
        ),
        format!("Database port     : {}", params.db_port),
        format!(
            "Admin UI          : http://{}:{}",
            params.host_address, params.admin_ui_port
        ),
        String::new(),
        "Credentials".to_string(),
        "-----------".to_string(),
    ];

    for role in Role::iter() {
        lines.push(format!(
            "{:<12} {:<22} {}   ({})",
            role.to_string(),
            role_login(role),
            credentials.secret(role),
            role.description()
        ));
    }

    lines.push(String::new());
    lines.push("Connection strings".to_string());
    lines.push("------------------".to_string());
    for role in Role::iter() {
        if let Some(url) = connection_url(role, credentials, params) {
            lines.push(format!("{:<12} {}", role.to_string(), url));
        }
    }

    lines.push(String::new());
    lines.push("Access control".to_string());
    lines.push("--------------".to_string());
    if policy.open_access {
        lines.push(OPEN_ACCESS_WARNING.to_string());
    } else {
        lines.push(format!(
            "{} rules compiled; clients allowed from:",
            policy.rules.len()
        ));
        for spec in &params.permitted {
            lines.push(format!("  - {}", spec));
        }
        lines.push("All other network sources are rejected.".to_string());
    }

    match params.host_source {
        HostAddressSource::Placeholder => {
            lines.push(String::new());
            lines.push(PLACEHOLDER_WARNING.to_string());
        }
        HostAddressSource::LocalInterface => {
            lines.push(String::new());
            lines.push(LOCAL_ADDRESS_WARNING.to_string());
        }
        _ => {}
    }

    lines.push(String::new());
    lines.push(
        "Keep this file secret. Re-run provisioning to rotate all credentials.".to_string(),
    );
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::HostAddressSource;
    use crate::render::tests::test_params;
    use crate::rules::compile_access_rules;
    use crate::types::PLACEHOLDER_HOST;

    #[test]
    fn test_report_lists_every_role_and_secret() {
        let params = test_params(&["10.0.0.5"]);
        let creds = CredentialSet::generate().unwrap();
        let policy = compile_access_rules(&params);
        let rendered = render(&params, &creds, &policy);

        for role in Role::iter() {
            assert!(rendered.contains(&role.to_string()));
            assert!(rendered.contains(creds.secret(role)));
        }
        assert!(rendered.contains(ADMIN_UI_EMAIL));
    }

    #[test]
    fn test_open_access_warning_present_only_when_open() {
        let creds = CredentialSet::generate().unwrap();

        let open = test_params(&[]);
        let rendered = render(&open, &creds, &compile_access_rules(&open));
        assert!(rendered.contains(OPEN_ACCESS_WARNING));

        let closed = test_params(&["10.0.0.5"]);
        let rendered = render(&closed, &creds, &compile_access_rules(&closed));
        assert!(!rendered.contains(OPEN_ACCESS_WARNING));
        assert!(rendered.contains("10.0.0.5"));
        assert!(rendered.contains("All other network sources are rejected."));
    }

    #[test]
    fn test_placeholder_host_is_flagged() {
        let mut params = test_params(&["10.0.0.5"]);
        params.host_address = PLACEHOLDER_HOST.to_string();
        params.host_source = HostAddressSource::Placeholder;

        let creds = CredentialSet::generate().unwrap();
        let rendered = render(&params, &creds, &compile_access_rules(&params));
        assert!(rendered.contains(PLACEHOLDER_WARNING));
        assert!(rendered.contains(PLACEHOLDER_HOST));
    }

    #[test]
    fn test_local_interface_host_is_flagged() {
        let mut params = test_params(&[]);
        params.host_address = "192.168.1.50".to_string();
        params.host_source = HostAddressSource::LocalInterface;

        let creds = CredentialSet::generate().unwrap();
        let rendered = render(&params, &creds, &compile_access_rules(&params));
        assert!(rendered.contains(LOCAL_ADDRESS_WARNING));
    }
}
