//! Access-control file encoder
//!
//! One aligned row per compiled rule, in compiled order. The engine reads
//! this file top to bottom and stops at the first match, so row order is
//! the policy.

use crate::rules::AccessPolicy;

pub fn render(policy: &AccessPolicy) -> String {
    let mut lines = vec![
        "# PostgreSQL Client Authentication Configuration".to_string(),
        "# Generated by pgprovision. Order matters: first match wins.".to_string(),
        "#".to_string(),
        format!(
            "# {:<5} {:<15} {:<15} {:<23} {}",
            "TYPE", "DATABASE", "USER", "ADDRESS", "METHOD"
        ),
    ];

    for rule in &policy.rules {
        lines.push(format!(
            "{:<7} {:<15} {:<15} {:<23} {}",
            rule.connection.to_string(),
            rule.database,
            rule.role,
            rule.address.as_deref().unwrap_or(""),
            rule.method
        ));
    }

    lines.push(String::new());
    lines.join("\n")
}
