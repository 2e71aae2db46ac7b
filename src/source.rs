//! Parameter sources
//!
//! The pipeline never reads a terminal directly; it asks a
//! `ParameterSource`. The interactive source prompts on stdin/stdout, the
//! non-interactive source answers from flags and environment input, and
//! tests supply scripted implementations. This keeps the whole pipeline
//! runnable without a TTY.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::Result;

/// Environment variable accepted as the permitted-address list in
/// non-interactive mode (comma separated).
pub const ALLOW_ENV_VAR: &str = "PGPROVISION_ALLOW";

/// Answers the questions the pipeline cannot decide on its own.
pub trait ParameterSource {
    /// Confirm the installation directory before anything is computed.
    fn confirm_install_dir(&mut self, dir: &Path) -> Result<bool>;

    /// Raw permitted-address entries, asked for only when none were given
    /// up front. An empty answer selects the open-access configuration.
    fn read_permitted_addresses(&mut self) -> Result<Vec<String>>;

    /// Final gate before any disk write. `summary` describes the bundle.
    fn confirm_write(&mut self, summary: &str) -> Result<bool>;
}

// ============================================================================
// Interactive Source
// ============================================================================

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct InteractiveSource {
    /// Skip the final write confirmation (the explicit `--yes` flag)
    assume_yes: bool,
}

impl InteractiveSource {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    fn prompt_line(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn prompt_yes_no(&self, prompt: &str, default_yes: bool) -> Result<bool> {
        let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
        let answer = self.prompt_line(&format!("{} {} ", prompt, suffix))?;
        Ok(match answer.to_lowercase().as_str() {
            "" => default_yes,
            "y" | "yes" => true,
            _ => false,
        })
    }
}

impl ParameterSource for InteractiveSource {
    fn confirm_install_dir(&mut self, dir: &Path) -> Result<bool> {
        self.prompt_yes_no(&format!("Install into {}?", dir.display()), true)
    }

    fn read_permitted_addresses(&mut self) -> Result<Vec<String>> {
        println!("Permitted client addresses (IPv4/IPv6, CIDR allowed).");
        println!("Leave empty for open access; that choice is flagged in the report.");
        let line = self.prompt_line("Addresses (comma separated): ")?;
        Ok(split_address_list(&line))
    }

    fn confirm_write(&mut self, summary: &str) -> Result<bool> {
        println!("{}", summary);
        println!();
        if self.assume_yes {
            return Ok(true);
        }
        self.prompt_yes_no("Write these artifacts?", false)
    }
}

// ============================================================================
// Non-Interactive Source
// ============================================================================

/// Answers from flags and environment input; never reads a TTY.
#[derive(Debug, Default)]
pub struct NonInteractiveSource {
    permitted: Vec<String>,
    assume_yes: bool,
}

impl NonInteractiveSource {
    /// `permitted` comes from flags or `PGPROVISION_ALLOW`; `assume_yes`
    /// from the explicit confirmation flag.
    pub fn new(permitted: Vec<String>, assume_yes: bool) -> Self {
        Self {
            permitted,
            assume_yes,
        }
    }

    /// Permitted addresses from the environment, when set.
    pub fn permitted_from_env() -> Vec<String> {
        std::env::var(ALLOW_ENV_VAR)
            .map(|v| split_address_list(&v))
            .unwrap_or_default()
    }
}

impl ParameterSource for NonInteractiveSource {
    fn confirm_install_dir(&mut self, _dir: &Path) -> Result<bool> {
        Ok(true)
    }

    fn read_permitted_addresses(&mut self) -> Result<Vec<String>> {
        Ok(self.permitted.clone())
    }

    fn confirm_write(&mut self, _summary: &str) -> Result<bool> {
        Ok(self.assume_yes)
    }
}

/// Split a comma-separated address list, dropping blank pieces.
pub fn split_address_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_split_address_list() {
        assert_eq!(
            split_address_list("10.0.0.5, 192.168.1.0/24 ,,"),
            vec!["10.0.0.5".to_string(), "192.168.1.0/24".to_string()]
        );
        assert!(split_address_list("").is_empty());
        assert!(split_address_list(" , ").is_empty());
    }

    #[test]
    fn test_non_interactive_answers_from_construction() {
        let mut source = NonInteractiveSource::new(vec!["10.0.0.5".to_string()], false);
        assert!(
            source
                .confirm_install_dir(&PathBuf::from("/opt/pgstack"))
                .unwrap()
        );
        assert_eq!(source.read_permitted_addresses().unwrap(), vec!["10.0.0.5"]);
        // Without the explicit confirmation flag nothing may be written.
        assert!(!source.confirm_write("summary").unwrap());

        let mut source = NonInteractiveSource::new(vec![], true);
        assert!(source.confirm_write("summary").unwrap());
    }
}
