//! `KEY=VALUE` environment files
//!
//! Each section may carry an env file that is read before `start`. The parsed
//! variables are handed to the compose subprocesses explicitly; the process
//! environment of devstack itself is never modified.

use crate::config::{Section, StackConfig};
use crate::error::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Variables passed to compose subprocesses on top of the inherited environment
pub type Environment = BTreeMap<String, String>;

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid env key regex"))
}

/// Parse env file content
///
/// Blank lines and lines starting with `#` are skipped. Lines without `=` or
/// with a key that is not a shell identifier are skipped with a warning.
pub fn parse_str(content: &str) -> Environment {
    let mut env = Environment::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            tracing::warn!("Ignoring env line {} without '=': {}", index + 1, raw);
            continue;
        };

        let key = key.trim();
        if !key_pattern().is_match(key) {
            tracing::warn!("Ignoring env line {} with invalid key '{}'", index + 1, key);
            continue;
        }

        env.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    env
}

/// Strip one pair of matching surrounding quotes
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Read an env file, `None` if it does not exist
pub fn load_file(path: &Path) -> Result<Option<Environment>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    Ok(Some(parse_str(&content)))
}

/// Load every section's env file, later sections overriding earlier keys
///
/// Missing or unreadable files only produce a warning.
pub fn load_sections(config: &StackConfig) -> Environment {
    let mut env = Environment::new();

    for section in Section::STARTUP {
        let Some(path) = config.section(section).env_file.as_deref() else {
            continue;
        };

        match load_file(path) {
            Ok(Some(vars)) => {
                tracing::info!(
                    "Loaded {} variables for {} from {}",
                    vars.len(),
                    section,
                    path.display()
                );
                env.extend(vars);
            }
            Ok(None) => {
                tracing::warn!(
                    "No env file for {} at {}, using defaults",
                    section,
                    path.display()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read env file for {} at {}: {}, using defaults",
                    section,
                    path.display(),
                    e
                );
            }
        }
    }

    env
}
