//! Stack configuration
//!
//! The stack is made of three fixed sections, each backed by its own compose
//! file and an optional env file. Everything has a built-in default so the
//! config file is optional; when present it is a small YAML document:
//!
//! ```yaml
//! project_name: shop
//! compose_command: ["docker", "compose"]
//! database_wait_secs: 5
//! product:
//!   compose_file: services/product/compose.yml
//!   env_file: services/product/.env
//! ```

use crate::error::{DevstackError, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Config file name looked up in the working and user config directories
pub const CONFIG_FILE_NAME: &str = "devstack.yaml";

/// One section of the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Database,
    Product,
    Sales,
}

impl Section {
    /// Order used by start, status and rebuild
    pub const STARTUP: [Section; 3] = [Section::Database, Section::Product, Section::Sales];

    /// Order used by stop
    pub const TEARDOWN: [Section; 3] = [Section::Sales, Section::Product, Section::Database];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Database => "database",
            Section::Product => "product",
            Section::Sales => "sales",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Files backing one section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionConfig {
    /// Compose file passed with `-f`
    pub compose_file: PathBuf,
    /// Optional `KEY=VALUE` file loaded before `start`
    #[serde(default)]
    pub env_file: Option<PathBuf>,
}

impl SectionConfig {
    /// Section rooted at `dir` with the conventional file names
    pub fn in_dir(dir: &str) -> Self {
        let dir = Path::new(dir);
        Self {
            compose_file: dir.join("docker-compose.yml"),
            env_file: Some(dir.join(".env")),
        }
    }

    fn resolve_against(&mut self, base: &Path) {
        if self.compose_file.is_relative() {
            self.compose_file = base.join(&self.compose_file);
        }
        if let Some(env_file) = self.env_file.as_mut() {
            if env_file.is_relative() {
                *env_file = base.join(&*env_file);
            }
        }
    }
}

/// Whole-stack configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Compose project name (`-p`)
    pub project_name: String,
    /// Compose program and any leading arguments
    pub compose_command: Vec<String>,
    /// Container runtime probed before any verb runs
    pub runtime_command: String,
    /// Fixed pause after the database section comes up
    pub database_wait_secs: u64,
    pub database: SectionConfig,
    pub product: SectionConfig,
    pub sales: SectionConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            project_name: "devstack".to_string(),
            compose_command: vec!["docker-compose".to_string()],
            runtime_command: "docker".to_string(),
            database_wait_secs: 10,
            database: SectionConfig::in_dir("database"),
            product: SectionConfig::in_dir("product-service"),
            sales: SectionConfig::in_dir("sales-service"),
        }
    }
}

fn project_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid project name regex"))
}

impl StackConfig {
    /// Files for a section
    pub fn section(&self, section: Section) -> &SectionConfig {
        match section {
            Section::Database => &self.database,
            Section::Product => &self.product,
            Section::Sales => &self.sales,
        }
    }

    pub fn database_wait(&self) -> Duration {
        Duration::from_secs(self.database_wait_secs)
    }

    /// Parse config from a YAML string
    pub fn parse_str(content: &str) -> Result<Self> {
        let config: StackConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file; relative paths resolve against its directory
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DevstackError::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse_str(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        tracing::debug!("Loaded stack config from {}", path.display());
        Ok(config)
    }

    /// Find a config file: `dir/devstack.yaml`, then the user config directory
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        let local = dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|d| d.join("devstack").join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }

    /// Resolve the config for a run: explicit path, discovered file, or defaults
    pub fn resolve(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::discover(working_dir) {
                Some(path) => Self::load(&path),
                None => {
                    tracing::debug!("No {} found, using built-in defaults", CONFIG_FILE_NAME);
                    Ok(Self::default())
                }
            },
        }
    }

    /// Make relative section paths absolute against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        self.database.resolve_against(base);
        self.product.resolve_against(base);
        self.sales.resolve_against(base);
    }

    /// Check the values the compose invocation depends on
    pub fn validate(&self) -> Result<()> {
        if self.compose_command.is_empty() || self.compose_command[0].trim().is_empty() {
            return Err(DevstackError::InvalidConfig(
                "compose_command must name a program".to_string(),
            ));
        }

        if self.runtime_command.trim().is_empty() {
            return Err(DevstackError::InvalidConfig(
                "runtime_command must name a program".to_string(),
            ));
        }

        if !project_name_pattern().is_match(&self.project_name) {
            return Err(DevstackError::InvalidConfig(format!(
                "invalid project name '{}': use lowercase letters, digits, '-' and '_'",
                self.project_name
            )));
        }

        Ok(())
    }
}
