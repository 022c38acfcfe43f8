//! Compose command-line assembly

use crate::config::{Section, StackConfig};
use crate::env_file::Environment;
use std::fmt;

/// Compose subcommand issued for a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    /// `up -d`
    Up,
    /// `down --remove-orphans`
    Down,
    /// `ps`
    Ps,
    /// `logs -f`
    Logs,
    /// `build`, optionally `--no-cache`
    Build { no_cache: bool },
}

impl ComposeAction {
    /// Arguments following `-p <project> -f <file>`
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            ComposeAction::Up => &["up", "-d"],
            ComposeAction::Down => &["down", "--remove-orphans"],
            ComposeAction::Ps => &["ps"],
            ComposeAction::Logs => &["logs", "-f"],
            ComposeAction::Build { no_cache: false } => &["build"],
            ComposeAction::Build { no_cache: true } => &["build", "--no-cache"],
        }
    }
}

impl fmt::Display for ComposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

/// A single compose call, ready to be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeInvocation {
    pub section: Section,
    pub action: ComposeAction,
    pub program: String,
    pub args: Vec<String>,
    /// Variables set on the child in addition to the inherited environment
    pub env: Environment,
}

impl ComposeInvocation {
    /// Build the call for `section` from the stack config
    pub fn new(config: &StackConfig, section: Section, action: ComposeAction) -> Self {
        let (program, leading) = match config.compose_command.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => ("docker-compose".to_string(), Vec::new()),
        };

        let mut args = leading;
        args.push("-p".to_string());
        args.push(config.project_name.clone());
        args.push("-f".to_string());
        args.push(config.section(section).compose_file.display().to_string());
        args.extend(action.args().iter().map(|a| a.to_string()));

        Self {
            section,
            action,
            program,
            args,
            env: Environment::new(),
        }
    }

    /// Attach environment variables for the child
    pub fn with_env(mut self, env: &Environment) -> Self {
        self.env = env.clone();
        self
    }

    /// Printable command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_args() {
        let config = StackConfig::default();
        let inv = ComposeInvocation::new(&config, Section::Database, ComposeAction::Up);

        assert_eq!(inv.program, "docker-compose");
        assert_eq!(
            inv.args,
            vec!["-p", "devstack", "-f", "database/docker-compose.yml", "up", "-d"]
        );
        assert!(inv.env.is_empty());
    }

    #[test]
    fn test_plugin_style_compose_command() {
        let mut config = StackConfig::default();
        config.compose_command = vec!["docker".to_string(), "compose".to_string()];
        config.project_name = "shop".to_string();

        let inv = ComposeInvocation::new(&config, Section::Sales, ComposeAction::Down);
        assert_eq!(
            inv.command_line(),
            "docker compose -p shop -f sales-service/docker-compose.yml down --remove-orphans"
        );
    }

    #[test]
    fn test_action_args() {
        assert_eq!(ComposeAction::Ps.args(), &["ps"]);
        assert_eq!(ComposeAction::Logs.args(), &["logs", "-f"]);
        assert_eq!(ComposeAction::Build { no_cache: false }.args(), &["build"]);
        assert_eq!(
            ComposeAction::Build { no_cache: true }.to_string(),
            "build --no-cache"
        );
    }

    #[test]
    fn test_with_env() {
        let mut env = Environment::new();
        env.insert("FOO".to_string(), "bar".to_string());

        let inv = ComposeInvocation::new(&StackConfig::default(), Section::Product, ComposeAction::Up)
            .with_env(&env);
        assert_eq!(inv.env.get("FOO").map(String::as_str), Some("bar"));
    }
}
