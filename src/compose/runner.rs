//! Running compose invocations

use super::invocation::{ComposeAction, ComposeInvocation};
use crate::config::Section;
use crate::error::{DevstackError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Result of one compose call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub section: Section,
    pub action: ComposeAction,
    /// Exit code; `None` if the process could not be spawned or was killed
    pub exit_code: Option<i32>,
}

impl StepOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes compose invocations against a container runtime
#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// Fail if the container runtime cannot be reached
    async fn ensure_available(&self) -> Result<()>;

    /// Run one invocation to completion
    ///
    /// Dropping the returned future must stop the underlying process.
    async fn run(&self, invocation: &ComposeInvocation) -> Result<StepOutcome>;
}

/// Runner spawning the real compose program
pub struct DockerCompose {
    runtime_command: String,
}

impl DockerCompose {
    /// `runtime_command` is probed with `info` by [`ComposeRunner::ensure_available`]
    pub fn new(runtime_command: &str) -> Self {
        Self {
            runtime_command: runtime_command.to_string(),
        }
    }
}

#[async_trait]
impl ComposeRunner for DockerCompose {
    async fn ensure_available(&self) -> Result<()> {
        let status = Command::new(&self.runtime_command)
            .arg("info")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                DevstackError::RuntimeUnavailable(format!(
                    "failed to invoke `{}` ({}); is it installed and on PATH?",
                    self.runtime_command, e
                ))
            })?;

        if !status.success() {
            return Err(DevstackError::RuntimeUnavailable(format!(
                "`{} info` failed ({}); is the daemon running?",
                self.runtime_command, status
            )));
        }

        tracing::debug!("Container runtime `{}` is reachable", self.runtime_command);
        Ok(())
    }

    async fn run(&self, invocation: &ComposeInvocation) -> Result<StepOutcome> {
        tracing::debug!("Running: {}", invocation.command_line());

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| DevstackError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(StepOutcome {
            section: invocation.section,
            action: invocation.action,
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_file::Environment;

    fn shell(script: &str, env: Environment) -> ComposeInvocation {
        ComposeInvocation {
            section: Section::Product,
            action: ComposeAction::Ps,
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env,
        }
    }

    #[test]
    fn test_step_outcome_success() {
        let mut outcome = StepOutcome {
            section: Section::Sales,
            action: ComposeAction::Up,
            exit_code: Some(0),
        };
        assert!(outcome.success());

        outcome.exit_code = Some(1);
        assert!(!outcome.success());

        outcome.exit_code = None;
        assert!(!outcome.success());
    }

    #[tokio::test]
    async fn test_missing_runtime_is_unavailable() {
        let runner = DockerCompose::new("devstack-no-such-runtime");
        let result = runner.ensure_available().await;
        assert!(matches!(result, Err(DevstackError::RuntimeUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_compose_program_is_spawn_error() {
        let runner = DockerCompose::new("docker");
        let mut inv = shell("true", Environment::new());
        inv.program = "devstack-no-such-compose".to_string();

        let result = runner.run(&inv).await;
        assert!(matches!(result, Err(DevstackError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_exit_code() {
        let runner = DockerCompose::new("docker");
        let outcome = runner.run(&shell("exit 3", Environment::new())).await.unwrap();

        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.section, Section::Product);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_passes_environment() {
        let mut env = Environment::new();
        env.insert("DEVSTACK_TEST_FOO".to_string(), "bar".to_string());

        let runner = DockerCompose::new("docker");
        let outcome = runner
            .run(&shell(r#"test "$DEVSTACK_TEST_FOO" = bar"#, env))
            .await
            .unwrap();

        assert!(outcome.success());
        // The parent process is left untouched
        assert!(std::env::var("DEVSTACK_TEST_FOO").is_err());
    }
}
