//! Stack command dispatcher
//!
//! Maps each [`Verb`] to a fixed sequence of compose calls over the three
//! sections. Steps never abort the sequence: a failing call is logged and the
//! next one runs anyway.

use crate::compose::{ComposeAction, ComposeInvocation, ComposeRunner, StepOutcome};
use crate::config::{Section, StackConfig};
use crate::env_file::{self, Environment};
use crate::error::{DevstackError, Result};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Which logs to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Section(Section),
    All,
}

impl LogTarget {
    /// Parse the optional service argument of `logs`
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            Some(value) => value.parse(),
            None => Err(DevstackError::MissingLogService),
        }
    }
}

impl FromStr for LogTarget {
    type Err = DevstackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "db" => Ok(LogTarget::Section(Section::Database)),
            "product" => Ok(LogTarget::Section(Section::Product)),
            "sales" => Ok(LogTarget::Section(Section::Sales)),
            "all" => Ok(LogTarget::All),
            other => Err(DevstackError::UnknownLogService(other.to_string())),
        }
    }
}

/// Stack-level command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Start,
    Stop,
    Restart,
    Status,
    Logs(LogTarget),
    Rebuild,
    RebuildStart,
}

/// Outcomes of the compose calls made by a verb, in completion order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<StepOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.success())
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    fn merge(&mut self, other: RunReport) {
        self.steps.extend(other.steps);
    }
}

/// The database, product and sales compose stack
pub struct Stack {
    config: StackConfig,
    runner: Arc<dyn ComposeRunner>,
}

impl Stack {
    pub fn new(config: StackConfig, runner: Arc<dyn ComposeRunner>) -> Self {
        Self { config, runner }
    }

    /// Run a verb
    ///
    /// The container runtime is checked first; nothing is launched if it is
    /// unreachable. `shutdown` resolving ends `logs` normally and interrupts
    /// every other verb.
    pub async fn dispatch<F>(&self, verb: Verb, shutdown: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        self.runner.ensure_available().await?;
        tracing::debug!("Dispatching {:?} for project {}", verb, self.config.project_name);

        let work = async move {
            match verb {
                Verb::Start => self.start().await,
                Verb::Stop => self.stop().await,
                Verb::Restart => self.restart().await,
                Verb::Status => self.status().await,
                Verb::Logs(target) => self.logs(target).await,
                Verb::Rebuild => self.rebuild().await,
                Verb::RebuildStart => self.rebuild_start().await,
            }
        };

        tokio::select! {
            report = work => report,
            _ = shutdown => match verb {
                Verb::Logs(_) => {
                    tracing::info!("Stopped following logs");
                    Ok(RunReport::default())
                }
                _ => Err(DevstackError::Interrupted),
            },
        }
    }

    /// Bring up database, then product, then sales
    pub async fn start(&self) -> Result<RunReport> {
        tracing::info!("Starting stack {}", self.config.project_name);

        let env = env_file::load_sections(&self.config);
        let mut report = RunReport::default();

        report.steps.push(self.step(Section::Database, ComposeAction::Up, &env).await);
        self.wait_for_database().await;
        report.steps.push(self.step(Section::Product, ComposeAction::Up, &env).await);
        report.steps.push(self.step(Section::Sales, ComposeAction::Up, &env).await);

        Ok(report)
    }

    /// Tear down sales, product, then database
    pub async fn stop(&self) -> Result<RunReport> {
        tracing::info!("Stopping stack {}", self.config.project_name);
        self.each(&Section::TEARDOWN, ComposeAction::Down).await
    }

    pub async fn restart(&self) -> Result<RunReport> {
        let mut report = self.stop().await?;
        report.merge(self.start().await?);
        Ok(report)
    }

    pub async fn status(&self) -> Result<RunReport> {
        self.each(&Section::STARTUP, ComposeAction::Ps).await
    }

    /// Follow logs until the streams end or the dispatcher is interrupted
    pub async fn logs(&self, target: LogTarget) -> Result<RunReport> {
        match target {
            LogTarget::Section(section) => {
                let mut report = RunReport::default();
                report
                    .steps
                    .push(self.step(section, ComposeAction::Logs, &Environment::new()).await);
                Ok(report)
            }
            LogTarget::All => self.follow_all().await,
        }
    }

    /// Rebuild images; product and sales skip the build cache
    pub async fn rebuild(&self) -> Result<RunReport> {
        tracing::info!("Rebuilding stack {}", self.config.project_name);

        let env = Environment::new();
        let mut report = RunReport::default();

        report.steps.push(
            self.step(Section::Database, ComposeAction::Build { no_cache: false }, &env)
                .await,
        );
        report.steps.push(
            self.step(Section::Product, ComposeAction::Build { no_cache: true }, &env)
                .await,
        );
        report.steps.push(
            self.step(Section::Sales, ComposeAction::Build { no_cache: true }, &env)
                .await,
        );

        Ok(report)
    }

    pub async fn rebuild_start(&self) -> Result<RunReport> {
        let mut report = self.rebuild().await?;
        report.merge(self.start().await?);
        Ok(report)
    }

    /// Fixed pause; compose gives no readiness signal here
    async fn wait_for_database(&self) {
        let wait = self.config.database_wait();
        if wait.is_zero() {
            return;
        }

        tracing::info!("Waiting {}s for the database to come up", wait.as_secs());
        tokio::time::sleep(wait).await;
    }

    async fn each(&self, sections: &[Section], action: ComposeAction) -> Result<RunReport> {
        let env = Environment::new();
        let mut report = RunReport::default();

        for &section in sections {
            report.steps.push(self.step(section, action, &env).await);
        }

        Ok(report)
    }

    /// Stream every section's logs concurrently
    async fn follow_all(&self) -> Result<RunReport> {
        let mut streams = JoinSet::new();

        for section in Section::STARTUP {
            let runner = Arc::clone(&self.runner);
            let invocation = ComposeInvocation::new(&self.config, section, ComposeAction::Logs);
            tracing::info!("{}: {}", section, invocation.command_line());

            streams.spawn(async move {
                let result = runner.run(&invocation).await;
                (invocation, result)
            });
        }

        // Dropping the set aborts the remaining streams
        let mut report = RunReport::default();
        while let Some(joined) = streams.join_next().await {
            match joined {
                Ok((invocation, result)) => report.steps.push(settle(&invocation, result)),
                Err(e) => tracing::warn!("Log stream task failed: {}", e),
            }
        }

        Ok(report)
    }

    async fn step(&self, section: Section, action: ComposeAction, env: &Environment) -> StepOutcome {
        let invocation = ComposeInvocation::new(&self.config, section, action).with_env(env);
        tracing::info!("{}: {}", section, invocation.command_line());

        let result = self.runner.run(&invocation).await;
        settle(&invocation, result)
    }
}

/// Log a failed step and turn it into an outcome
fn settle(invocation: &ComposeInvocation, result: Result<StepOutcome>) -> StepOutcome {
    match result {
        Ok(outcome) => {
            if !outcome.success() {
                match outcome.exit_code {
                    Some(code) => tracing::warn!(
                        "{} `{}` exited with status {}",
                        invocation.section,
                        invocation.action,
                        code
                    ),
                    None => tracing::warn!(
                        "{} `{}` was terminated by a signal",
                        invocation.section,
                        invocation.action
                    ),
                }
            }
            outcome
        }
        Err(e) => {
            tracing::warn!("{} `{}` failed: {}", invocation.section, invocation.action, e);
            StepOutcome {
                section: invocation.section,
                action: invocation.action,
                exit_code: None,
            }
        }
    }
}
