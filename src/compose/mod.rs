//! Compose integration
//!
//! Assembles `docker-compose -p <project> -f <file> <subcommand>` calls and
//! runs them. All container lifecycle work is left to compose itself.

pub mod invocation;
pub mod runner;

pub use invocation::{ComposeAction, ComposeInvocation};
pub use runner::{ComposeRunner, DockerCompose, StepOutcome};
