//! Devstack - local development stack control
//!
//! Sequences compose calls across the three sections of the stack:
//!
//! - Database, started first and given a fixed head start
//! - Product service
//! - Sales service
//!
//! Container lifecycle itself is left entirely to compose.

pub mod compose;
pub mod config;
pub mod env_file;
pub mod error;
pub mod stack;

pub use config::{Section, StackConfig};
pub use error::{DevstackError, Result};
pub use stack::{LogTarget, RunReport, Stack, Verb};
