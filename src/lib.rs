//! Test session orchestration: configure plugins, collect script tests,
//! run them, and map the outcome to a process exit status.

pub mod basetemp;
pub mod builtin;
pub mod cli;
pub mod collection;
pub mod config;
pub mod deselect;
pub mod error;
pub mod exit_code;
pub mod hooks;
pub mod logging;
pub mod pathutil;
pub mod runner;
pub mod runtestloop;
pub mod session;
pub mod terminal;
pub mod wrap;

pub use config::{Config, Options};
pub use error::{ExitRequest, SessionError, SessionResult, UsageError};
pub use exit_code::{ExitCode, ExitStatus};
pub use hooks::{HookName, Plugin, PluginManager};
pub use session::Session;
pub use wrap::{cmdline_main, wrap_session};
