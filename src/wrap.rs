//! Session lifecycle: configure, start, run, and always tear down.

use crate::config::Config;
use crate::error::{SessionError, SessionResult, UsageError};
use crate::exit_code::{ExitCode, ExitStatus};
use crate::session::Session;
use std::env;
use std::rc::Rc;

/// How far setup got before the body ran or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum InitState {
    Created,
    Configured,
    Started,
}

/// Run `doit` inside a fully set up session and map its outcome to an exit
/// status.
///
/// Teardown always runs: the working directory is restored,
/// `session_finish` fires when `session_start` did, and the config is
/// unconfigured exactly once. A [`UsageError`] is returned after teardown
/// instead of a status.
pub fn wrap_session<F>(config: &Rc<Config>, doit: F) -> Result<ExitStatus, UsageError>
where
    F: FnOnce(&Config, &mut Session) -> SessionResult<Option<ExitStatus>>,
{
    let mut session = Session::from_config(Rc::clone(config));
    session.exitstatus = ExitCode::Ok.into();
    let mut initstate = InitState::Created;

    let mut usage_error = None;
    match run_phases(config, &mut session, &mut initstate, doit) {
        Ok(status) => session.exitstatus = status.unwrap_or_default(),
        Err(err) => usage_error = handle_error(config, &mut session, initstate, err),
    }

    if let Err(err) = env::set_current_dir(session.startpath()) {
        log::warn!(
            "could not restore working directory {}: {err}",
            session.startpath().display()
        );
    }

    if initstate >= InitState::Started {
        let exitstatus = session.exitstatus;
        if let Err(exit) = config.hook.session_finish(&mut session, exitstatus) {
            if let Some(code) = exit.returncode {
                session.exitstatus = ExitStatus::from_code(code);
            }
            eprintln!("Exit: {}", exit.msg);
        }
    }
    config.ensure_unconfigure();

    log::debug!("session finished with {}", session.exitstatus);
    match usage_error {
        Some(err) => Err(err),
        None => Ok(session.exitstatus),
    }
}

fn run_phases<F>(
    config: &Config,
    session: &mut Session,
    initstate: &mut InitState,
    doit: F,
) -> SessionResult<Option<ExitStatus>>
where
    F: FnOnce(&Config, &mut Session) -> SessionResult<Option<ExitStatus>>,
{
    config.do_configure()?;
    *initstate = InitState::Configured;
    config.hook.session_start(session)?;
    *initstate = InitState::Started;
    doit(config, session)
}

/// Set the exit status for `err`. Returns the usage error to re-raise, if
/// that is what `err` was.
fn handle_error(
    config: &Config,
    session: &mut Session,
    initstate: InitState,
    err: SessionError,
) -> Option<UsageError> {
    match err {
        SessionError::Usage(usage) => {
            session.exitstatus = ExitCode::UsageError.into();
            Some(usage)
        }
        SessionError::Failed(reason) => {
            log::info!("run failed: {reason}");
            session.exitstatus = ExitCode::TestsFailed.into();
            None
        }
        err if err.is_interruption() => {
            let exitstatus = match &err {
                SessionError::Exit(exit) => exit
                    .returncode
                    .map_or(ExitCode::Interrupted.into(), ExitStatus::from_code),
                _ => ExitCode::Interrupted.into(),
            };
            if let Some(line) = early_exit_message(initstate, &err) {
                eprintln!("{line}");
            }
            config.hook.keyboard_interrupt(&err);
            session.exitstatus = exitstatus;
            None
        }
        err => {
            session.exitstatus = ExitCode::InternalError.into();
            match config.notify_exception(&err) {
                Err(exit) => {
                    if let Some(code) = exit.returncode {
                        session.exitstatus = ExitStatus::from_code(code);
                    }
                    eprintln!("Exit: {}", exit.msg);
                }
                Ok(()) => {
                    if matches!(err, SessionError::SystemExit(_)) {
                        eprintln!("mainloop: caught unexpected SystemExit!");
                    }
                }
            }
            None
        }
    }
}

/// Line written to stderr for an exit request raised before the session
/// started. Other interruptions are left to the reporters.
fn early_exit_message(initstate: InitState, err: &SessionError) -> Option<String> {
    match err {
        SessionError::Exit(_) if initstate < InitState::Started => {
            Some(format!("{}: {err}", err.kind()))
        }
        _ => None,
    }
}

/// Default session body: collect, run, and fail when anything failed.
pub fn run_main(config: &Config, session: &mut Session) -> SessionResult<Option<ExitStatus>> {
    config.hook.collection(session)?;
    config.hook.runtestloop(session)?;

    if session.testsfailed() > 0 {
        Ok(Some(ExitCode::TestsFailed.into()))
    } else {
        Ok(None)
    }
}

/// Entry point used by the binary.
pub fn cmdline_main(config: &Rc<Config>) -> Result<ExitStatus, UsageError> {
    wrap_session(config, run_main)
}
