//! Kept in its own test binary: it changes the process working directory.

use rtest_session::{
    wrap_session, Config, ExitCode, ExitStatus, Options, Plugin, PluginManager, Session,
    SessionError, SessionResult, UsageError,
};
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Changes directory during setup, optionally failing right after.
struct Wanderer {
    target: PathBuf,
    in_configure: bool,
    fail_configure: bool,
}

impl Plugin for Wanderer {
    fn name(&self) -> &str {
        "wanderer"
    }

    fn configure(&self, _config: &Config) -> SessionResult<()> {
        if self.in_configure {
            env::set_current_dir(&self.target)?;
        }
        if self.fail_configure {
            return Err(SessionError::Internal("configure broke".into()));
        }
        Ok(())
    }

    fn session_start(&self, _session: &mut Session) -> SessionResult<()> {
        if !self.in_configure {
            env::set_current_dir(&self.target)?;
        }
        Ok(())
    }
}

fn config_with(root: &Path, start: &Path, wanderer: Wanderer) -> Rc<Config> {
    let mut pm = PluginManager::new();
    pm.register(Rc::new(wanderer));
    let option = Options {
        rootdir: Some(root.to_path_buf()),
        ..Options::default()
    };
    Rc::new(Config::new(option, pm, start.to_path_buf()).unwrap())
}

fn wanderer(target: &Path) -> Wanderer {
    Wanderer {
        target: target.to_path_buf(),
        in_configure: false,
        fail_configure: false,
    }
}

// One test function: the working directory is shared by every thread.
#[test]
fn test_working_directory_is_restored() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let start = env::current_dir().unwrap();

    let config = config_with(temp_dir.path(), &start, wanderer(temp_dir.path()));
    let status = wrap_session(&config, |_, _| {
        assert_ne!(env::current_dir().unwrap(), start);
        Ok(None)
    })
    .unwrap();
    assert_eq!(status, ExitCode::Ok);
    assert_eq!(env::current_dir().unwrap(), start);

    let failures: Vec<(SessionError, ExitStatus)> = vec![
        (SessionError::Failed("f".into()), ExitCode::TestsFailed.into()),
        (SessionError::Interrupted("i".into()), ExitCode::Interrupted.into()),
        (SessionError::KeyboardInterrupt, ExitCode::Interrupted.into()),
        (SessionError::Internal("boom".into()), ExitCode::InternalError.into()),
    ];
    for (err, expected) in failures {
        let kind = err.kind();
        let config = config_with(temp_dir.path(), &start, wanderer(temp_dir.path()));
        let status = wrap_session(&config, move |_, _| Err(err)).unwrap();
        assert_eq!(status, expected, "{kind}");
        assert_eq!(env::current_dir().unwrap(), start, "after {kind}");
    }

    let config = config_with(temp_dir.path(), &start, wanderer(temp_dir.path()));
    let err = wrap_session(&config, |_, _| Err(UsageError::new("bad").into())).unwrap_err();
    assert_eq!(err, UsageError::new("bad"));
    assert_eq!(env::current_dir().unwrap(), start, "after usage error");

    let config = config_with(
        temp_dir.path(),
        &start,
        Wanderer {
            in_configure: true,
            fail_configure: true,
            ..wanderer(temp_dir.path())
        },
    );
    let status = wrap_session(&config, |_, _| Ok(None)).unwrap();
    assert_eq!(status, ExitCode::InternalError);
    assert_eq!(env::current_dir().unwrap(), start, "after configure failure");
}
