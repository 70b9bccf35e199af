//! The default execution loop.

use crate::error::{SessionError, SessionResult};
use crate::session::Session;
use std::rc::Rc;

/// Run every collected item through `runtest_protocol`, in order.
///
/// The stop and fail flags are polled after each item; a set `shouldfail`
/// wins over `shouldstop`.
pub fn runtestloop(session: &mut Session) -> SessionResult<bool> {
    let config = Rc::clone(session.config());

    let errors = session.testsfailed();
    if errors > 0 && !config.option.continue_on_collection_errors {
        return Err(SessionError::Interrupted(format!(
            "{errors} error{} during collection",
            if errors == 1 { "" } else { "s" }
        )));
    }

    if config.option.collectonly {
        return Ok(true);
    }

    // Plugins may edit `session.items` while the loop runs.
    let mut i = 0;
    while let Some(item) = session.items.get(i).cloned() {
        let nextitem = session.items.get(i + 1).cloned();
        i += 1;
        config
            .hook
            .runtest_protocol(session, &item, nextitem.as_ref())?;

        if let Some(reason) = session.shouldfail() {
            return Err(SessionError::Failed(reason.to_string()));
        }
        if let Some(reason) = session.shouldstop() {
            return Err(SessionError::Interrupted(reason.to_string()));
        }
    }
    Ok(true)
}
