//! Collection reporting functionality.

use super::error::{CollectionError, CollectionOutcome};
use super::nodes::Collector;
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

/// Collection report
#[derive(Debug)]
pub struct CollectReport {
    pub nodeid: String,
    pub outcome: CollectionOutcome,
    pub longrepr: Option<String>,
    pub error: Option<CollectionError>,
    pub result: Vec<Collector>,
}

impl CollectReport {
    pub fn passed(nodeid: String, result: Vec<Collector>) -> Self {
        Self {
            nodeid,
            outcome: CollectionOutcome::Passed,
            longrepr: None,
            error: None,
            result,
        }
    }

    pub fn failed(nodeid: String, error: CollectionError) -> Self {
        Self {
            nodeid,
            outcome: CollectionOutcome::Failed,
            longrepr: Some(error.to_string()),
            error: Some(error),
            result: Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == CollectionOutcome::Failed
    }
}

/// Collect a single node and return a report.
///
/// Collection errors become a failed report; every other error propagates.
pub fn collect_one_node(node: &Collector, session: &Session) -> SessionResult<CollectReport> {
    match node.collect(session) {
        Ok(result) => Ok(CollectReport::passed(node.nodeid().into(), result)),
        Err(SessionError::Collection(e)) => Ok(CollectReport::failed(node.nodeid().into(), e)),
        Err(e) => Err(e),
    }
}
