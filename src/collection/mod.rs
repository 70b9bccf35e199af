//! Test collection: path filtering, collector nodes and reports.

pub mod error;
pub mod filter;
pub mod nodes;
pub mod report;

pub use error::{CollectionError, CollectionOutcome, CollectionResult};
pub use filter::{fnmatch_ex, ignore_collect, in_venv};
pub use nodes::{Collector, Dir, FileNode, Item};
pub use report::{collect_one_node, CollectReport};
