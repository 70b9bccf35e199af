//! `--deselect` support.

use crate::collection::nodes::Item;
use crate::config::Config;
use std::mem;

/// Drop items whose nodeid starts with any `--deselect` prefix.
///
/// Remaining items keep their order. The removed ones are broadcast through
/// the `deselected` hook before `items` is replaced.
pub fn deselect_by_prefix(items: &mut Vec<Item>, config: &Config) {
    let prefixes = &config.option.deselect;
    if prefixes.is_empty() {
        return;
    }

    let (deselected, remaining): (Vec<Item>, Vec<Item>) = mem::take(items)
        .into_iter()
        .partition(|item| prefixes.iter().any(|prefix| item.nodeid.starts_with(prefix.as_str())));

    if !deselected.is_empty() {
        log::debug!("deselected {} item(s)", deselected.len());
        config.hook.deselected(&deselected);
    }
    *items = remaining;
}
