//! Filtering of aggregated comments by content and author.
//!
//! A filter is an ordered list of [`FilterStage`]s. Stages either grow the set of matches
//! (additive) or narrow it (reductive):
//!
//! - An **additive** stage tests every item that hasn't matched yet, and adds those that pass
//!   to the matches.
//! - A **reductive** stage re-tests every current match, and sends those that fail back to the
//!   pool of unmatched items, where a later additive stage can pick them up again.
//!
//! Whatever has matched after the last stage is the result. An empty filter matches
//! everything.

use super::CommentItem;
use serde::{Deserialize, Serialize};

/// One step of a comment filter, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterStage {
    pub case_sensitive: bool,
    /// Match if *any* term matches, rather than requiring all of them to.
    pub match_any: bool,
    /// Narrow down the current matches instead of adding to them.
    pub reductive: bool,
    /// Terms to look for in the author's display name.
    pub users: Vec<String>,
    /// Terms to look for in the comment text.
    pub content: Vec<String>,
}

/// Whether any, and whether all, of `terms` occur in `haystack`.
///
/// With no terms, that is `(false, true)`.
fn search(terms: &[String], haystack: &str, case_sensitive: bool) -> (bool, bool) {
    let folded;
    let haystack = if case_sensitive {
        haystack
    } else {
        folded = haystack.to_lowercase();
        folded.as_str()
    };

    let mut any = false;
    let mut all = true;
    for term in terms {
        let found = if case_sensitive {
            haystack.contains(term.as_str())
        } else {
            haystack.contains(term.to_lowercase().as_str())
        };
        any |= found;
        all &= found;
    }
    (any, all)
}

impl FilterStage {
    pub fn matches(&self, item: &CommentItem) -> bool {
        let (any_content, all_content) = search(&self.content, item.message(), self.case_sensitive);
        let (any_user, all_user) = search(&self.users, item.author_name(), self.case_sensitive);
        (self.match_any && (any_content || any_user)) || (all_content && all_user)
    }
}

/// Runs `items` through every stage of `stages`, in order, and returns the final matches.
///
/// Matches keep the relative order they were matched in; items matched by a later stage
/// come after those matched earlier.
pub fn apply(stages: &[FilterStage], items: Vec<CommentItem>) -> Vec<CommentItem> {
    if stages.is_empty() {
        return items;
    }

    let mut matches = Vec::new();
    let mut remaining = items;
    for (i, stage) in stages.iter().enumerate() {
        if stage.reductive {
            let (kept, dropped): (Vec<_>, Vec<_>) =
                matches.into_iter().partition(|item| stage.matches(item));
            matches = kept;
            remaining.extend(dropped);
        } else {
            let (found, rest): (Vec<_>, Vec<_>) =
                remaining.into_iter().partition(|item| stage.matches(item));
            matches.extend(found);
            remaining = rest;
        }
        tracing::trace!(
            stage = i,
            reductive = stage.reductive,
            matches = matches.len(),
            remaining = remaining.len(),
            "applied filter stage"
        );
    }
    matches
}
