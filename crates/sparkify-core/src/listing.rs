//! Glob-filtered object listing.
//!
//! Input datasets are addressed as a base location plus a relative glob such
//! as `song_data/*/*/*/*.json`. Listing is narrowed to the literal prefix in
//! front of the first wildcard, and every listed key is matched against the
//! full pattern. A `*` never crosses a `/`, so the number of directory levels
//! is fixed by the pattern.

use futures::TryStreamExt;
use object_store::path::Path;
use regex::Regex;
use snafu::prelude::*;
use tracing::debug;

use crate::error::{InvalidUrlSnafu, ObjectStoreSnafu, StorageError};
use crate::storage::StorageProvider;

/// A relative object-key glob.
///
/// Supports `*` (any run of characters within one path segment) and `?`
/// (exactly one character within a segment). Everything else is literal.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    prefix: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, StorageError> {
        let pattern = pattern.trim_start_matches('/');

        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str("[^/]*"),
                '?' => expr.push_str("[^/]"),
                c => expr.push_str(&regex::escape(&c.to_string())),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).ok().context(InvalidUrlSnafu {
            url: pattern.to_string(),
        })?;

        // Directory part in front of the first wildcard
        let literal = pattern
            .find(['*', '?'])
            .map(|idx| &pattern[..idx])
            .unwrap_or(pattern);
        let prefix = match literal.rfind('/') {
            Some(idx) => literal[..idx].to_string(),
            None => String::new(),
        };

        Ok(Self {
            pattern: pattern.to_string(),
            prefix,
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Literal directory prefix that every match lives under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// List objects below the provider's root that match `pattern`.
///
/// Returns paths relative to the provider's root, sorted lexicographically
/// for deterministic ordering.
pub async fn list_matching(
    storage: &StorageProvider,
    pattern: &GlobPattern,
) -> Result<Vec<String>, StorageError> {
    let relative_prefix = Path::from(pattern.prefix());
    let list_prefix = storage.qualify_path(&relative_prefix).into_owned();
    let list_prefix = (list_prefix.parts().count() > 0).then_some(list_prefix);
    let key_part_count = storage
        .config()
        .key()
        .map(|key| key.parts().count())
        .unwrap_or_default();

    debug!(
        url = %storage.canonical_url(),
        pattern = %pattern.as_str(),
        prefix = %pattern.prefix(),
        "Listing input objects"
    );

    let mut matched: Vec<String> = storage
        .object_store()
        .list(list_prefix.as_ref())
        .try_filter_map(|meta| {
            let relative = meta
                .location
                .parts()
                .skip(key_part_count)
                .collect::<Path>()
                .to_string();
            let keep = pattern.is_match(&relative).then_some(relative);
            futures::future::ready(Ok(keep))
        })
        .try_collect()
        .await
        .context(ObjectStoreSnafu)?;

    matched.sort();

    debug!(
        url = %storage.canonical_url(),
        pattern = %pattern.as_str(),
        matched = matched.len(),
        "Listed input objects"
    );

    Ok(matched)
}
