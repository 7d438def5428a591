//! Resolve a partially known entity to its file or directory.

use std::fs;
use std::path::{Path, PathBuf};

use mc_core::{EntityKind, Selector};
use regex::Regex;
use tracing::{debug, warn};

use crate::slug::clean_name;
use crate::{PathError, PathResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Names of the form `{prefix}{key}{suffix}`, where `key` is `{id}.{slug}`
/// or `{slug}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPattern {
    pub kind: EntityKind,
    pub prefix: String,
    pub suffix: String,
    pub entry: EntryKind,
}

impl EntryPattern {
    /// `{model}.{kind}.{key}.json`
    pub fn doc(model: &str, kind: EntityKind) -> Self {
        Self {
            kind,
            prefix: format!("{}.{}.", model, kind.file_word()),
            suffix: ".json".to_string(),
            entry: EntryKind::File,
        }
    }

    /// `{kind}.{key}/`
    pub fn dir(kind: EntityKind) -> Self {
        Self {
            kind,
            prefix: format!("{}.", kind.file_word()),
            suffix: String::new(),
            entry: EntryKind::Dir,
        }
    }

    /// `{model}.{kind}.{key}/`, the root of a narrowed-scope copy.
    pub fn scope_dir(model: &str, kind: EntityKind) -> Self {
        Self {
            kind,
            prefix: format!("{}.{}.", model, kind.file_word()),
            suffix: String::new(),
            entry: EntryKind::Dir,
        }
    }

    pub fn file_name(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, key, self.suffix)
    }

    fn key_of<'n>(&self, file_name: &'n str) -> Option<&'n str> {
        file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|k| !k.is_empty())
    }

    fn exists(&self, path: &Path) -> bool {
        match self.entry {
            EntryKind::File => path.is_file(),
            EntryKind::Dir => path.is_dir(),
        }
    }
}

/// A matched file or directory and the identity parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub path: PathBuf,
    /// Name part between prefix and suffix.
    pub key: String,
    pub id: Option<i32>,
    /// Slug part of the key; the entity name when it needed no cleaning.
    pub name: String,
}

impl Found {
    fn new(path: PathBuf, key: &str) -> Self {
        let (id, name) = split_key(key);
        Self {
            path,
            key: key.to_string(),
            id,
            name: name.to_string(),
        }
    }
}

/// `7.Default` -> `(Some(7), "Default")`, `Default` -> `(None, "Default")`.
fn split_key(key: &str) -> (Option<i32>, &str) {
    if let Some((head, rest)) = key.split_once('.') {
        if !rest.is_empty() && !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = head.parse::<i32>() {
                return (Some(id), rest);
            }
        }
    }
    (None, key)
}

/// Every entry of `root` matching `pattern`, in lexical order.
pub fn list_entries(root: &Path, pattern: &EntryPattern) -> PathResult<Vec<Found>> {
    let read = fs::read_dir(root).map_err(|source| PathError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut found = Vec::new();
    for entry in read {
        let entry = entry.map_err(|source| PathError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(key) = pattern.key_of(file_name) else {
            continue;
        };
        let path = entry.path();
        if pattern.exists(&path) {
            found.push(Found::new(path, key));
        }
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

/// Find the entry for `selector` under `root`.
///
/// Exact names are tried first (`{id}.{slug}`, then `{slug}`). Otherwise a
/// pattern on the unknown part is matched against the directory listing;
/// with several matches the lexically first one wins and the ambiguity is
/// logged.
pub fn resolve_entity(
    root: &Path,
    pattern: &EntryPattern,
    selector: &Selector,
) -> PathResult<Found> {
    if selector.is_empty() {
        return Err(PathError::InvalidName {
            what: format!("empty {} selector", pattern.kind),
        });
    }
    let clean = selector
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(clean_name);

    // the key form is known here, so a name such as `2024.Q1` is not split
    let mut exact = Vec::new();
    if let (Some(id), Some(name)) = (selector.id, clean.as_deref()) {
        exact.push((format!("{}.{}", id, name), Some(id), name));
    }
    if let Some(name) = clean.as_deref() {
        exact.push((name.to_string(), None, name));
    }
    for (key, id, name) in exact {
        let path = root.join(pattern.file_name(&key));
        if pattern.exists(&path) {
            debug!("Resolved {} {} to {}", pattern.kind, selector, path.display());
            let found = Found {
                path,
                key,
                id,
                name: name.to_string(),
            };
            return Ok(with_selector_name(found, selector));
        }
    }

    let prefix = regex::escape(&pattern.prefix);
    let suffix = regex::escape(&pattern.suffix);
    let mut searches = Vec::new();
    if let Some(id) = selector.id {
        searches.push(format!(r"^{}{}\..+{}$", prefix, id, suffix));
    }
    if let Some(name) = clean.as_deref() {
        searches.push(format!(r"^{}\d+\.{}{}$", prefix, regex::escape(name), suffix));
    }

    let entries = match fs::metadata(root) {
        Ok(_) => list_entries(root, pattern)?,
        Err(_) => Vec::new(),
    };
    for search in searches {
        let re = Regex::new(&search)?;
        let mut matches = entries.iter().filter(|f| {
            f.path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| re.is_match(n))
        });
        let Some(first) = matches.next() else {
            continue;
        };
        let others: Vec<_> = matches.map(|f| f.key.as_str()).collect();
        if !others.is_empty() {
            warn!(
                "{} {} is ambiguous in {}: using '{}', ignoring {:?}",
                pattern.kind,
                selector,
                root.display(),
                first.key,
                others
            );
        }
        debug!("Resolved {} {} to {}", pattern.kind, selector, first.path.display());
        return Ok(with_selector_name(first.clone(), selector));
    }

    Err(PathError::NotFound {
        kind: pattern.kind,
        selector: selector.to_string(),
        root: root.to_path_buf(),
    })
}

fn with_selector_name(mut found: Found, selector: &Selector) -> Found {
    if let Some(name) = selector.name.as_deref().filter(|n| !n.is_empty()) {
        if clean_name(name) == found.name {
            found.name = name.to_string();
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_key_recognises_leading_id() {
        assert_eq!(split_key("7.Default"), (Some(7), "Default"));
        assert_eq!(split_key("Default"), (None, "Default"));
        assert_eq!(split_key("v1.2"), (None, "v1.2"));
        assert_eq!(split_key("12."), (None, "12."));
        assert_eq!(split_key("3.Base.v2"), (Some(3), "Base.v2"));
    }

    #[test]
    fn key_of_strips_prefix_and_suffix() {
        let p = EntryPattern::doc("M", EntityKind::Run);
        assert_eq!(p.key_of("M.run.5.Base.json"), Some("5.Base"));
        assert_eq!(p.key_of("M.run..json"), None);
        assert_eq!(p.key_of("M.set.5.Base.json"), None);
    }

    #[test]
    fn empty_selector_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_entity(
            dir.path(),
            &EntryPattern::dir(EntityKind::Run),
            &Selector::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PathError::InvalidName { .. }));
    }
}
