//! Slugs: filesystem-safe names derived from (id, name).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use mc_core::{EntityKind, EntityLocator, McError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// When the numeric id becomes part of a slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamePolicy {
    Always,
    Never,
    /// Only entities whose names collide within the scope carry their id.
    #[default]
    OnConflict,
}

impl NamePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            NamePolicy::Always => "always",
            NamePolicy::Never => "never",
            NamePolicy::OnConflict => "on-conflict",
        }
    }
}

impl fmt::Display for NamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamePolicy {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(NamePolicy::Always),
            "never" => Ok(NamePolicy::Never),
            "on-conflict" => Ok(NamePolicy::OnConflict),
            other => Err(McError::InvalidArg {
                what: format!("unknown id-in-name policy '{}'", other),
            }),
        }
    }
}

/// Replace characters that are unsafe in a file name segment.
///
/// Reserved punctuation and control characters become `_`, as do trailing
/// spaces and dots. Device names such as `CON` get a leading `_`.
pub fn clean_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|ch| {
            if matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
                || ch <= '\u{1f}'
                || ch == '\u{7f}'
            {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let kept = out.trim_end_matches([' ', '.']).len();
    let trailing = out.len() - kept;
    out.truncate(kept);
    out.extend(std::iter::repeat_n('_', trailing));

    if out.is_empty() {
        return "_".to_string();
    }
    let base = out.split('.').next().unwrap_or(&out);
    if is_device_name(base) {
        out.insert(0, '_');
    }
    out
}

fn is_device_name(base: &str) -> bool {
    let base = base.to_ascii_uppercase();
    match base.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" => true,
        _ => base
            .strip_prefix("COM")
            .or_else(|| base.strip_prefix("LPT"))
            .is_some_and(|n| n.len() == 1 && matches!(n.as_bytes()[0], b'1'..=b'9')),
    }
}

/// Slug of one entity: `{id}.{name}` or `{name}`.
pub fn slug(locator: &EntityLocator, with_id: bool) -> String {
    let name = clean_name(&locator.name);
    if with_id {
        format!("{}.{}", locator.id, name)
    } else {
        name
    }
}

/// Slug decisions for every entity of one scope.
///
/// Built from the full candidate set so that `OnConflict` sees every
/// collision before any name is handed out. Whatever the policy, the final
/// slugs of one kind are distinct (case-insensitively): an entity whose
/// slug would equal another's gets its id, repeated until no two collide.
#[derive(Debug, Clone)]
pub struct SlugPlan {
    policy: NamePolicy,
    with_id: HashSet<(EntityKind, i32)>,
}

impl SlugPlan {
    pub fn new<'a>(
        policy: NamePolicy,
        scope: impl IntoIterator<Item = &'a EntityLocator>,
    ) -> Self {
        let mut seen = HashSet::new();
        let scope: Vec<&EntityLocator> = scope
            .into_iter()
            .filter(|loc| seen.insert((loc.kind, loc.id)))
            .collect();

        let mut with_id: HashSet<(EntityKind, i32)> = match policy {
            NamePolicy::Always => scope.iter().map(|l| (l.kind, l.id)).collect(),
            NamePolicy::Never => HashSet::new(),
            NamePolicy::OnConflict => {
                let mut by_name: HashMap<(EntityKind, String), Vec<i32>> = HashMap::new();
                for loc in &scope {
                    by_name
                        .entry((loc.kind, clean_name(&loc.name).to_lowercase()))
                        .or_default()
                        .push(loc.id);
                }
                by_name
                    .into_iter()
                    .filter(|(_, ids)| ids.len() > 1)
                    .flat_map(|((kind, _), ids)| ids.into_iter().map(move |id| (kind, id)))
                    .collect()
            }
        };

        // an id-qualified slug may still equal another entity's plain name
        loop {
            let mut by_slug: HashMap<(EntityKind, String), Vec<&EntityLocator>> = HashMap::new();
            for loc in &scope {
                let s = slug(loc, with_id.contains(&(loc.kind, loc.id)));
                by_slug.entry((loc.kind, s.to_lowercase())).or_default().push(loc);
            }
            let mut forced = Vec::new();
            for ((_, s), locs) in by_slug.iter().filter(|(_, locs)| locs.len() > 1) {
                for loc in locs {
                    if !with_id.contains(&(loc.kind, loc.id)) {
                        forced.push((loc.kind, loc.id));
                        if policy == NamePolicy::Never {
                            warn!("{} shares slug '{}', adding its id", loc, s);
                        }
                    }
                }
            }
            if forced.is_empty() {
                break;
            }
            with_id.extend(forced);
        }
        Self { policy, with_id }
    }

    pub fn policy(&self) -> NamePolicy {
        self.policy
    }

    pub fn includes_id(&self, locator: &EntityLocator) -> bool {
        self.policy == NamePolicy::Always || self.with_id.contains(&(locator.kind, locator.id))
    }

    pub fn slug(&self, locator: &EntityLocator) -> String {
        slug(locator, self.includes_id(locator))
    }
}
