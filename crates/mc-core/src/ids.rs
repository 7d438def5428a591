use core::fmt;

/// Kind of a model-owned entity that gets its own document and directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntityKind {
    Run,
    Workset,
    Task,
}

impl EntityKind {
    /// Word used in file and directory names: `run`, `set`, `task`.
    pub fn file_word(self) -> &'static str {
        match self {
            EntityKind::Run => "run",
            EntityKind::Workset => "set",
            EntityKind::Task => "task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Run => write!(f, "run"),
            EntityKind::Workset => write!(f, "workset"),
            EntityKind::Task => write!(f, "task"),
        }
    }
}

/// Fully known identity of a run, workset or task: surrogate id plus name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityLocator {
    pub kind: EntityKind,
    pub id: i32,
    pub name: String,
}

impl EntityLocator {
    pub fn new(kind: EntityKind, id: i32, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '{}'", self.kind, self.id, self.name)
    }
}

/// Partially known identity, as supplied by the caller: id, name, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selector {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

impl Selector {
    pub fn by_id(id: i32) -> Self {
        Self {
            id: Some(id),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.as_deref().is_none_or(str::is_empty)
    }

    /// Match against a known entity.
    ///
    /// When both id and name are given the id wins: a name mismatch alone
    /// does not reject an entity whose id matches.
    pub fn matches(&self, id: i32, name: &str) -> bool {
        match (self.id, self.name.as_deref()) {
            (Some(want), _) => want == id,
            (None, Some(want)) => want == name,
            (None, None) => false,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.id, self.name.as_deref()) {
            (Some(id), Some(name)) => write!(f, "id={} name='{}'", id, name),
            (Some(id), None) => write!(f, "id={}", id),
            (None, Some(name)) => write!(f, "name='{}'", name),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_prefers_id_over_name() {
        let sel = Selector {
            id: Some(7),
            name: Some("Other".to_string()),
        };
        assert!(sel.matches(7, "Default"));
        assert!(!sel.matches(8, "Other"));
    }

    #[test]
    fn selector_by_name() {
        let sel = Selector::by_name("Default");
        assert!(sel.matches(3, "Default"));
        assert!(!sel.matches(3, "default"));
        assert!(!Selector::default().matches(0, ""));
        assert!(Selector::by_name("").is_empty());
    }

    #[test]
    fn file_words() {
        assert_eq!(EntityKind::Run.file_word(), "run");
        assert_eq!(EntityKind::Workset.file_word(), "set");
        assert_eq!(EntityKind::Task.file_word(), "task");
    }
}
