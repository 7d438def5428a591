//! mc-paths: file and directory names for runs, worksets and tasks.
//!
//! Export computes collision-free slugs for a whole scope at once; import
//! resolves a partially known entity back to its files by exact name, then
//! by pattern search.

pub mod error;
pub mod layout;
pub mod resolve;
pub mod slug;

pub use error::{PathError, PathResult};
pub use layout::*;
pub use resolve::{EntryKind, EntryPattern, Found, list_entries, resolve_entity};
pub use slug::{NamePolicy, SlugPlan, clean_name, slug};
