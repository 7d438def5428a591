//! mc-core: stable foundation for modelcopy.
//!
//! Contains:
//! - error (shared error types)
//! - ids (entity kinds, locators and selectors for runs/worksets/tasks)
//! - numeric (printf-style float rendering + value parsing)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{McError, McResult};
pub use ids::*;
pub use numeric::*;

/// Literal written wherever the relational model holds NULL.
///
/// Distinct from the empty string, which is a valid value on its own.
pub const NULL_MARKER: &str = "NULL";

/// Text that would read back as [`NULL_MARKER`] gets one extra leading
/// backslash: `NULL` is written as `\NULL`, `\NULL` as `\\NULL`.
pub fn escape_null_text(v: &str) -> std::borrow::Cow<'_, str> {
    if v.trim_start_matches('\\') == NULL_MARKER {
        format!("\\{}", v).into()
    } else {
        v.into()
    }
}

/// Inverse of [`escape_null_text`]; the bare marker is absent text.
pub fn unescape_null_text(v: &str) -> Option<&str> {
    if v == NULL_MARKER {
        return None;
    }
    match v.strip_prefix('\\') {
        Some(rest) if rest.trim_start_matches('\\') == NULL_MARKER => Some(rest),
        _ => Some(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_text_escaping() {
        assert_eq!(escape_null_text("NULL"), "\\NULL");
        assert_eq!(escape_null_text("\\NULL"), "\\\\NULL");
        assert_eq!(escape_null_text("\\x"), "\\x");
        assert_eq!(escape_null_text("null"), "null");
        for v in ["NULL", "\\NULL", "\\\\NULL", "", "\\", "NULLS", "\\x"] {
            assert_eq!(unescape_null_text(&escape_null_text(v)), Some(v));
        }
        assert_eq!(unescape_null_text("NULL"), None);
    }
}
