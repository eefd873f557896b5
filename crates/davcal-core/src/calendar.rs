//! Calendar collections.

use serde::{Deserialize, Serialize};

/// A calendar collection as reported by the server.
///
/// This is a snapshot built from a PROPFIND response; the client never
/// mutates it. Properties the server did not return are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Short name of the collection.
    pub name: String,
    /// Human-readable name (`DAV:displayname`).
    pub display_name: String,
    /// Free-text description (`calendar-description`).
    pub description: String,
    /// Collection path (the response's own `href`).
    pub url: String,
    /// Display color, usually `#RRGGBB`.
    pub color: String,
    /// Whether the collection is read-only for this user.
    pub read_only: bool,
    /// Whole-collection validator.
    pub etag: String,
    /// Change counter, bumped whenever any child resource changes.
    pub ctag: String,
}

impl Calendar {
    /// Creates a calendar snapshot for the given collection path.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Returns the display name, falling back to the collection path.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.url
        } else {
            &self.display_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let cal = Calendar::default();
        assert!(cal.name.is_empty());
        assert!(cal.display_name.is_empty());
        assert!(cal.url.is_empty());
        assert!(cal.ctag.is_empty());
        assert!(!cal.read_only);
    }

    #[test]
    fn label_falls_back_to_url() {
        let mut cal = Calendar::new("/calendars/user/work/");
        assert_eq!(cal.label(), "/calendars/user/work/");

        cal.display_name = "Work".to_string();
        assert_eq!(cal.label(), "Work");
    }
}
