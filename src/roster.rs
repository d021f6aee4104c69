//! Subjects and the roster they are selected from.
//!
//! A roster is a JSON array of member records. Only the four attributes
//! that seed a layout are kept; descriptive fields (`about`, `facts`, ...)
//! are ignored on load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The entity whose attributes seed a visualization.
///
/// Missing attributes deserialize as empty strings. That is accepted so a
/// sparse roster still renders, but subjects that share empty fields will
/// cluster onto identical seeds; see [`Subject::is_complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub since: String,
    #[serde(default)]
    pub area: String,
}

impl Subject {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        since: impl Into<String>,
        area: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            since: since.into(),
            area: area.into(),
        }
    }

    /// Whether all four seeding attributes are non-empty.
    pub fn is_complete(&self) -> bool {
        [&self.id, &self.name, &self.since, &self.area]
            .iter()
            .all(|field| !field.is_empty())
    }

    /// Attribute used as the position seed source for point `index`.
    pub(crate) fn seed_source(&self, index: usize) -> &str {
        match index % 4 {
            0 => &self.id,
            1 => &self.name,
            2 => &self.since,
            _ => &self.area,
        }
    }
}

/// An ordered list of subjects with a current selection.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Subject>,
    current: usize,
}

impl Roster {
    pub fn new(members: Vec<Subject>) -> Self {
        Self {
            members,
            current: 0,
        }
    }

    /// Parse a roster from a JSON array of member records.
    pub fn from_json(json: &str) -> Result<Self> {
        let members: Vec<Subject> =
            serde_json::from_str(json).context("roster must be a JSON array of members")?;
        Ok(Self::new(members))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read roster {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("failed to parse roster {}", path.display()))
    }

    pub fn members(&self) -> &[Subject] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Subject> {
        self.members.get(index)
    }

    /// The currently selected subject, if the roster is non-empty.
    pub fn current(&self) -> Option<&Subject> {
        self.members.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Move the selection to `index`. Out-of-range indices leave the
    /// selection unchanged and return `None`.
    pub fn select(&mut self, index: usize) -> Option<&Subject> {
        if index >= self.members.len() {
            return None;
        }
        self.current = index;
        self.members.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMBERS: &str = r#"[
        {"id": "00000043", "name": "Test", "since": "2022", "area": "Sound",
         "about": "ignored", "cultural": "ignored", "facts": "ignored"},
        {"id": "00000044", "name": "Other", "since": "2023", "area": "Image"},
        {"id": "00000045", "name": "Sparse"}
    ]"#;

    #[test]
    fn test_from_json_ignores_extra_fields() {
        let roster = Roster::from_json(MEMBERS).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(
            roster.get(0),
            Some(&Subject::new("00000043", "Test", "2022", "Sound"))
        );
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let roster = Roster::from_json(MEMBERS).unwrap();
        let sparse = roster.get(2).unwrap();
        assert_eq!(sparse.since, "");
        assert_eq!(sparse.area, "");
        assert!(!sparse.is_complete());
        assert!(roster.get(0).unwrap().is_complete());
    }

    #[test]
    fn test_select_moves_cursor() {
        let mut roster = Roster::from_json(MEMBERS).unwrap();
        assert_eq!(roster.current().map(|s| s.name.as_str()), Some("Test"));

        assert_eq!(roster.select(1).map(|s| s.name.as_str()), Some("Other"));
        assert_eq!(roster.current_index(), 1);

        assert!(roster.select(7).is_none());
        assert_eq!(roster.current_index(), 1);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(Roster::from_json(r#"{"id": "x"}"#).is_err());
    }

    #[test]
    fn test_seed_source_cycles_attributes() {
        let subject = Subject::new("i", "n", "s", "a");
        let sources: Vec<&str> = (0..6).map(|i| subject.seed_source(i)).collect();
        assert_eq!(sources, ["i", "n", "s", "a", "i", "n"]);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.json");
        fs::write(&path, MEMBERS).unwrap();

        let roster = Roster::load(&path).unwrap();
        assert_eq!(roster.len(), 3);
        assert!(Roster::load(&dir.path().join("missing.json")).is_err());
    }
}
