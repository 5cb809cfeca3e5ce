//! Static course and section catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Course;

/// Built-in courses and their sections, in display order.
const BUILTIN: &[(&str, &str, &[&str])] = &[
    (
        "bsit",
        "BS Information Technology",
        &["BSIT-1A", "BSIT-1B", "BSIT-2A", "BSIT-2B"],
    ),
    (
        "bscs",
        "BS Computer Science",
        &["BSCS-1A", "BSCS-1B", "BSCS-2A"],
    ),
    ("bsis", "BS Information Systems", &["BSIS-1A", "BSIS-1B"]),
    (
        "bsece",
        "BS Electronics Engineering",
        &["BSECE-1A", "BSECE-2A"],
    ),
    ("bsme", "BS Mechanical Engineering", &["BSME-1A", "BSME-2A"]),
    ("bsce", "BS Civil Engineering", &["BSCE-1A", "BSCE-2A"]),
];

/// A course together with its ordered section labels.
///
/// This is the shape used both in `roster.json` and in `GET /api/courses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Course id.
    pub id: String,
    /// Course display name.
    pub name: String,
    /// Section labels, in order.
    #[serde(default)]
    pub sections: Vec<String>,
}

/// Read-only lookup from course id to display name and sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    courses: Vec<Course>,
    sections: HashMap<String, Vec<String>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The catalog shipped with the admin app.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN.iter().map(|(id, name, sections)| CatalogEntry {
            id: (*id).to_string(),
            name: (*name).to_string(),
            sections: sections.iter().map(|s| (*s).to_string()).collect(),
        });
        Self::from_entries(entries)
    }

    /// Builds a catalog from configured entries. Later duplicates of a course
    /// id are ignored.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut courses = Vec::new();
        let mut sections = HashMap::new();

        for entry in entries {
            if sections.contains_key(&entry.id) {
                continue;
            }
            courses.push(Course::new(entry.id.clone(), entry.name));
            sections.insert(entry.id, entry.sections);
        }

        Self { courses, sections }
    }

    /// All courses in display order.
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Looks up a course by id.
    #[must_use]
    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Returns `true` if `id` is a known course.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sections.contains_key(id)
    }

    /// Display name for a course, or the id itself when unknown.
    #[must_use]
    pub fn course_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.course(id).map_or(id, |c| c.name.as_str())
    }

    /// Ordered sections for a course; empty for unknown ids.
    #[must_use]
    pub fn sections_for(&self, id: &str) -> &[String] {
        self.sections.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The catalog as a list of entries, in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.courses
            .iter()
            .map(|c| CatalogEntry {
                id: c.id.clone(),
                name: c.name.clone(),
                sections: self.sections_for(&c.id).to_vec(),
            })
            .collect()
    }
}
