//! Student record types.
//!
//! Wire names are camelCase to stay compatible with the admin front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// StudentRecord
// ============================================================================

/// A stored student enrollment record.
///
/// `id` is assigned by the store and `registration_date` is fixed at creation;
/// neither is ever changed by an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Store-assigned identity.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// External student identifier. Not unique.
    pub student_id: String,
    /// Phone number, digits only.
    pub contact_number: String,
    /// Catalog course id.
    pub course: String,
    /// Section label within `course`.
    pub section: String,
    /// When the student was registered.
    pub registration_date: DateTime<Utc>,
}

impl StudentRecord {
    /// Builds a stored record from creation input and a store-assigned id.
    #[must_use]
    pub fn from_new(id: impl Into<String>, new: NewStudent) -> Self {
        Self {
            id: id.into(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            student_id: new.student_id,
            contact_number: new.contact_number,
            course: new.course,
            section: new.section,
            registration_date: new.registration_date,
        }
    }

    /// Full display name, `"First Last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns `true` if `needle` (already lowercased) occurs in any of the
    /// searchable fields.
    ///
    /// Searchable fields are first name, last name, student id, email, course
    /// id and section.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.student_id,
            &self.email,
            &self.course,
            &self.section,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

// ============================================================================
// NewStudent
// ============================================================================

/// Creation input: a `StudentRecord` without its `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// External student identifier.
    pub student_id: String,
    /// Phone number, digits only.
    pub contact_number: String,
    /// Catalog course id.
    pub course: String,
    /// Section label within `course`.
    pub section: String,
    /// When the student was registered.
    pub registration_date: DateTime<Utc>,
}

// ============================================================================
// StudentPatch
// ============================================================================

/// A partial record merged field-by-field into an existing record.
///
/// Has no `id` or `registration_date` field. Unknown fields in a request body
/// are ignored, so neither can be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    /// New given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New external student identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    /// New phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    /// New course id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    /// New section label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl StudentPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.student_id.is_none()
            && self.contact_number.is_none()
            && self.course.is_none()
            && self.section.is_none()
    }

    /// Overlays this patch onto `record`, returning the merged record.
    #[must_use]
    pub fn apply(&self, record: &StudentRecord) -> StudentRecord {
        let pick = |patched: &Option<String>, current: &String| {
            patched.clone().unwrap_or_else(|| current.clone())
        };

        StudentRecord {
            id: record.id.clone(),
            first_name: pick(&self.first_name, &record.first_name),
            last_name: pick(&self.last_name, &record.last_name),
            email: pick(&self.email, &record.email),
            student_id: pick(&self.student_id, &record.student_id),
            contact_number: pick(&self.contact_number, &record.contact_number),
            course: pick(&self.course, &record.course),
            section: pick(&self.section, &record.section),
            registration_date: record.registration_date,
        }
    }
}

// ============================================================================
// Course
// ============================================================================

/// A catalog course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Stable key, e.g. `bsit`.
    pub id: String,
    /// Display label.
    pub name: String,
}

impl Course {
    /// Creates a new `Course`.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
