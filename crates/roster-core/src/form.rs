//! In-progress form state shared by the registration and edit flows.

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::error::{FieldError, Result};
use crate::model::{NewStudent, StudentPatch, StudentRecord};
use crate::validation::{evaluate, into_result, FieldSource, SECTION_RULE, STUDENT_RULES};

/// Editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Given name.
    FirstName,
    /// Family name.
    LastName,
    /// Email address.
    Email,
    /// External student identifier.
    StudentId,
    /// Phone number.
    ContactNumber,
    /// Course id.
    Course,
    /// Section label.
    Section,
}

impl FormField {
    /// Wire (camelCase) name of the field.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::StudentId => "studentId",
            Self::ContactNumber => "contactNumber",
            Self::Course => "course",
            Self::Section => "section",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Raw form values as typed by the admin. Empty means "not filled in".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// External student identifier.
    pub student_id: String,
    /// Phone number.
    pub contact_number: String,
    /// Course id.
    pub course: String,
    /// Section label.
    pub section: String,
}

impl StudentForm {
    /// Seeds a form from an existing record.
    #[must_use]
    pub fn from_record(record: &StudentRecord) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            student_id: record.student_id.clone(),
            contact_number: record.contact_number.clone(),
            course: record.course.clone(),
            section: record.section.clone(),
        }
    }

    /// Current value of `field`.
    #[must_use]
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
            FormField::StudentId => &self.student_id,
            FormField::ContactNumber => &self.contact_number,
            FormField::Course => &self.course,
            FormField::Section => &self.section,
        }
    }

    /// Replaces the value of `field`.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Email => &mut self.email,
            FormField::StudentId => &mut self.student_id,
            FormField::ContactNumber => &mut self.contact_number,
            FormField::Course => &mut self.course,
            FormField::Section => &mut self.section,
        };
        *slot = value.into();
    }

    /// Returns `true` if every field is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Checks the registration form. The section is derived, not typed, so
    /// it is not checked here.
    pub fn validate_registration(&self) -> Result<()> {
        into_result(evaluate(STUDENT_RULES, self))
    }

    /// Checks the edit form, including that the section belongs to the
    /// selected course.
    pub fn validate_edit(&self, catalog: &Catalog) -> Result<()> {
        let mut errors = evaluate(
            STUDENT_RULES.iter().chain(std::iter::once(&SECTION_RULE)),
            self,
        );

        let section_reported = errors.iter().any(|e| e.field == SECTION_RULE.field);
        if !section_reported
            && !self.course.is_empty()
            && !catalog.sections_for(&self.course).contains(&self.section)
        {
            errors.push(FieldError::new(
                SECTION_RULE.field,
                format!(
                    "Section '{}' is not offered for {}",
                    self.section,
                    catalog.course_name(&self.course)
                ),
            ));
        }

        into_result(errors)
    }

    /// Builds creation input with the derived section and timestamp.
    #[must_use]
    pub fn to_new_student(&self, section: &str, registration_date: DateTime<Utc>) -> NewStudent {
        NewStudent {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            student_id: self.student_id.clone(),
            contact_number: self.contact_number.clone(),
            course: self.course.clone(),
            section: section.to_string(),
            registration_date,
        }
    }

    /// Builds a patch carrying every form field.
    #[must_use]
    pub fn to_patch(&self) -> StudentPatch {
        StudentPatch {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            email: Some(self.email.clone()),
            student_id: Some(self.student_id.clone()),
            contact_number: Some(self.contact_number.clone()),
            course: Some(self.course.clone()),
            section: Some(self.section.clone()),
        }
    }
}

impl FieldSource for StudentForm {
    fn field(&self, field: &str) -> Option<&str> {
        let field = match field {
            "firstName" => FormField::FirstName,
            "lastName" => FormField::LastName,
            "email" => FormField::Email,
            "studentId" => FormField::StudentId,
            "contactNumber" => FormField::ContactNumber,
            "course" => FormField::Course,
            "section" => FormField::Section,
            _ => return None,
        };
        Some(self.get(field))
    }
}
