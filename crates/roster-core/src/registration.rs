//! Registration Flow: validate a new-student form, derive a section and
//! create the record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::assigner::SectionAssigner;
use crate::catalog::Catalog;
use crate::error::{FieldError, RosterError};
use crate::form::{FormField, StudentForm};
use crate::model::StudentRecord;
use crate::notify::{Notification, Notifications};
use crate::store::StudentStore;

/// Shown when the selected course offers no sections.
pub const NO_SECTION_MESSAGE: &str = "No section available for the selected course";

/// Shown after a successful registration.
pub const REGISTERED_MESSAGE: &str = "Student registered successfully!";

/// Shown when the store rejects a registration.
pub const REGISTER_FAILED_MESSAGE: &str = "Failed to register student";

/// Result of a submit attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The record was created; the form has been reset.
    Registered(StudentRecord),
    /// Field constraints failed; the store was not called.
    Invalid(Vec<FieldError>),
    /// The course has no sections; the store was not called.
    NoSection,
    /// The store rejected the create; the form is kept for a retry.
    Failed(RosterError),
}

impl SubmitOutcome {
    /// Returns the created record, if any.
    #[must_use]
    pub const fn record(&self) -> Option<&StudentRecord> {
        match self {
            Self::Registered(record) => Some(record),
            _ => None,
        }
    }
}

/// Drives one registration form against a store.
pub struct RegistrationFlow<S> {
    store: S,
    catalog: Catalog,
    assigner: Box<dyn SectionAssigner + Send>,
    form: StudentForm,
    // Sections already drawn for this form, by course id.
    assigned: HashMap<String, String>,
    notifications: Notifications,
}

impl<S> std::fmt::Debug for RegistrationFlow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationFlow")
            .field("form", &self.form)
            .field("assigned", &self.assigned)
            .finish_non_exhaustive()
    }
}

impl<S: StudentStore> RegistrationFlow<S> {
    /// Creates a flow with an empty form.
    pub fn new(store: S, catalog: Catalog, assigner: Box<dyn SectionAssigner + Send>) -> Self {
        Self {
            store,
            catalog,
            assigner,
            form: StudentForm::default(),
            assigned: HashMap::new(),
            notifications: Notifications::default(),
        }
    }

    /// The current form values.
    pub const fn form(&self) -> &StudentForm {
        &self.form
    }

    /// The section derived for the selected course, if any.
    pub fn section(&self) -> Option<&str> {
        self.assigned.get(&self.form.course).map(String::as_str)
    }

    /// Sets a form field. Setting the course goes through
    /// [`select_course`](Self::select_course).
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        match field {
            FormField::Course => self.select_course(value),
            // Sections are derived, never typed.
            FormField::Section => {}
            _ => self.form.set(field, value),
        }
    }

    /// Selects a course and derives a section for it right away.
    ///
    /// The assigner is asked at most once per course for each form, so
    /// switching courses back and forth keeps the first pick.
    pub fn select_course(&mut self, course: impl Into<String>) {
        self.form.course = course.into();
        self.derive_section();
    }

    fn derive_section(&mut self) -> Option<String> {
        let course = &self.form.course;
        if course.is_empty() {
            return None;
        }
        if let Some(section) = self.assigned.get(course) {
            return Some(section.clone());
        }
        let section = self.assigner.assign(course, self.catalog.sections_for(course))?;
        self.assigned.insert(course.clone(), section.clone());
        Some(section)
    }

    /// Validates and submits the form, stamping the record with `now`.
    pub async fn submit(&mut self, now: DateTime<Utc>) -> SubmitOutcome {
        if let Err(err) = self.form.validate_registration() {
            let errors = err.field_errors().map(<[_]>::to_vec).unwrap_or_default();
            return SubmitOutcome::Invalid(errors);
        }

        let Some(section) = self.derive_section() else {
            warn!(course = %self.form.course, "No section available");
            self.notifications.push(Notification::error(NO_SECTION_MESSAGE));
            return SubmitOutcome::NoSection;
        };

        let new = self.form.to_new_student(&section, now);
        match self.store.create_record(new).await {
            Ok(record) => {
                info!(id = %record.id, course = %record.course, section = %record.section, "Student registered");
                self.form = StudentForm::default();
                self.assigned.clear();
                self.notifications
                    .push(Notification::success(REGISTERED_MESSAGE));
                SubmitOutcome::Registered(record)
            }
            Err(err) => {
                warn!(error = %err, "Registration failed");
                self.notifications
                    .push(Notification::error(REGISTER_FAILED_MESSAGE));
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Removes and returns pending notifications.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }
}
