//! Management Flow: list, search, edit and delete student records.
//!
//! The flow keeps a local copy of the last successfully loaded records and
//! reconciles it with store responses. Local state only changes after the
//! store confirms an update or delete.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::FieldError;
use crate::form::{FormField, StudentForm};
use crate::model::StudentRecord;
use crate::notify::{Notification, Notifications};
use crate::store::StudentStore;

/// Shown when a load fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load students";
/// Shown after a successful edit.
pub const UPDATED_MESSAGE: &str = "Student updated successfully";
/// Shown when the store rejects an edit.
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update student";
/// Shown after a successful delete.
pub const DELETED_MESSAGE: &str = "Student deleted successfully";
/// Shown when the store rejects a delete.
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete student";
/// Empty-table message when a search hides every record.
pub const NO_MATCHES_MESSAGE: &str = "No students match your search";
/// Empty-table message when there are no records at all.
pub const NO_RECORDS_MESSAGE: &str = "No students registered yet";

// ============================================================================
// ViewStatus
// ============================================================================

/// Load state of the record list.
///
/// The status transitions through these states:
/// - `Loading` -> `Loaded` when the store answers
/// - `Loading` -> `Failed` when it does not
/// - `Loaded` or `Failed` -> `Loading` on refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    /// A load is in progress (initial state).
    #[default]
    Loading,
    /// The last load succeeded.
    Loaded,
    /// The last load failed; a refresh retries it.
    Failed,
}

impl ViewStatus {
    /// Returns `true` once a load attempt has settled.
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_core::ViewStatus;
    ///
    /// assert!(ViewStatus::Loaded.is_settled());
    /// assert!(ViewStatus::Failed.is_settled());
    /// assert!(!ViewStatus::Loading.is_settled());
    /// ```
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

// ============================================================================
// EditSession
// ============================================================================

/// An open editor for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    id: String,
    form: StudentForm,
    errors: Vec<FieldError>,
}

impl EditSession {
    fn new(record: &StudentRecord) -> Self {
        Self {
            id: record.id.clone(),
            form: StudentForm::from_record(record),
            errors: Vec::new(),
        }
    }

    /// Id of the record being edited.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current form values.
    #[must_use]
    pub const fn form(&self) -> &StudentForm {
        &self.form
    }

    /// Field errors from the last save attempt.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Sets a field. Changing the course clears the section.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        match field {
            FormField::Course => self.set_course(value),
            _ => self.form.set(field, value),
        }
    }

    /// Switches course and clears the now-stale section.
    pub fn set_course(&mut self, course: impl Into<String>) {
        let course = course.into();
        if course != self.form.course {
            self.form.section.clear();
        }
        self.form.course = course;
    }
}

// ============================================================================
// ManagementFlow
// ============================================================================

/// Drives the student table against a store.
#[derive(Debug)]
pub struct ManagementFlow<S> {
    store: S,
    catalog: Catalog,
    status: ViewStatus,
    records: Vec<StudentRecord>,
    has_loaded: bool,
    query: String,
    edit: Option<EditSession>,
    pending_delete: Option<String>,
    notifications: Notifications,
}

impl<S: StudentStore> ManagementFlow<S> {
    /// Creates a flow in the `Loading` state with no records.
    pub fn new(store: S, catalog: Catalog) -> Self {
        Self {
            store,
            catalog,
            status: ViewStatus::Loading,
            records: Vec::new(),
            has_loaded: false,
            query: String::new(),
            edit: None,
            pending_delete: None,
            notifications: Notifications::default(),
        }
    }

    /// Current load status.
    pub const fn status(&self) -> ViewStatus {
        self.status
    }

    /// The last successfully loaded records, in store order.
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    /// Loads the record list from the store.
    ///
    /// On failure the previously loaded records stay visible.
    pub async fn load(&mut self) {
        self.status = ViewStatus::Loading;
        match self.store.list_records().await {
            Ok(records) => {
                debug!(count = records.len(), "Loaded students");
                self.records = records;
                self.has_loaded = true;
                self.status = ViewStatus::Loaded;
            }
            Err(err) => {
                warn!(error = %err, "Failed to load students");
                self.status = ViewStatus::Failed;
                self.notifications.push(Notification::error(LOAD_FAILED_MESSAGE));
            }
        }
    }

    /// Reloads the record list. Same as [`load`](Self::load).
    pub async fn refresh(&mut self) {
        self.load().await;
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Sets the free-text search query.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The current search query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Records matching the query, in store order.
    ///
    /// A blank query shows everything. Any other query is matched as typed,
    /// surrounding whitespace included.
    pub fn visible(&self) -> Vec<&StudentRecord> {
        if self.query.trim().is_empty() {
            return self.records.iter().collect();
        }
        let needle = self.query.to_lowercase();
        self.records.iter().filter(|r| r.matches(&needle)).collect()
    }

    /// Message for an empty table, or `None` if something is visible.
    ///
    /// Until a load succeeds the record count is unknown, so this is `None`
    /// while loading and the load-failure text after a failure.
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.has_loaded {
            return (self.status == ViewStatus::Failed).then_some(LOAD_FAILED_MESSAGE);
        }
        if self.records.is_empty() {
            Some(NO_RECORDS_MESSAGE)
        } else if self.visible().is_empty() {
            Some(NO_MATCHES_MESSAGE)
        } else {
            None
        }
    }

    /// Display name for a course id.
    pub fn course_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.catalog.course_name(id)
    }

    // ------------------------------------------------------------------------
    // Edit
    // ------------------------------------------------------------------------

    /// Opens an editor seeded from the local copy of record `id`.
    ///
    /// Returns `false` if no such record is loaded.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(record) = self.records.iter().find(|r| r.id == id) else {
            return false;
        };
        self.edit = Some(EditSession::new(record));
        true
    }

    /// The open editor, if any.
    pub const fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Mutable access to the open editor.
    pub fn edit_session_mut(&mut self) -> Option<&mut EditSession> {
        self.edit.as_mut()
    }

    /// Sections offered for the course currently selected in the editor.
    pub fn available_sections(&self) -> &[String] {
        self.edit
            .as_ref()
            .map(|session| self.catalog.sections_for(&session.form.course))
            .unwrap_or_default()
    }

    /// Validates and saves the open editor.
    ///
    /// On success the local record is replaced by id, the editor closes and
    /// the updated record is returned. Otherwise the editor stays open.
    pub async fn save_edit(&mut self) -> Option<StudentRecord> {
        let session = self.edit.as_mut()?;

        if let Err(err) = session.form.validate_edit(&self.catalog) {
            session.errors = err.field_errors().map(<[_]>::to_vec).unwrap_or_default();
            return None;
        }
        session.errors.clear();

        let id = session.id.clone();
        let patch = session.form.to_patch();
        match self.store.update_record(&id, patch).await {
            Ok(updated) => {
                info!(id = %updated.id, "Student updated");
                if let Some(slot) = self.records.iter_mut().find(|r| r.id == updated.id) {
                    slot.clone_from(&updated);
                }
                self.edit = None;
                self.notifications.push(Notification::success(UPDATED_MESSAGE));
                Some(updated)
            }
            Err(err) => {
                warn!(id = %id, error = %err, "Update failed");
                self.notifications
                    .push(Notification::error(UPDATE_FAILED_MESSAGE));
                None
            }
        }
    }

    /// Closes the editor without saving.
    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    // ------------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------------

    /// Asks for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: impl Into<String>) {
        self.pending_delete = Some(id.into());
    }

    /// Id awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Drops the pending delete.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the pending id. Returns `true` if the store confirmed.
    ///
    /// Does nothing when no delete was requested.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.pending_delete.take() else {
            return false;
        };

        match self.store.delete_record(&id).await {
            Ok(()) => {
                info!(id = %id, "Student deleted");
                self.records.retain(|r| r.id != id);
                self.notifications.push(Notification::success(DELETED_MESSAGE));
                true
            }
            Err(err) => {
                warn!(id = %id, error = %err, "Delete failed");
                self.notifications
                    .push(Notification::error(DELETE_FAILED_MESSAGE));
                false
            }
        }
    }

    /// Removes and returns pending notifications.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }
}
