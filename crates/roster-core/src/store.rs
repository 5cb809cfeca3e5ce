//! The record store contract and its in-memory implementation.
//!
//! [`MemoryStore`] is the authoritative holder of student records for the
//! process lifetime. It is a cheap-clone handle: every clone sees the same
//! records, and each operation performs its whole read-modify-write under a
//! single lock acquisition.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, RosterError};
use crate::model::{NewStudent, StudentPatch, StudentRecord};

/// Characters used for generated record ids.
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of generated record ids.
const ID_LEN: usize = 7;

// ============================================================================
// StudentStore
// ============================================================================

/// Asynchronous access to student records.
///
/// Implemented by [`MemoryStore`] in-process and by
/// [`HttpStore`](crate::client::HttpStore) against a running server, so both
/// flows work the same way over either.
pub trait StudentStore: Send + Sync {
    /// Returns every record, in insertion order.
    fn list_records(&self) -> impl Future<Output = Result<Vec<StudentRecord>>> + Send;

    /// Stores a new record under a freshly generated id and returns it.
    fn create_record(
        &self,
        new: NewStudent,
    ) -> impl Future<Output = Result<StudentRecord>> + Send;

    /// Overlays `patch` onto the record with `id` and returns the result.
    ///
    /// Fails with [`RosterError::NotFound`] if no such record exists.
    fn update_record(
        &self,
        id: &str,
        patch: StudentPatch,
    ) -> impl Future<Output = Result<StudentRecord>> + Send;

    /// Removes the record with `id`. Removing a missing id is a no-op.
    fn delete_record(&self, id: &str) -> impl Future<Output = Result<()>> + Send;
}

// ============================================================================
// FaultInjector
// ============================================================================

/// Makes upcoming store operations fail with [`RosterError::Transient`].
///
/// Shared between clones of the owning store.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    remaining: Arc<AtomicU32>,
}

impl FaultInjector {
    /// Fails the next `count` operations, replacing any pending count.
    pub fn fail_next(&self, count: u32) {
        self.remaining.store(count, Ordering::SeqCst);
    }

    /// Number of operations that will still fail.
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Consumes one pending failure, returning `true` if there was one.
    fn trip(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    records: Vec<StudentRecord>,
    /// Every id ever handed out, so deleted ids are not reissued.
    issued: HashSet<String>,
}

/// In-memory record store with optional simulated latency.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    latency: Duration,
    faults: FaultInjector,
}

impl MemoryStore {
    /// Creates an empty store with no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`, in order.
    #[must_use]
    pub fn with_records(records: Vec<StudentRecord>) -> Self {
        let issued = records.iter().map(|r| r.id.clone()).collect();
        Self {
            inner: Arc::new(Mutex::new(Inner { records, issued })),
            ..Self::default()
        }
    }

    /// Creates a store holding the three demo students.
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_records(demo_records())
    }

    /// Sets the artificial delay applied before every operation.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle for injecting transient failures.
    #[must_use]
    pub const fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Applies latency and any injected failure for `operation`.
    async fn simulate(&self, operation: &'static str) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.faults.trip() {
            warn!(operation, "Injected transient store failure");
            return Err(RosterError::transient(format!(
                "injected failure during {operation}"
            )));
        }
        Ok(())
    }
}

impl StudentStore for MemoryStore {
    async fn list_records(&self) -> Result<Vec<StudentRecord>> {
        self.simulate("list").await?;
        let inner = self.inner.lock().await;
        debug!(count = inner.records.len(), "Listed records");
        Ok(inner.records.clone())
    }

    async fn create_record(&self, new: NewStudent) -> Result<StudentRecord> {
        self.simulate("create").await?;
        let mut inner = self.inner.lock().await;

        let id = generate_id(&inner.issued);
        inner.issued.insert(id.clone());
        let record = StudentRecord::from_new(id, new);
        inner.records.push(record.clone());

        debug!(id = %record.id, course = %record.course, section = %record.section, "Created record");
        Ok(record)
    }

    async fn update_record(&self, id: &str, patch: StudentPatch) -> Result<StudentRecord> {
        self.simulate("update").await?;
        let mut inner = self.inner.lock().await;

        let Some(slot) = inner.records.iter_mut().find(|r| r.id == id) else {
            debug!(id, "Update target not found");
            return Err(RosterError::not_found(id));
        };
        let updated = patch.apply(slot);
        slot.clone_from(&updated);

        debug!(id, "Updated record");
        Ok(updated)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.simulate("delete").await?;
        let mut inner = self.inner.lock().await;

        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);

        debug!(id, removed = before - inner.records.len(), "Deleted record");
        Ok(())
    }
}

/// Draws random base-36 ids until one has never been issued.
fn generate_id(issued: &HashSet<String>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let candidate: String = (0..ID_LEN)
            .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
            .collect();
        if !issued.contains(&candidate) {
            return candidate;
        }
    }
}

fn demo_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The demo students the admin app starts with.
#[must_use]
pub fn demo_records() -> Vec<StudentRecord> {
    vec![
        StudentRecord {
            id: "1".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            student_id: "ST001".to_string(),
            contact_number: "09123456789".to_string(),
            course: "bsit".to_string(),
            section: "BSIT-1A".to_string(),
            registration_date: demo_date(2023, 6, 15),
        },
        StudentRecord {
            id: "2".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            email: "jane.smith@example.com".to_string(),
            student_id: "ST002".to_string(),
            contact_number: "09234567890".to_string(),
            course: "bscs".to_string(),
            section: "BSCS-1A".to_string(),
            registration_date: demo_date(2023, 7, 12),
        },
        StudentRecord {
            id: "3".to_string(),
            first_name: "Robert".to_string(),
            last_name: "Johnson".to_string(),
            email: "robert.johnson@example.com".to_string(),
            student_id: "ST003".to_string(),
            contact_number: "09345678901".to_string(),
            course: "bsit".to_string(),
            section: "BSIT-2A".to_string(),
            registration_date: demo_date(2023, 8, 22),
        },
    ]
}
