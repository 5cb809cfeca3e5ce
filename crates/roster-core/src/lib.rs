//! Roster core
//!
//! Student enrollment records: the record store, course catalog, the
//! registration and management flows, and the HTTP API that serves them.

pub mod api;
pub mod assigner;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod management;
pub mod model;
pub mod notify;
pub mod registration;
pub mod store;
pub mod validation;

pub use api::{create_router, AppState, ErrorResponse};
pub use assigner::{RandomAssigner, RoundRobinAssigner, SectionAssigner, SectionStrategy};
pub use catalog::{Catalog, CatalogEntry};
pub use client::HttpStore;
pub use config::Config;
pub use error::{FieldError, Result, RosterError};
pub use form::{FormField, StudentForm};
pub use management::{EditSession, ManagementFlow, ViewStatus};
pub use model::{Course, NewStudent, StudentPatch, StudentRecord};
pub use notify::{Notification, NotificationKind};
pub use registration::{RegistrationFlow, SubmitOutcome};
pub use store::{demo_records, FaultInjector, MemoryStore, StudentStore};
