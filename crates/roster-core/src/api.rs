//! HTTP API for the student record store.
//!
//! # Endpoints
//!
//! - `GET /students` - List every record
//! - `POST /students` - Create a record
//! - `PATCH /students/:id` - Patch a record
//! - `DELETE /students/:id` - Delete a record (idempotent)
//! - `GET /api/courses` - The course catalog
//! - `GET /api/health` - Liveness probe
//!
//! # Example
//!
//! ```no_run
//! use roster_core::{create_router, AppState, Config, MemoryStore};
//!
//! # async fn example() {
//! let state = AppState::new(&Config::default(), MemoryStore::seeded());
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::Config;
use crate::error::{FieldError, RosterError};
use crate::model::{NewStudent, StudentPatch, StudentRecord};
use crate::store::{MemoryStore, StudentStore};
use crate::validation::{validate_new_student, validate_patch};

// ============================================================================
// Response Types
// ============================================================================

/// Error response body returned on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
    /// Field-level failures, for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The authoritative record store.
    pub store: MemoryStore,
    /// Catalog used to check course and section on create.
    pub catalog: Arc<Catalog>,
}

impl AppState {
    /// Creates state around `store`, taking the catalog from `config`.
    #[must_use]
    pub fn new(config: &Config, store: MemoryStore) -> Self {
        Self {
            store,
            catalog: Arc::new(config.catalog()),
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request body could not be read as the expected shape.
    BadBody(StatusCode, String),
    /// A store or validation failure.
    Roster(RosterError),
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        Self::Roster(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadBody(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match self {
            Self::BadBody(status, message) => (status, message, None),
            Self::Roster(err) => {
                let status = match &err {
                    RosterError::Validation { .. } | RosterError::NoSectionAvailable { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    RosterError::NotFound { .. } => StatusCode::NOT_FOUND,
                    RosterError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let fields = err.field_errors().map(<[_]>::to_vec);
                (status, err.to_string(), fields)
            }
        };

        let body = Json(ErrorResponse { error, fields });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// Record routes live at the root; the catalog and health check live under
/// `/api`. Every route gets request tracing and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/courses", get(handle_courses))
        .route("/health", get(handle_health));

    Router::new()
        .route("/students", get(handle_list).post(handle_create))
        .route("/students/:id", patch(handle_update).delete(handle_delete))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /students`.
async fn handle_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StudentRecord>>, ApiError> {
    let records = state.store.list_records().await?;
    info!(count = records.len(), "Listed students");
    Ok(Json(records))
}

/// Handler for `POST /students`.
///
/// Checks field shapes, then that the course exists and offers the section.
async fn handle_create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewStudent>, JsonRejection>,
) -> Result<(StatusCode, Json<StudentRecord>), ApiError> {
    let Json(new) = body?;

    if let Err(err) = validate_new_student(&new) {
        warn!(error = %err, "Rejected student");
        return Err(err.into());
    }
    if let Some(error) = catalog_error(&state.catalog, &new) {
        warn!(course = %new.course, section = %new.section, "Rejected student");
        return Err(RosterError::validation(vec![error]).into());
    }

    let record = state.store.create_record(new).await?;
    info!(id = %record.id, course = %record.course, section = %record.section, "Created student");
    Ok((StatusCode::CREATED, Json(record)))
}

fn catalog_error(catalog: &Catalog, new: &NewStudent) -> Option<FieldError> {
    if !catalog.contains(&new.course) {
        return Some(FieldError::new(
            "course",
            format!("Unknown course '{}'", new.course),
        ));
    }
    if !catalog.sections_for(&new.course).contains(&new.section) {
        return Some(FieldError::new(
            "section",
            format!(
                "Section '{}' is not offered for {}",
                new.section,
                catalog.course_name(&new.course)
            ),
        ));
    }
    None
}

/// Handler for `PATCH /students/:id`.
///
/// Only field shapes are checked; the course and section pair is not.
async fn handle_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<StudentPatch>, JsonRejection>,
) -> Result<Json<StudentRecord>, ApiError> {
    let Json(patch) = body?;

    if let Err(err) = validate_patch(&patch) {
        warn!(id = %id, error = %err, "Rejected patch");
        return Err(err.into());
    }

    match state.store.update_record(&id, patch).await {
        Ok(record) => {
            info!(id = %id, "Updated student");
            Ok(Json(record))
        }
        Err(err) => {
            warn!(id = %id, error = %err, "Update failed");
            Err(err.into())
        }
    }
}

/// Handler for `DELETE /students/:id`.
async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_record(&id).await?;
    info!(id = %id, "Deleted student");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `GET /api/courses`.
async fn handle_courses(State(state): State<Arc<AppState>>) -> Json<Vec<CatalogEntry>> {
    Json(state.catalog.entries())
}

/// Handler for `GET /api/health`.
async fn handle_health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use serde_json::json;
    use tower::util::ServiceExt;

    use super::*;

    fn test_state() -> AppState {
        AppState::new(&Config::default(), MemoryStore::seeded())
    }

    fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn new_student_body() -> serde_json::Value {
        json!({
            "firstName": "Maria",
            "lastName": "Santos",
            "email": "maria@example.com",
            "studentId": "ST0042",
            "contactNumber": "09171234567",
            "course": "bscs",
            "section": "BSCS-2A",
            "registrationDate": "2024-01-10T08:30:00Z"
        })
    }

    // ------------------------------------------------------------------------
    // List and create
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_returns_seeded_records() {
        let router = create_router(test_state());

        let response = router
            .oneshot(empty_request(Method::GET, "/students"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let records: Vec<StudentRecord> = body_json(response).await;
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_create_returns_201_with_generated_id() {
        let state = test_state();
        let store = state.store.clone();
        let router = create_router(state);

        let response = router
            .oneshot(json_request(
                Method::POST,
                "/students",
                &new_student_body(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let record: StudentRecord = body_json(response).await;
        assert_eq!(record.id.len(), 7);
        assert_eq!(record.section, "BSCS-2A");
        assert_eq!(store.len().await, 4);

        insta::assert_json_snapshot!(record, { ".id" => "[id]" }, @r#"
        {
          "id": "[id]",
          "firstName": "Maria",
          "lastName": "Santos",
          "email": "maria@example.com",
          "studentId": "ST0042",
          "contactNumber": "09171234567",
          "course": "bscs",
          "section": "BSCS-2A",
          "registrationDate": "2024-01-10T08:30:00Z"
        }
        "#);
    }

    #[tokio::test]
    async fn test_create_ignores_client_supplied_id() {
        let state = test_state();
        let router = create_router(state);
        let mut body = new_student_body();
        body["id"] = json!("1");

        let response = router
            .oneshot(json_request(Method::POST, "/students", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let record: StudentRecord = body_json(response).await;
        assert_ne!(record.id, "1");
    }

    #[tokio::test]
    async fn test_create_invalid_fields_returns_422() {
        let state = test_state();
        let store = state.store.clone();
        let router = create_router(state);
        let mut body = new_student_body();
        body["email"] = json!("nope");
        body["contactNumber"] = json!("123");

        let response = router
            .oneshot(json_request(Method::POST, "/students", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: ErrorResponse = body_json(response).await;
        let fields: Vec<_> = error
            .fields
            .unwrap()
            .into_iter()
            .map(|f| f.field)
            .collect();
        assert_eq!(fields, ["email", "contactNumber"]);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_create_section_outside_course_returns_422() {
        let router = create_router(test_state());
        let mut body = new_student_body();
        body["section"] = json!("BSIT-1A");

        let response = router
            .oneshot(json_request(Method::POST, "/students", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.fields.unwrap()[0].field, "section");
    }

    #[tokio::test]
    async fn test_create_unknown_course_returns_422() {
        let router = create_router(test_state());
        let mut body = new_student_body();
        body["course"] = json!("bsarch");

        let response = router
            .oneshot(json_request(Method::POST, "/students", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: ErrorResponse = body_json(response).await;
        assert!(error.error.contains("Unknown course 'bsarch'"));
    }

    #[tokio::test]
    async fn test_create_malformed_json_returns_400() {
        let router = create_router(test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/students")
                    .header("content-type", "application/json")
                    .body(Body::from("{ invalid json }"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = body_json(response).await;
        assert!(error.fields.is_none());
    }

    // ------------------------------------------------------------------------
    // Update and delete
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_patch_overlays_fields() {
        let router = create_router(test_state());

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                "/students/1",
                &json!({"course": "bscs", "section": "BSCS-1A"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let record: StudentRecord = body_json(response).await;
        assert_eq!(record.id, "1");
        assert_eq!(record.course, "bscs");
        assert_eq!(record.section, "BSCS-1A");
        assert_eq!(record.first_name, "John");
        assert_eq!(
            record.registration_date.to_rfc3339(),
            "2023-06-15T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_patch_cannot_change_id_or_registration_date() {
        let router = create_router(test_state());

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                "/students/2",
                &json!({"id": "99", "registrationDate": "2030-01-01T00:00:00Z"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let record: StudentRecord = body_json(response).await;
        assert_eq!(record.id, "2");
        assert_eq!(
            record.registration_date.to_rfc3339(),
            "2023-07-12T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_patch_missing_returns_404() {
        let router = create_router(test_state());

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                "/students/missing",
                &json!({"firstName": "Ghost"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = body_json(response).await;
        assert!(error.error.contains("missing"));
    }

    #[tokio::test]
    async fn test_patch_invalid_shape_returns_422() {
        let router = create_router(test_state());

        let response = router
            .oneshot(json_request(
                Method::PATCH,
                "/students/1",
                &json!({"firstName": "J"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let state = test_state();
        let store = state.store.clone();
        let router = create_router(state);

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(empty_request(Method::DELETE, "/students/3"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_injected_failure_returns_503() {
        let state = test_state();
        state.store.faults().fail_next(1);
        let router = create_router(state);

        let response = router
            .oneshot(empty_request(Method::GET, "/students"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let error: ErrorResponse = body_json(response).await;
        assert!(error.error.contains("Backend unavailable"));
    }

    // ------------------------------------------------------------------------
    // Catalog and health
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_courses_lists_catalog() {
        let router = create_router(test_state());

        let response = router
            .oneshot(empty_request(Method::GET, "/api/courses"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let entries: Vec<CatalogEntry> = body_json(response).await;
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].id, "bsit");
        assert_eq!(entries[0].sections.len(), 4);
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(test_state());

        let response = router
            .oneshot(empty_request(Method::GET, "/api/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }
}
