//! [`StudentStore`] over the HTTP API, for the CLI and integration tests.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::api::ErrorResponse;
use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{FieldError, Result, RosterError};
use crate::model::{NewStudent, StudentPatch, StudentRecord};
use crate::store::StudentStore;

/// A store that forwards every operation to a running Roster server.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    /// Creates a client for the server at `base_url`.
    ///
    /// With `timeout` set to `None`, requests wait indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RosterError::transient(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The server base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetches the server's course catalog.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::Transient` if the server cannot be reached.
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let response = self
            .client
            .get(self.url("/api/courses"))
            .send()
            .await
            .map_err(transport_error)?;
        let entries: Vec<CatalogEntry> = decode(response, None).await?;
        Ok(Catalog::from_entries(entries))
    }
}

impl StudentStore for HttpStore {
    async fn list_records(&self) -> Result<Vec<StudentRecord>> {
        debug!(url = %self.base_url, "GET students");
        let response = self
            .client
            .get(self.url("/students"))
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, None).await
    }

    async fn create_record(&self, new: NewStudent) -> Result<StudentRecord> {
        debug!(url = %self.base_url, "POST student");
        let response = self
            .client
            .post(self.url("/students"))
            .json(&new)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, None).await
    }

    async fn update_record(&self, id: &str, patch: StudentPatch) -> Result<StudentRecord> {
        debug!(url = %self.base_url, id, "PATCH student");
        let response = self
            .client
            .patch(self.url(&format!("/students/{id}")))
            .json(&patch)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, Some(id)).await
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        debug!(url = %self.base_url, id, "DELETE student");
        let response = self
            .client
            .delete(self.url(&format!("/students/{id}")))
            .send()
            .await
            .map_err(transport_error)?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(status_error(response, Some(id)).await)
    }
}

fn transport_error(err: reqwest::Error) -> RosterError {
    if err.is_timeout() {
        RosterError::transient(format!("request timed out: {err}"))
    } else {
        RosterError::transient(format!("request failed: {err}"))
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response, id: Option<&str>) -> Result<T> {
    if !response.status().is_success() {
        return Err(status_error(response, id).await);
    }
    response
        .json()
        .await
        .map_err(|e| RosterError::transient(format!("unreadable response: {e}")))
}

/// Maps a non-success response onto the error taxonomy.
async fn status_error(response: Response, id: Option<&str>) -> RosterError {
    let status = response.status();
    let body = response.json::<ErrorResponse>().await.ok();

    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => RosterError::not_found(id),
        (StatusCode::UNPROCESSABLE_ENTITY, _) => {
            let (message, fields) = body
                .map(|b| (b.error, b.fields.unwrap_or_default()))
                .unwrap_or_default();
            if fields.is_empty() {
                RosterError::validation(vec![FieldError::new("body", message)])
            } else {
                RosterError::validation(fields)
            }
        }
        _ => {
            let detail = body.map(|b| b.error).unwrap_or_default();
            RosterError::transient(format!("server returned {status}: {detail}"))
        }
    }
}
