//! HTTP implementation of the backend collaborators
//!
//! Thin reqwest client over the EPR backend's JSON resource API. The
//! transport owns timeouts and retries; this layer only builds paths,
//! attaches the bearer credential, and maps response statuses onto the
//! crate error taxonomy.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::{BalanceGateway, NoteRepository, RecipientDirectory, RegistrationClient};
use crate::note::{
    AccreditationScope, CreateNotePayload, Note, NoteStatus, Recipient, RegistrationContext,
    WasteBalance,
};
use crate::{Error, Result};

/// Client for the EPR backend resource API
pub struct HttpBackend {
    /// API base URL, without a trailing slash
    base_url: String,
    /// HTTP client with the bearer credential baked into default headers
    client: reqwest::Client,
}

#[derive(Serialize)]
struct StatusUpdatePayload<'a> {
    status: &'a NoteStatus,
}

impl HttpBackend {
    /// Create a client for `base_url` authenticated with `token`. The token
    /// is an opaque bearer credential supplied by the session layer and is
    /// assumed already valid.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Config(format!("Invalid bearer token: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn notes_path(&self, scope: &AccreditationScope) -> String {
        format!(
            "{}/v1/organisations/{}/registrations/{}/accreditations/{}/packaging-recycling-notes",
            self.base_url, scope.organisation_id, scope.registration_id, scope.accreditation_id
        )
    }

    async fn read_json<T: DeserializeOwned>(&self, response: reqwest::Response, what: &str) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, what, &url, &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        debug!(url, "GET {}", what);
        let response = self.client.get(url).send().await?;
        self.read_json(response, what).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        what: &str,
    ) -> Result<T> {
        debug!(url, "POST {}", what);
        let response = self.client.post(url).json(body).send().await?;
        self.read_json(response, what).await
    }
}

/// Map a non-success response onto the error taxonomy. Not-found and
/// conflict stay typed so callers can branch on kind; everything else
/// becomes a generic backend failure carrying the url and status.
fn map_status(status: StatusCode, what: &str, url: &str, body: &str) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
        StatusCode::CONFLICT => Error::Conflict(format!("{} rejected by backend", what)),
        _ => Error::Backend(format!(
            "{} failed at {}: {} {}",
            what,
            url,
            status.as_u16(),
            body.chars().take(200).collect::<String>()
        )),
    }
}

#[async_trait]
impl NoteRepository for HttpBackend {
    async fn fetch_note(&self, scope: &AccreditationScope, note_id: &str) -> Result<Note> {
        let url = format!("{}/{}", self.notes_path(scope), note_id);
        self.get_json(&url, "note").await
    }

    async fn fetch_notes(&self, scope: &AccreditationScope) -> Result<Vec<Note>> {
        let url = self.notes_path(scope);
        self.get_json(&url, "notes").await
    }

    async fn create_note(
        &self,
        scope: &AccreditationScope,
        payload: CreateNotePayload,
    ) -> Result<Note> {
        let url = self.notes_path(scope);
        self.post_json(&url, &payload, "note creation").await
    }

    async fn update_status(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        status: NoteStatus,
    ) -> Result<Note> {
        let url = format!("{}/{}/status", self.notes_path(scope), note_id);
        let payload = StatusUpdatePayload { status: &status };
        self.post_json(&url, &payload, "status update").await
    }
}

#[async_trait]
impl BalanceGateway for HttpBackend {
    async fn waste_balance(
        &self,
        organisation_id: &str,
        accreditation_id: &str,
    ) -> Result<Option<WasteBalance>> {
        let url = format!(
            "{}/v1/organisations/{}/waste-balances?accreditationIds={}",
            self.base_url, organisation_id, accreditation_id
        );

        // The backend returns a map keyed by accreditation id; a missing
        // key means no balance record exists for it.
        let mut balances: HashMap<String, WasteBalance> =
            self.get_json(&url, "waste balance").await?;
        Ok(balances.remove(accreditation_id))
    }
}

#[async_trait]
impl RegistrationClient for HttpBackend {
    async fn registration(
        &self,
        organisation_id: &str,
        registration_id: &str,
    ) -> Result<RegistrationContext> {
        let url = format!(
            "{}/v1/organisations/{}/registrations/{}",
            self.base_url, organisation_id, registration_id
        );
        self.get_json(&url, "registration").await
    }
}

#[async_trait]
impl RecipientDirectory for HttpBackend {
    async fn recipients(&self) -> Result<Vec<Recipient>> {
        let url = format!("{}/v1/waste-organisations", self.base_url);
        self.get_json(&url, "waste organisations").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> AccreditationScope {
        AccreditationScope::new("org-1", "reg-2", "acc-3")
    }

    #[test]
    fn test_notes_path_includes_scope_triple() {
        let backend = HttpBackend::new("https://epr-backend.test/", "token-abc").unwrap();
        assert_eq!(
            backend.notes_path(&scope()),
            "https://epr-backend.test/v1/organisations/org-1/registrations/reg-2/accreditations/acc-3/packaging-recycling-notes"
        );
    }

    #[test]
    fn test_map_status_keeps_typed_errors() {
        let err = map_status(StatusCode::NOT_FOUND, "note", "http://x/n/1", "");
        assert!(matches!(err, Error::NotFound(_)));

        let err = map_status(StatusCode::CONFLICT, "status update", "http://x/n/1/status", "");
        assert!(matches!(err, Error::Conflict(_)));

        let err = map_status(StatusCode::BAD_GATEWAY, "note", "http://x/n/1", "upstream down");
        assert!(matches!(err, Error::Backend(_)));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_invalid_token_is_a_config_error() {
        let result = HttpBackend::new("https://epr-backend.test", "bad\ntoken");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
