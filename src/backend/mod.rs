//! Backend collaborator abstraction
//!
//! The workflow orchestrates a remote store; it is a client, not the store.
//! These traits are the narrow contract it depends on:
//! - [`NoteRepository`]: note CRUD and the status-update endpoint
//! - [`BalanceGateway`]: the available tonnage allowance per accreditation
//! - [`RegistrationClient`]: registration/accreditation context for pages
//! - [`RecipientDirectory`]: the waste organisations a note can be issued to

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{InjectedFailure, MemoryBackend};

use async_trait::async_trait;
use std::sync::Arc;

use crate::note::{
    AccreditationScope, CreateNotePayload, Note, NoteStatus, Recipient, RegistrationContext,
    WasteBalance,
};
use crate::{Config, Result};

/// Remote CRUD for the note resource
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Fetch a single note; `Error::NotFound` when it does not exist or the
    /// caller is not entitled to it
    async fn fetch_note(&self, scope: &AccreditationScope, note_id: &str) -> Result<Note>;

    /// Fetch all notes under an accreditation
    async fn fetch_notes(&self, scope: &AccreditationScope) -> Result<Vec<Note>>;

    /// Create a note; the backend assigns the id and starts it as a draft
    async fn create_note(&self, scope: &AccreditationScope, payload: CreateNotePayload)
        -> Result<Note>;

    /// Ask the backend to move a note to `status`. The backend enforces its
    /// own preconditions independently; a rejection surfaces as
    /// `Error::Conflict`.
    async fn update_status(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        status: NoteStatus,
    ) -> Result<Note>;
}

/// Read-only view of the waste balance for an accreditation
#[async_trait]
pub trait BalanceGateway: Send + Sync {
    /// `Ok(None)` when the backend has no balance record for the
    /// accreditation; callers treat that as a zero allowance
    async fn waste_balance(
        &self,
        organisation_id: &str,
        accreditation_id: &str,
    ) -> Result<Option<WasteBalance>>;
}

/// Registration and accreditation context reads
#[async_trait]
pub trait RegistrationClient: Send + Sync {
    async fn registration(
        &self,
        organisation_id: &str,
        registration_id: &str,
    ) -> Result<RegistrationContext>;
}

/// The waste organisations directory a recipient is picked from
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn recipients(&self) -> Result<Vec<Recipient>>;
}

/// Create the HTTP backend from configuration, shared across the
/// collaborator seams
pub fn create_backend(config: &Config, token: &str) -> Result<Arc<HttpBackend>> {
    let backend = HttpBackend::new(&config.backend.base_url, token)?;
    Ok(Arc::new(backend))
}
