//! Recycling Notes: PRN/PERN issuance workflow
//!
//! A tight Rust crate for issuing Packaging Recycling Notes (PRNs) and
//! Packaging Export Recycling Notes (PERNs) against a finite waste balance:
//! - **Lifecycle**: a closed status state machine with guarded transitions
//! - **Session drafts**: one in-flight creation per user, mirrored for review
//! - **Admission control**: the balance is re-checked at commit time, never
//!   trusted from an earlier page
//!
//! # Core Philosophy
//!
//! The backend is the authority for note status. Every mutating step
//! re-reads the note first; a stale precondition is a redirect, not an
//! error.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Workflow orchestrator           │
//! │  create → check → confirm → created     │
//! │  action → issue / delete / cancel       │
//! └───────┬──────────────┬──────────────────┘
//!         ▼              ▼
//! ┌───────────────┐  ┌───────────────────────┐
//! │ Session store │  │ Backend collaborators │
//! │ draft mirror, │  │ note CRUD, waste      │
//! │ page markers  │  │ balance, directories  │
//! └───────────────┘  └───────────────────────┘
//! ```

pub mod backend;
pub mod balance;
pub mod config;
pub mod note;
pub mod session;
pub mod workflow;

// Re-exports for convenience
pub use backend::{BalanceGateway, NoteRepository, RecipientDirectory, RegistrationClient};
pub use balance::{Admission, AdmissionController};
pub use config::Config;
pub use note::{AccreditationScope, Note, NoteAction, NoteStatus, WasteProcessingType};
pub use session::{DraftNote, SessionStore};
pub use workflow::{NoteWorkflow, Redirect};

/// Crate-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this error is one of the typed variants the workflow
    /// propagates unchanged rather than re-wrapping.
    pub fn is_typed(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Conflict(_))
    }

    /// Wrap an untyped failure with the operation it came from; typed
    /// errors pass through untouched.
    pub fn wrap(self, operation: &str, note_id: &str) -> Self {
        if self.is_typed() {
            self
        } else {
            Error::Backend(format!("{} failed for note {}: {}", operation, note_id, self))
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
