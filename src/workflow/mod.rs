//! Note issuance workflow
//!
//! Sequences the session store, balance admission and backend repository to
//! implement each page transition:
//!
//! - **Creation**: create → check → confirm → created
//! - **Actions**: issue / delete / cancel / discard, each a single guarded
//!   transition
//!
//! Two rules shape every step:
//!
//! 1. The backend's view of status wins. A mutating step re-fetches the
//!    note and checks its precondition; a mismatch is a redirect outcome,
//!    never an error, so re-submitted pages are harmless.
//! 2. The balance is admitted at commit time. The figure shown on the
//!    create page is advisory; `confirm` queries it fresh and discards the
//!    draft when the allowance no longer covers it.

pub mod orchestrator;
pub mod routes;
pub mod validate;
pub mod words;

pub use orchestrator::{CheckOutcome, CreateOutcome, IssuedView, ListView, NoteWorkflow, Page};
pub use routes::{ActionIndicator, Redirect};
pub use validate::{CreateForm, CreateRequest, ErrorKey, Field, ValidationErrors, NOTES_MAX_LENGTH};
pub use words::tonnage_to_words;
