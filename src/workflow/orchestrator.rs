//! The workflow orchestrator
//!
//! One method per route step. Mutating steps resolve to a [`Redirect`] in
//! every path (success, stale precondition, recoverable failure), so the
//! caller always answers a POST with a redirect and a reload can never
//! repeat the mutation. Typed errors (`NotFound`, `Conflict` where fatal)
//! propagate unchanged; anything else is wrapped once with the operation
//! and note id.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::routes::{ActionIndicator, Redirect};
use super::validate::{self, CreateForm};
use super::words::tonnage_to_words;
use crate::backend::{BalanceGateway, NoteRepository, RecipientDirectory, RegistrationClient};
use crate::balance::{Admission, AdmissionController};
use crate::note::{
    AccreditationScope, CreateNotePayload, IssuedToOrganisation, Note, NoteAction, NoteStatus,
    RegistrationContext, WasteBalance,
};
use crate::session::{CreatedNote, DraftNote, IssuedNote, SessionStore};
use crate::{Error, Result};

/// Outcome of the create step
#[derive(Debug)]
pub enum CreateOutcome {
    /// Draft created and mirrored into the session
    Created { redirect: Redirect },
    /// Input rejected; re-render the form with these errors and the
    /// submitted values preserved
    Invalid {
        errors: validate::ValidationErrors,
        form: CreateForm,
    },
}

/// Outcome of the check (GET) step. The same route serves two purposes
/// depending on session state.
#[derive(Debug)]
pub enum CheckOutcome {
    /// A matching session draft exists: review-before-creating view,
    /// rendered from the session copy without a backend round trip
    Review { draft: DraftNote },
    /// No matching draft: read-only detail view of an existing note
    Detail {
        note: Note,
        context: RegistrationContext,
    },
}

/// A GET page that either renders or redirects
#[derive(Debug)]
pub enum Page<T> {
    Show(T),
    Redirect(Redirect),
}

/// Data for the issued success page
#[derive(Debug)]
pub struct IssuedView {
    pub note: Note,
    pub context: RegistrationContext,
    /// Fresh number when the read caught up, otherwise the session-cached
    /// one from the issue step
    pub prn_number: Option<String>,
}

/// Data for the notes list page
#[derive(Debug)]
pub struct ListView {
    pub notes: Vec<Note>,
    pub balance: Option<WasteBalance>,
}

/// Orchestrates the note lifecycle against the backend collaborators
pub struct NoteWorkflow {
    repository: Arc<dyn NoteRepository>,
    admission: AdmissionController,
    registrations: Arc<dyn RegistrationClient>,
    recipients: Arc<dyn RecipientDirectory>,
}

impl NoteWorkflow {
    pub fn new(
        repository: Arc<dyn NoteRepository>,
        balance: Arc<dyn BalanceGateway>,
        registrations: Arc<dyn RegistrationClient>,
        recipients: Arc<dyn RecipientDirectory>,
    ) -> Self {
        Self {
            repository,
            admission: AdmissionController::new(balance),
            registrations,
            recipients,
        }
    }

    /// Create a draft note from the submitted form and mirror it into the
    /// session for the check page.
    pub async fn create(
        &self,
        scope: &AccreditationScope,
        form: CreateForm,
        session: &mut SessionStore,
    ) -> Result<CreateOutcome> {
        let request = match validate::validate(&form) {
            Ok(request) => request,
            Err(errors) => {
                debug!(count = errors.iter().count(), "Create form rejected");
                return Ok(CreateOutcome::Invalid { errors, form });
            }
        };

        let (recipient, recipient_name) = self.resolve_recipient(&request.recipient_id).await?;

        let payload = CreateNotePayload {
            issued_to_organisation: recipient,
            tonnage: request.tonnage,
            notes: request.notes.clone(),
        };

        let note = self
            .repository
            .create_note(scope, payload)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create note draft");
                e.wrap("note creation", "new")
            })?;

        info!(note_id = %note.id, tonnage = note.tonnage, "Draft note created");

        let words = tonnage_to_words(note.tonnage);
        session.put_draft(DraftNote::from_note(&note, &recipient_name, &words));

        Ok(CreateOutcome::Created {
            redirect: Redirect::view(note.id),
        })
    }

    /// Look up the recipient in the directory, returning the payload
    /// identity and the resolved display name. An id that is not in the
    /// current list falls back to the raw identifier as its display name;
    /// a defensive path, not an expected one.
    async fn resolve_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<(IssuedToOrganisation, String)> {
        let recipients = self
            .recipients
            .recipients()
            .await
            .map_err(|e| e.wrap("recipient lookup", recipient_id))?;

        match recipients.into_iter().find(|r| r.id == recipient_id) {
            Some(recipient) => {
                let display_name = recipient.display_name().to_string();
                let identity = IssuedToOrganisation {
                    id: recipient.id,
                    name: recipient.name,
                    trading_name: recipient.trading_name,
                };
                Ok((identity, display_name))
            }
            None => {
                warn!(recipient_id, "Recipient not in organisations list, using raw id");
                let identity = IssuedToOrganisation {
                    id: recipient_id.to_string(),
                    name: recipient_id.to_string(),
                    trading_name: None,
                };
                Ok((identity, recipient_id.to_string()))
            }
        }
    }

    /// The check/view page. With a matching session draft this is the
    /// review-before-creating view served from the session copy; otherwise
    /// the note and its registration context are fetched in parallel for
    /// the read-only detail view.
    pub async fn check(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        session: &SessionStore,
    ) -> Result<CheckOutcome> {
        if let Some(draft) = session.draft_for(note_id) {
            debug!(note_id, "Serving review page from session draft");
            return Ok(CheckOutcome::Review {
                draft: draft.clone(),
            });
        }

        let (note, context) = tokio::join!(
            self.repository.fetch_note(scope, note_id),
            self.registrations
                .registration(&scope.organisation_id, &scope.registration_id),
        );

        Ok(CheckOutcome::Detail {
            note: note?,
            context: context?,
        })
    }

    /// Confirm a reviewed draft. Re-validates the balance at commit time;
    /// an inadmissible tonnage discards the draft so the backend keeps no
    /// orphan, then sends the user back to the create page.
    pub async fn confirm(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        session: &mut SessionStore,
    ) -> Result<Redirect> {
        let draft = match session.draft_for(note_id) {
            Some(draft) => draft.clone(),
            None => {
                debug!(note_id, "No matching session draft, redirecting to create");
                return Ok(Redirect::create());
            }
        };

        // The session copy is display-only; the backend's status decides
        // whether this confirmation still applies.
        let note = self.repository.fetch_note(scope, note_id).await?;
        if !note.status.allows(NoteAction::Confirm) {
            debug!(note_id, status = %note.status, "Note is not a draft, no-op redirect");
            return Ok(Redirect::action(note_id));
        }

        let admission = self
            .admission
            .admit(draft.tonnage, &scope.organisation_id, &scope.accreditation_id)
            .await
            .map_err(|e| e.wrap("confirmation", note_id))?;

        if let Admission::Rejected { available } = admission {
            warn!(
                note_id,
                tonnage = draft.tonnage,
                available,
                "Balance no longer covers draft, discarding"
            );

            self.repository
                .update_status(scope, note_id, NoteStatus::Discarded)
                .await
                .map_err(|e| e.wrap("draft discard", note_id))?;

            session.clear_draft();
            return Ok(Redirect::create_insufficient_balance());
        }

        let updated = self
            .repository
            .update_status(scope, note_id, NoteStatus::AwaitingAuthorisation)
            .await
            .map_err(|e| {
                error!(note_id, error = %e, "Failed to confirm note");
                e.wrap("confirmation", note_id)
            })?;

        info!(note_id, "Note confirmed, awaiting authorisation");

        session.clear_draft();
        session.put_created(CreatedNote {
            id: updated.id.clone(),
            tonnage: updated.tonnage,
            material: updated.material.clone(),
            status: updated.status.clone(),
            waste_processing_type: draft.waste_processing_type,
        });

        Ok(Redirect::Created {
            note_id: note_id.to_string(),
        })
    }

    /// Issue an authorised note. Failure here is recoverable: the user
    /// retries from the action page, so nothing on this path is a hard
    /// error.
    pub async fn issue(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        session: &mut SessionStore,
    ) -> Result<Redirect> {
        let note = self.repository.fetch_note(scope, note_id).await?;
        if !note.status.allows(NoteAction::Issue) {
            debug!(note_id, status = %note.status, "Note not awaiting authorisation, no-op redirect");
            return Ok(Redirect::action(note_id));
        }

        match self
            .repository
            .update_status(scope, note_id, NoteStatus::AwaitingAcceptance)
            .await
        {
            Ok(updated) => {
                info!(note_id, prn_number = ?updated.prn_number, "Note issued");

                // Cache the assigned number so the issued page can show it
                // even if its own read hits a replica the write has not
                // reached yet.
                session.put_issued(IssuedNote {
                    id: note_id.to_string(),
                    prn_number: updated.prn_number.clone(),
                    stored_at: chrono::Utc::now(),
                });

                Ok(Redirect::Issued {
                    note_id: note_id.to_string(),
                })
            }
            Err(Error::Conflict(reason)) => {
                warn!(note_id, %reason, "Backend rejected issue");
                Ok(Redirect::Error)
            }
            Err(e) => {
                error!(note_id, error = %e, "Failed to issue note");
                Ok(Redirect::action_with(note_id, ActionIndicator::IssueFailed))
            }
        }
    }

    /// Data for the delete confirmation page
    pub async fn delete_page(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
    ) -> Result<Page<Note>> {
        let note = self.repository.fetch_note(scope, note_id).await?;
        if !note.status.allows(NoteAction::Delete) {
            return Ok(Page::Redirect(Redirect::action(note_id)));
        }
        Ok(Page::Show(note))
    }

    /// Delete a note that has not yet been issued
    pub async fn delete(&self, scope: &AccreditationScope, note_id: &str) -> Result<Redirect> {
        let note = self.repository.fetch_note(scope, note_id).await?;
        if !note.status.allows(NoteAction::Delete) {
            debug!(note_id, status = %note.status, "Delete precondition not met, no-op redirect");
            return Ok(Redirect::action(note_id));
        }

        self.repository
            .update_status(scope, note_id, NoteStatus::Cancelled)
            .await
            .map_err(|e| {
                error!(note_id, error = %e, "Failed to delete note");
                e.wrap("delete", note_id)
            })?;

        info!(note_id, "Note deleted");
        Ok(Redirect::List)
    }

    /// Data for the cancel confirmation page
    pub async fn cancel_page(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
    ) -> Result<Page<Note>> {
        let note = self.repository.fetch_note(scope, note_id).await?;
        if !note.status.allows(NoteAction::Cancel) {
            return Ok(Page::Redirect(Redirect::action(note_id)));
        }
        Ok(Page::Show(note))
    }

    /// Confirm a requested cancellation
    pub async fn cancel(&self, scope: &AccreditationScope, note_id: &str) -> Result<Redirect> {
        let note = self.repository.fetch_note(scope, note_id).await?;
        if !note.status.allows(NoteAction::Cancel) {
            debug!(note_id, status = %note.status, "Cancel precondition not met, no-op redirect");
            return Ok(Redirect::action(note_id));
        }

        self.repository
            .update_status(scope, note_id, NoteStatus::Cancelled)
            .await
            .map_err(|e| {
                error!(note_id, error = %e, "Failed to cancel note");
                e.wrap("cancellation", note_id)
            })?;

        info!(note_id, "Note cancelled");
        Ok(Redirect::Cancelled {
            note_id: note_id.to_string(),
        })
    }

    /// Data for the discard confirmation page; guarded by the session
    /// draft, not a backend read
    pub fn discard_page(&self, note_id: &str, session: &SessionStore) -> Page<DraftNote> {
        match session.draft_for(note_id) {
            Some(draft) => Page::Show(draft.clone()),
            None => Page::Redirect(Redirect::create()),
        }
    }

    /// Discard an abandoned creation
    pub async fn discard(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        session: &mut SessionStore,
    ) -> Result<Redirect> {
        if session.draft_for(note_id).is_none() {
            debug!(note_id, "No matching session draft, redirecting to create");
            return Ok(Redirect::create());
        }

        self.repository
            .update_status(scope, note_id, NoteStatus::Discarded)
            .await
            .map_err(|e| {
                error!(note_id, error = %e, "Failed to discard note");
                e.wrap("discard", note_id)
            })?;

        info!(note_id, "Draft discarded");
        session.clear_draft();
        Ok(Redirect::create())
    }

    /// Success page after confirmation; consumes the created marker
    pub fn created_page(&self, note_id: &str, session: &mut SessionStore) -> Page<CreatedNote> {
        match session.take_created_for(note_id) {
            Some(created) => Page::Show(created),
            None => Page::Redirect(Redirect::view(note_id)),
        }
    }

    /// Success page after issuing. Prefers a freshly fetched note number;
    /// falls back to the session-cached one while the write propagates.
    pub async fn issued_page(
        &self,
        scope: &AccreditationScope,
        note_id: &str,
        session: &mut SessionStore,
    ) -> Result<Page<IssuedView>> {
        let marker = session.take_issued_for(note_id);

        let (note, context) = tokio::join!(
            self.repository.fetch_note(scope, note_id),
            self.registrations
                .registration(&scope.organisation_id, &scope.registration_id),
        );
        let note = note?;
        let context = context?;

        if note.status != NoteStatus::AwaitingAcceptance {
            return Ok(Page::Redirect(Redirect::view(note_id)));
        }

        let prn_number = note
            .prn_number
            .clone()
            .or_else(|| marker.and_then(|m| m.prn_number));

        Ok(Page::Show(IssuedView {
            note,
            context,
            prn_number,
        }))
    }

    /// The notes list with the current waste balance. A balance outage
    /// degrades to an absent figure rather than failing the page.
    pub async fn list(&self, scope: &AccreditationScope) -> Result<ListView> {
        let (notes, balance) = tokio::join!(
            self.repository.fetch_notes(scope),
            self.admission_balance(scope),
        );

        Ok(ListView {
            notes: notes?,
            balance,
        })
    }

    async fn admission_balance(&self, scope: &AccreditationScope) -> Option<WasteBalance> {
        match self
            .admission
            .snapshot(&scope.organisation_id, &scope.accreditation_id)
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "Failed to fetch waste balance");
                None
            }
        }
    }
}
