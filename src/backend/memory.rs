//! In-memory backend for tests and dry runs
//!
//! Behaves like the remote store from the workflow's point of view: it
//! mints ids, starts notes as drafts, enforces status transitions
//! independently (surfacing violations as conflicts), and assigns the note
//! number at issue time. Tests can inject failures and inspect call counts.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BalanceGateway, NoteRepository, RecipientDirectory, RegistrationClient};
use crate::note::{
    AccreditationScope, Accreditation, CreateNotePayload, Note, NoteStatus, Recipient,
    Registration, RegistrationContext, WasteBalance, WasteProcessingType,
};
use crate::workflow::words::tonnage_to_words;
use crate::{Error, Result};

/// Failure to inject into the next status update
#[derive(Debug, Clone, Copy)]
pub enum InjectedFailure {
    Conflict,
    Backend,
}

/// Stand-in for the remote backend, holding all state in memory
pub struct MemoryBackend {
    notes: Mutex<HashMap<String, Note>>,
    balance: Mutex<Option<WasteBalance>>,
    registration: RegistrationContext,
    recipients: Vec<Recipient>,
    next_failure: Mutex<Option<InjectedFailure>>,
    issued_counter: AtomicUsize,
    status_update_calls: AtomicUsize,
    balance_queries: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(HashMap::new()),
            balance: Mutex::new(Some(WasteBalance {
                available_amount: 1000.0,
            })),
            registration: default_registration(),
            recipients: default_recipients(),
            next_failure: Mutex::new(None),
            issued_counter: AtomicUsize::new(0),
            status_update_calls: AtomicUsize::new(0),
            balance_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_registration(mut self, registration: RegistrationContext) -> Self {
        self.registration = registration;
        self
    }

    /// Set the available balance the gateway reports
    pub async fn set_balance(&self, available_amount: f64) {
        *self.balance.lock().await = Some(WasteBalance { available_amount });
    }

    /// Remove the balance record entirely (missing key at the backend)
    pub async fn clear_balance(&self) {
        *self.balance.lock().await = None;
    }

    /// Make the next status update fail with the given kind
    pub async fn fail_next_status_update(&self, failure: InjectedFailure) {
        *self.next_failure.lock().await = Some(failure);
    }

    /// Seed a note directly, bypassing the creation flow
    pub async fn insert_note(&self, note: Note) {
        self.notes.lock().await.insert(note.id.clone(), note);
    }

    pub async fn note(&self, note_id: &str) -> Option<Note> {
        self.notes.lock().await.get(note_id).cloned()
    }

    /// How many times the status-update operation has been called
    pub fn status_update_calls(&self) -> usize {
        self.status_update_calls.load(Ordering::SeqCst)
    }

    /// How many times the balance gateway has been queried
    pub fn balance_queries(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn default_registration() -> RegistrationContext {
    RegistrationContext {
        registration: Registration {
            id: "reg-1".to_string(),
            material: "glass".to_string(),
            nation: Some("england".to_string()),
            waste_processing_type: WasteProcessingType::Reprocessor,
            site_address: Some("1 Recycling Way, Birmingham, B1 1AA".to_string()),
        },
        accreditation: Some(Accreditation {
            id: "acc-1".to_string(),
            accreditation_number: Some("ACC-2026-001".to_string()),
        }),
        organisation_name: Some("Acme Reprocessing Ltd".to_string()),
    }
}

fn default_recipients() -> Vec<Recipient> {
    vec![
        Recipient {
            id: "producer-1".to_string(),
            name: "Acme Packaging Ltd".to_string(),
            trading_name: None,
        },
        Recipient {
            id: "producer-2".to_string(),
            name: "BigCo Waste Solutions".to_string(),
            trading_name: Some("BigCo".to_string()),
        },
        Recipient {
            id: "scheme-1".to_string(),
            name: "Green Compliance Scheme".to_string(),
            trading_name: None,
        },
    ]
}

#[async_trait]
impl NoteRepository for MemoryBackend {
    async fn fetch_note(&self, _scope: &AccreditationScope, note_id: &str) -> Result<Note> {
        self.notes
            .lock()
            .await
            .get(note_id)
            .cloned()
            .ok_or_else(|| Error::NotFound("note".to_string()))
    }

    async fn fetch_notes(&self, _scope: &AccreditationScope) -> Result<Vec<Note>> {
        let notes = self.notes.lock().await;
        let mut all: Vec<Note> = notes.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn create_note(
        &self,
        _scope: &AccreditationScope,
        payload: CreateNotePayload,
    ) -> Result<Note> {
        let registration = &self.registration.registration;
        let note = Note {
            id: Uuid::new_v4().to_string(),
            prn_number: None,
            status: NoteStatus::Draft,
            issued_to_organisation: payload.issued_to_organisation,
            tonnage: payload.tonnage,
            material: registration.material.clone(),
            nation: registration.nation.clone(),
            waste_processing_type: registration.waste_processing_type,
            notes: payload.notes,
            is_december_waste: false,
            process_to_be_used: Some("Mechanical recycling".to_string()),
            tonnage_in_words: Some(tonnage_to_words(payload.tonnage)),
            created_at: Some(Utc::now()),
            issued_at: None,
            accreditation_year: None,
        };

        self.notes
            .lock()
            .await
            .insert(note.id.clone(), note.clone());
        Ok(note)
    }

    async fn update_status(
        &self,
        _scope: &AccreditationScope,
        note_id: &str,
        status: NoteStatus,
    ) -> Result<Note> {
        self.status_update_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = self.next_failure.lock().await.take() {
            return Err(match failure {
                InjectedFailure::Conflict => {
                    Error::Conflict("status update rejected by backend".to_string())
                }
                InjectedFailure::Backend => {
                    Error::Backend("backend unavailable".to_string())
                }
            });
        }

        let mut notes = self.notes.lock().await;
        let note = notes
            .get_mut(note_id)
            .ok_or_else(|| Error::NotFound("note".to_string()))?;

        // The store enforces its own preconditions: a request that does not
        // follow a legal edge from the current status is a conflict.
        let legal = [
            crate::note::NoteAction::Confirm,
            crate::note::NoteAction::Discard,
            crate::note::NoteAction::Issue,
            crate::note::NoteAction::Delete,
            crate::note::NoteAction::Cancel,
            crate::note::NoteAction::Accept,
        ]
        .iter()
        .any(|&action| note.status.apply(action) == Some(status.clone()));

        if !legal {
            return Err(Error::Conflict(format!(
                "cannot move note from {} to {}",
                note.status, status
            )));
        }

        note.status = status;

        if note.status == NoteStatus::AwaitingAcceptance {
            let sequence = self.issued_counter.fetch_add(1, Ordering::SeqCst) + 1;
            note.prn_number = Some(format!("ER26{:05}", sequence));
            note.issued_at = Some(Utc::now());
            note.accreditation_year = Some(2026);
        }

        Ok(note.clone())
    }
}

#[async_trait]
impl BalanceGateway for MemoryBackend {
    async fn waste_balance(
        &self,
        _organisation_id: &str,
        _accreditation_id: &str,
    ) -> Result<Option<WasteBalance>> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        Ok(*self.balance.lock().await)
    }
}

#[async_trait]
impl RegistrationClient for MemoryBackend {
    async fn registration(
        &self,
        _organisation_id: &str,
        _registration_id: &str,
    ) -> Result<RegistrationContext> {
        Ok(self.registration.clone())
    }
}

#[async_trait]
impl RecipientDirectory for MemoryBackend {
    async fn recipients(&self) -> Result<Vec<Recipient>> {
        Ok(self.recipients.clone())
    }
}
