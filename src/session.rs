//! Per-user session state for the creation and issue flows
//!
//! Holds at most one in-flight draft per user, plus the short-lived markers
//! the confirmation pages consume. Nothing here is durable: the backend
//! note is the authority, the session only remembers display copies between
//! page loads, and everything is lost on session expiry.
//!
//! Known limitation: the draft slot is single-occupancy. Two browser tabs
//! creating notes at once silently replace each other's draft; the id check
//! on read prevents cross-note corruption but not the loss itself.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::note::{Note, NoteStatus, WasteProcessingType};
use crate::{Error, Result};

/// How long the "just issued" note number stays readable. Bounds the
/// window in which a stale replica read is papered over by the cached
/// value.
pub const ISSUED_MARKER_TTL_SECS: i64 = 60;

/// Display mirror of a draft note, captured at creation time and never
/// re-synchronised with the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftNote {
    /// Equals the backend note id; the sole correlation check on read
    pub id: String,
    pub tonnage: u32,
    pub tonnage_in_words: String,
    pub material: String,
    pub status: NoteStatus,
    pub recipient_name: String,
    pub notes: String,
    pub waste_processing_type: WasteProcessingType,
    pub process_to_be_used: String,
    pub is_december_waste: bool,
}

impl DraftNote {
    /// Build the session mirror from a freshly created backend note
    pub fn from_note(note: &Note, recipient_name: &str, tonnage_in_words: &str) -> Self {
        Self {
            id: note.id.clone(),
            tonnage: note.tonnage,
            tonnage_in_words: tonnage_in_words.to_string(),
            material: note.material.clone(),
            status: note.status.clone(),
            recipient_name: recipient_name.to_string(),
            notes: note.notes.clone().unwrap_or_default(),
            waste_processing_type: note.waste_processing_type,
            process_to_be_used: note.process_to_be_used.clone().unwrap_or_default(),
            is_december_waste: note.is_december_waste,
        }
    }
}

/// "Just created" marker for the success page after confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNote {
    pub id: String,
    pub tonnage: u32,
    pub material: String,
    pub status: NoteStatus,
    pub waste_processing_type: WasteProcessingType,
}

/// "Just issued" marker caching the assigned note number.
///
/// Masks read-replica lag: the issued page prefers a freshly fetched
/// number, falling back to this cached one while the write propagates.
/// Readable once, within [`ISSUED_MARKER_TTL_SECS`] of being stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedNote {
    pub id: String,
    pub prn_number: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// The per-user session slots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStore {
    draft: Option<DraftNote>,
    created: Option<CreatedNote>,
    issued: Option<IssuedNote>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a draft mirror. A single slot: any existing entry is silently
    /// replaced.
    pub fn put_draft(&mut self, draft: DraftNote) {
        self.draft = Some(draft);
    }

    /// The stored draft, only if its id matches `note_id`. A mismatch means
    /// the session is treated as absent, not an error.
    pub fn draft_for(&self, note_id: &str) -> Option<&DraftNote> {
        self.draft.as_ref().filter(|draft| draft.id == note_id)
    }

    pub fn clear_draft(&mut self) {
        self.draft = None;
    }

    pub fn put_created(&mut self, created: CreatedNote) {
        self.created = Some(created);
    }

    /// Consume the created marker when its id matches; cleared on read
    pub fn take_created_for(&mut self, note_id: &str) -> Option<CreatedNote> {
        match &self.created {
            Some(created) if created.id == note_id => self.created.take(),
            _ => None,
        }
    }

    pub fn put_issued(&mut self, issued: IssuedNote) {
        self.issued = Some(issued);
    }

    /// Consume the issued marker when its id matches and it is still within
    /// its TTL. Always cleared on read, expired or not.
    pub fn take_issued_for(&mut self, note_id: &str) -> Option<IssuedNote> {
        let issued = self.issued.take()?;
        if issued.id != note_id {
            return None;
        }
        let age = Utc::now().signed_duration_since(issued.stored_at);
        if age > Duration::seconds(ISSUED_MARKER_TTL_SECS) {
            return None;
        }
        Some(issued)
    }

    /// Load a persisted session, or a fresh one when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Session(format!("Failed to parse session file: {}", e)))
    }

    /// Persist the session for the next invocation
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str) -> DraftNote {
        DraftNote {
            id: id.to_string(),
            tonnage: 100,
            tonnage_in_words: "One hundred".to_string(),
            material: "glass".to_string(),
            status: NoteStatus::Draft,
            recipient_name: "Acme Packaging Ltd".to_string(),
            notes: String::new(),
            waste_processing_type: WasteProcessingType::Reprocessor,
            process_to_be_used: "Remelt".to_string(),
            is_december_waste: false,
        }
    }

    #[test]
    fn test_draft_slot_requires_id_match() {
        let mut session = SessionStore::new();
        session.put_draft(draft("prn-1"));

        assert!(session.draft_for("prn-1").is_some());
        assert!(session.draft_for("prn-2").is_none());
    }

    #[test]
    fn test_new_draft_silently_replaces_existing() {
        let mut session = SessionStore::new();
        session.put_draft(draft("prn-1"));
        session.put_draft(draft("prn-2"));

        assert!(session.draft_for("prn-1").is_none());
        assert!(session.draft_for("prn-2").is_some());
    }

    #[test]
    fn test_created_marker_consumed_on_read() {
        let mut session = SessionStore::new();
        session.put_created(CreatedNote {
            id: "prn-1".to_string(),
            tonnage: 100,
            material: "glass".to_string(),
            status: NoteStatus::AwaitingAuthorisation,
            waste_processing_type: WasteProcessingType::Reprocessor,
        });

        assert!(session.take_created_for("other").is_none());
        assert!(session.take_created_for("prn-1").is_some());
        assert!(session.take_created_for("prn-1").is_none());
    }

    #[test]
    fn test_issued_marker_expires_after_ttl() {
        let mut session = SessionStore::new();
        session.put_issued(IssuedNote {
            id: "prn-1".to_string(),
            prn_number: Some("ER2600001".to_string()),
            stored_at: Utc::now() - Duration::seconds(ISSUED_MARKER_TTL_SECS + 5),
        });

        assert!(session.take_issued_for("prn-1").is_none());
    }

    #[test]
    fn test_issued_marker_within_ttl_is_returned_once() {
        let mut session = SessionStore::new();
        session.put_issued(IssuedNote {
            id: "prn-1".to_string(),
            prn_number: Some("ER2600001".to_string()),
            stored_at: Utc::now(),
        });

        let first = session.take_issued_for("prn-1");
        assert_eq!(
            first.and_then(|marker| marker.prn_number),
            Some("ER2600001".to_string())
        );
        assert!(session.take_issued_for("prn-1").is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = SessionStore::new();
        session.put_draft(draft("prn-9"));
        session.save(&path).unwrap();

        let loaded = SessionStore::load(&path).unwrap();
        assert!(loaded.draft_for("prn-9").is_some());
    }

    #[test]
    fn test_load_missing_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(session.draft_for("any").is_none());
    }
}
