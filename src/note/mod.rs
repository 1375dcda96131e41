//! Packaging recycling note data model
//!
//! Wire types for the note resource exposed by the EPR backend, plus the
//! lifecycle state machine in [`status`]. Field names serialise in the
//! backend's camelCase convention.

pub mod status;

pub use status::{NoteAction, NoteStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The path triple every backend note operation is keyed by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccreditationScope {
    /// Issuing organisation ID
    pub organisation_id: String,
    /// Registration ID
    pub registration_id: String,
    /// Accreditation ID (the unit the waste balance is tracked against)
    pub accreditation_id: String,
}

impl AccreditationScope {
    pub fn new(
        organisation_id: impl Into<String>,
        registration_id: impl Into<String>,
        accreditation_id: impl Into<String>,
    ) -> Self {
        Self {
            organisation_id: organisation_id.into(),
            registration_id: registration_id.into(),
            accreditation_id: accreditation_id.into(),
        }
    }
}

/// The recipient a note is issued to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToOrganisation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trading_name: Option<String>,
}

impl IssuedToOrganisation {
    /// Display name, preferring the trading name over the legal name
    pub fn display_name(&self) -> &str {
        self.trading_name.as_deref().unwrap_or(&self.name)
    }
}

/// Whether the issuing accreditation reprocesses or exports waste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteProcessingType {
    Reprocessor,
    Exporter,
}

impl WasteProcessingType {
    /// The note-type display name this processing type issues
    pub fn note_type(&self) -> &'static str {
        match self {
            WasteProcessingType::Reprocessor => "PRN",
            WasteProcessingType::Exporter => "PERN",
        }
    }
}

impl Default for WasteProcessingType {
    fn default() -> Self {
        WasteProcessingType::Reprocessor
    }
}

/// A packaging recycling note as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Opaque ID assigned at draft creation, stable for the note's lifetime
    pub id: String,
    /// Note number, assigned by the backend only when the note is issued
    #[serde(default)]
    pub prn_number: Option<String>,
    pub status: NoteStatus,
    pub issued_to_organisation: IssuedToOrganisation,
    /// Whole tonnes; write-once at creation
    pub tonnage: u32,
    pub material: String,
    #[serde(default)]
    pub nation: Option<String>,
    #[serde(default)]
    pub waste_processing_type: WasteProcessingType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_december_waste: bool,
    #[serde(default)]
    pub process_to_be_used: Option<String>,
    #[serde(default)]
    pub tonnage_in_words: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accreditation_year: Option<i32>,
}

/// Payload for creating a draft note
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotePayload {
    pub issued_to_organisation: IssuedToOrganisation,
    pub tonnage: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A recipient from the waste organisations directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub trading_name: Option<String>,
}

impl Recipient {
    pub fn display_name(&self) -> &str {
        self.trading_name.as_deref().unwrap_or(&self.name)
    }
}

/// A registration with its accreditation, fetched alongside a note when a
/// page needs both
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: String,
    pub material: String,
    #[serde(default)]
    pub nation: Option<String>,
    #[serde(default)]
    pub waste_processing_type: WasteProcessingType,
    #[serde(default)]
    pub site_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accreditation {
    pub id: String,
    #[serde(default)]
    pub accreditation_number: Option<String>,
}

/// Registration context returned by the backend in one read
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationContext {
    pub registration: Registration,
    #[serde(default)]
    pub accreditation: Option<Accreditation>,
    /// Issuing organisation's company name, used as the "issued by" line
    #[serde(default)]
    pub organisation_name: Option<String>,
}

/// Point-in-time waste balance for an accreditation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteBalance {
    pub available_amount: f64,
}
