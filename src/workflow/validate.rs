//! Creation form validation
//!
//! Field-level checks over the raw form input. Failures re-render the form
//! with the submitted values preserved, so the error type carries one keyed
//! message per failing field rather than a single opaque string.

use serde::{Deserialize, Serialize};

/// Longest free-text note the backend accepts
pub const NOTES_MAX_LENGTH: usize = 500;

const MIN_TONNAGE: u32 = 1;

/// Raw form input as submitted, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateForm {
    /// Tonnage as typed; must parse to a positive whole number
    pub tonnage: String,
    /// Recipient organisation id from the directory select
    pub recipient: String,
    /// Optional free-text issuer notes
    pub notes: String,
    pub material: String,
    pub nation: String,
    pub waste_processing_type: String,
}

/// A validated creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub tonnage: u32,
    pub recipient_id: String,
    pub notes: Option<String>,
}

/// Form fields that can fail validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Tonnage,
    Recipient,
    Notes,
    Material,
    Nation,
    WasteProcessingType,
}

/// Message keys for field errors, resolved to localised text by the
/// presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKey {
    TonnageWholeNumber,
    TonnageGreaterThanZero,
    RecipientRequired,
    NotesTooLong,
    ClassificationRequired,
}

/// Field-keyed validation failures, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(Field, ErrorKey)>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, key: ErrorKey) {
        self.errors.push((field, key));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Field, ErrorKey)> {
        self.errors.iter()
    }

    pub fn key_for(&self, field: Field) -> Option<ErrorKey> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, key)| *key)
    }
}

/// Validate the raw form. On success returns the typed request; on failure
/// the caller re-renders with these errors and the original `CreateForm`.
pub fn validate(form: &CreateForm) -> Result<CreateRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let tonnage = match form.tonnage.trim().parse::<u32>() {
        Ok(value) if value >= MIN_TONNAGE => Some(value),
        Ok(_) => {
            errors.push(Field::Tonnage, ErrorKey::TonnageGreaterThanZero);
            None
        }
        Err(_) => {
            errors.push(Field::Tonnage, ErrorKey::TonnageWholeNumber);
            None
        }
    };

    if form.recipient.trim().is_empty() {
        errors.push(Field::Recipient, ErrorKey::RecipientRequired);
    }

    if form.notes.chars().count() > NOTES_MAX_LENGTH {
        errors.push(Field::Notes, ErrorKey::NotesTooLong);
    }

    if form.material.trim().is_empty() {
        errors.push(Field::Material, ErrorKey::ClassificationRequired);
    }
    if form.nation.trim().is_empty() {
        errors.push(Field::Nation, ErrorKey::ClassificationRequired);
    }
    if form.waste_processing_type.trim().is_empty() {
        errors.push(Field::WasteProcessingType, ErrorKey::ClassificationRequired);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let tonnage = tonnage.unwrap_or(MIN_TONNAGE);
    let notes = form.notes.trim();

    Ok(CreateRequest {
        tonnage,
        recipient_id: form.recipient.trim().to_string(),
        notes: if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CreateForm {
        CreateForm {
            tonnage: "100".to_string(),
            recipient: "producer-1".to_string(),
            notes: "Quarterly collection".to_string(),
            material: "glass".to_string(),
            nation: "england".to_string(),
            waste_processing_type: "reprocessor".to_string(),
        }
    }

    #[test]
    fn test_valid_form_produces_request() {
        let request = validate(&valid_form()).unwrap();
        assert_eq!(request.tonnage, 100);
        assert_eq!(request.recipient_id, "producer-1");
        assert_eq!(request.notes.as_deref(), Some("Quarterly collection"));
    }

    #[test]
    fn test_empty_notes_become_none() {
        let mut form = valid_form();
        form.notes = "   ".to_string();
        let request = validate(&form).unwrap();
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_zero_tonnage_rejected() {
        let mut form = valid_form();
        form.tonnage = "0".to_string();
        let errors = validate(&form).unwrap_err();
        assert_eq!(
            errors.key_for(Field::Tonnage),
            Some(ErrorKey::TonnageGreaterThanZero)
        );
    }

    #[test]
    fn test_fractional_or_garbage_tonnage_rejected() {
        for input in ["1.5", "ten", "", "-3"] {
            let mut form = valid_form();
            form.tonnage = input.to_string();
            let errors = validate(&form).unwrap_err();
            assert_eq!(
                errors.key_for(Field::Tonnage),
                Some(ErrorKey::TonnageWholeNumber),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_missing_recipient_rejected() {
        let mut form = valid_form();
        form.recipient = String::new();
        let errors = validate(&form).unwrap_err();
        assert_eq!(
            errors.key_for(Field::Recipient),
            Some(ErrorKey::RecipientRequired)
        );
    }

    #[test]
    fn test_oversized_notes_rejected() {
        let mut form = valid_form();
        form.notes = "x".repeat(NOTES_MAX_LENGTH + 1);
        let errors = validate(&form).unwrap_err();
        assert_eq!(errors.key_for(Field::Notes), Some(ErrorKey::NotesTooLong));
    }

    #[test]
    fn test_all_failures_reported_together() {
        let form = CreateForm {
            tonnage: "nope".to_string(),
            recipient: String::new(),
            notes: "y".repeat(NOTES_MAX_LENGTH + 1),
            material: String::new(),
            nation: "england".to_string(),
            waste_processing_type: "reprocessor".to_string(),
        };

        let errors = validate(&form).unwrap_err();
        assert_eq!(errors.iter().count(), 4);
    }
}
