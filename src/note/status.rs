//! Note lifecycle state machine
//!
//! Pure decision logic: given a current status and a requested action,
//! decide whether the transition is legal and what the resulting status is.
//! Callers treat an illegal transition as a redirect outcome, never an
//! error, which is what makes re-submitted pages harmless.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a note.
///
/// The known variants form a closed set for transition decisions. Statuses
/// the backend may introduce that this build does not know are kept verbatim
/// in `Unknown`: they render as-is and match no transition precondition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteStatus {
    Draft,
    AwaitingAuthorisation,
    AwaitingAcceptance,
    Accepted,
    AwaitingCancellation,
    Cancelled,
    Discarded,
    /// Display-only passthrough for unrecognised backend statuses
    Unknown(String),
}

/// Actions the workflow can apply to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    /// Confirm a reviewed draft (balance check passed)
    Confirm,
    /// Discard an abandoned or inadmissible draft
    Discard,
    /// Issue an authorised note to its recipient
    Issue,
    /// Delete a note that has not yet been issued
    Delete,
    /// Confirm a requested cancellation
    Cancel,
    /// Recipient acceptance, observed from the backend rather than driven
    Accept,
}

impl NoteStatus {
    /// The status an action leads to from `self`, or `None` when the
    /// action's precondition does not hold.
    pub fn apply(&self, action: NoteAction) -> Option<NoteStatus> {
        use NoteAction::*;
        use NoteStatus::*;

        match (self, action) {
            (Draft, Confirm) => Some(AwaitingAuthorisation),
            (Draft, Discard) => Some(Discarded),
            (AwaitingAuthorisation, Issue) => Some(AwaitingAcceptance),
            (AwaitingAuthorisation, Delete) => Some(Cancelled),
            (AwaitingAcceptance, Accept) => Some(Accepted),
            (AwaitingCancellation, Cancel) => Some(Cancelled),
            _ => None,
        }
    }

    /// Whether `action` is legal from this status
    pub fn allows(&self, action: NoteAction) -> bool {
        self.apply(action).is_some()
    }

    /// Terminal statuses admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NoteStatus::Accepted | NoteStatus::Cancelled | NoteStatus::Discarded
        )
    }

    /// The wire tag for this status. Unknown statuses return their
    /// original tag unchanged.
    pub fn as_str(&self) -> &str {
        match self {
            NoteStatus::Draft => "draft",
            NoteStatus::AwaitingAuthorisation => "awaiting_authorisation",
            NoteStatus::AwaitingAcceptance => "awaiting_acceptance",
            NoteStatus::Accepted => "accepted",
            NoteStatus::AwaitingCancellation => "awaiting_cancellation",
            NoteStatus::Cancelled => "cancelled",
            NoteStatus::Discarded => "discarded",
            NoteStatus::Unknown(tag) => tag,
        }
    }

    /// Human-readable label for status tags. Unrecognised tags display
    /// verbatim rather than failing.
    pub fn label(&self) -> &str {
        match self {
            NoteStatus::Draft => "Draft",
            NoteStatus::AwaitingAuthorisation => "Awaiting authorisation",
            NoteStatus::AwaitingAcceptance => "Awaiting acceptance",
            NoteStatus::Accepted => "Accepted",
            NoteStatus::AwaitingCancellation => "Awaiting cancellation",
            NoteStatus::Cancelled => "Cancelled",
            NoteStatus::Discarded => "Discarded",
            NoteStatus::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for NoteStatus {
    fn from(tag: &str) -> Self {
        match tag {
            "draft" => NoteStatus::Draft,
            "awaiting_authorisation" => NoteStatus::AwaitingAuthorisation,
            "awaiting_acceptance" => NoteStatus::AwaitingAcceptance,
            "accepted" => NoteStatus::Accepted,
            "awaiting_cancellation" => NoteStatus::AwaitingCancellation,
            "cancelled" => NoteStatus::Cancelled,
            "discarded" => NoteStatus::Discarded,
            other => NoteStatus::Unknown(other.to_string()),
        }
    }
}

impl FromStr for NoteStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(NoteStatus::from(s))
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NoteStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NoteStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(NoteStatus::from(tag.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [NoteAction; 6] = [
        NoteAction::Confirm,
        NoteAction::Discard,
        NoteAction::Issue,
        NoteAction::Delete,
        NoteAction::Cancel,
        NoteAction::Accept,
    ];

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            NoteStatus::Draft.apply(NoteAction::Confirm),
            Some(NoteStatus::AwaitingAuthorisation)
        );
        assert_eq!(
            NoteStatus::Draft.apply(NoteAction::Discard),
            Some(NoteStatus::Discarded)
        );
        assert_eq!(
            NoteStatus::AwaitingAuthorisation.apply(NoteAction::Issue),
            Some(NoteStatus::AwaitingAcceptance)
        );
        assert_eq!(
            NoteStatus::AwaitingAuthorisation.apply(NoteAction::Delete),
            Some(NoteStatus::Cancelled)
        );
        assert_eq!(
            NoteStatus::AwaitingAcceptance.apply(NoteAction::Accept),
            Some(NoteStatus::Accepted)
        );
        assert_eq!(
            NoteStatus::AwaitingCancellation.apply(NoteAction::Cancel),
            Some(NoteStatus::Cancelled)
        );
    }

    #[test]
    fn test_terminal_statuses_admit_nothing() {
        for status in [
            NoteStatus::Accepted,
            NoteStatus::Cancelled,
            NoteStatus::Discarded,
        ] {
            assert!(status.is_terminal());
            for action in ALL_ACTIONS {
                assert_eq!(status.apply(action), None);
            }
        }
    }

    #[test]
    fn test_delete_does_not_apply_to_draft() {
        assert!(!NoteStatus::Draft.allows(NoteAction::Delete));
        assert!(!NoteStatus::Draft.allows(NoteAction::Issue));
    }

    #[test]
    fn test_issue_requires_awaiting_authorisation() {
        for status in [
            NoteStatus::Draft,
            NoteStatus::AwaitingAcceptance,
            NoteStatus::Accepted,
            NoteStatus::AwaitingCancellation,
            NoteStatus::Cancelled,
            NoteStatus::Discarded,
        ] {
            assert!(!status.allows(NoteAction::Issue));
        }
    }

    #[test]
    fn test_unknown_status_matches_no_precondition() {
        let status = NoteStatus::Unknown("under_review".to_string());
        for action in ALL_ACTIONS {
            assert_eq!(status.apply(action), None);
        }
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_unknown_status_round_trips_verbatim() {
        let status: NoteStatus = "under_review".parse().unwrap();
        assert_eq!(status, NoteStatus::Unknown("under_review".to_string()));
        assert_eq!(status.label(), "under_review");

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#""under_review""#);

        let back: NoteStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_known_status_serde_round_trip() {
        let json = serde_json::to_string(&NoteStatus::AwaitingAuthorisation).unwrap();
        assert_eq!(json, r#""awaiting_authorisation""#);

        let back: NoteStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NoteStatus::AwaitingAuthorisation);
    }
}
