//! Redirect targets for workflow steps
//!
//! Every POST step resolves to a redirect so a reload can never re-trigger
//! the mutation. Targets are a closed enum rendered to paths in one place;
//! recoverable errors travel as query indicators, never as raw messages or
//! balance figures.

use crate::note::AccreditationScope;

/// Recoverable error indicator carried to the page a user can retry from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionIndicator {
    /// Issuing failed for a retryable reason
    IssueFailed,
}

/// Where a workflow step sends the browser next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// The create form; optionally flagging that the balance no longer
    /// covers the attempted tonnage
    Create { insufficient_balance: bool },
    /// The check/view page for a note
    View { note_id: String },
    /// The action page for a note, with an optional recoverable error
    Action {
        note_id: String,
        indicator: Option<ActionIndicator>,
    },
    /// Post-confirmation success page
    Created { note_id: String },
    /// Post-issue success page
    Issued { note_id: String },
    /// Post-cancellation confirmation page
    Cancelled { note_id: String },
    /// The notes list
    List,
    /// The generic error page
    Error,
}

impl Redirect {
    pub fn view(note_id: impl Into<String>) -> Self {
        Redirect::View {
            note_id: note_id.into(),
        }
    }

    pub fn action(note_id: impl Into<String>) -> Self {
        Redirect::Action {
            note_id: note_id.into(),
            indicator: None,
        }
    }

    pub fn action_with(note_id: impl Into<String>, indicator: ActionIndicator) -> Self {
        Redirect::Action {
            note_id: note_id.into(),
            indicator: Some(indicator),
        }
    }

    pub fn create() -> Self {
        Redirect::Create {
            insufficient_balance: false,
        }
    }

    pub fn create_insufficient_balance() -> Self {
        Redirect::Create {
            insufficient_balance: true,
        }
    }

    /// Render the target as a site path under the accreditation scope
    pub fn path(&self, scope: &AccreditationScope) -> String {
        let base = format!(
            "/organisations/{}/registrations/{}/accreditations/{}/packaging-recycling-notes",
            scope.organisation_id, scope.registration_id, scope.accreditation_id
        );

        match self {
            Redirect::Create {
                insufficient_balance: false,
            } => format!("{}/create", base),
            Redirect::Create {
                insufficient_balance: true,
            } => format!("{}/create?error=insufficient_balance", base),
            Redirect::View { note_id } => format!("{}/{}/view", base, note_id),
            Redirect::Action {
                note_id,
                indicator: None,
            } => format!("{}/{}", base, note_id),
            Redirect::Action {
                note_id,
                indicator: Some(ActionIndicator::IssueFailed),
            } => format!("{}/{}?error=issue_failed", base, note_id),
            Redirect::Created { note_id } => format!("{}/{}/created", base, note_id),
            Redirect::Issued { note_id } => format!("{}/{}/issued", base, note_id),
            Redirect::Cancelled { note_id } => format!("{}/{}/cancelled", base, note_id),
            Redirect::List => base,
            Redirect::Error => format!("/organisations/{}/error", scope.organisation_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> AccreditationScope {
        AccreditationScope::new("org-1", "reg-2", "acc-3")
    }

    #[test]
    fn test_create_paths() {
        assert_eq!(
            Redirect::create().path(&scope()),
            "/organisations/org-1/registrations/reg-2/accreditations/acc-3/packaging-recycling-notes/create"
        );
        assert!(Redirect::create_insufficient_balance()
            .path(&scope())
            .ends_with("create?error=insufficient_balance"));
    }

    #[test]
    fn test_action_path_carries_indicator() {
        assert!(Redirect::action("prn-1").path(&scope()).ends_with("/prn-1"));
        assert!(
            Redirect::action_with("prn-1", ActionIndicator::IssueFailed)
                .path(&scope())
                .ends_with("/prn-1?error=issue_failed")
        );
    }

    #[test]
    fn test_insufficient_balance_indicator_carries_no_amount() {
        let path = Redirect::create_insufficient_balance().path(&scope());
        assert!(!path.contains("amount"));
        assert!(!path.contains('.'));
    }

    #[test]
    fn test_error_page_is_scoped_to_organisation() {
        assert_eq!(Redirect::Error.path(&scope()), "/organisations/org-1/error");
    }
}
