//! Waste balance admission control
//!
//! Compares a candidate tonnage against the allowance available at decision
//! time. The gateway is queried fresh on every call; a figure read when
//! the draft was created is never reused, which closes the race between the
//! create page and the confirm page.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::BalanceGateway;
use crate::Result;

/// Outcome of an admission decision
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The candidate tonnage fits the available balance
    Admitted,
    /// Declined; carries the observed amount for logging only. The
    /// user-facing outcome stays a generic insufficient-balance signal
    Rejected { available: f64 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Admission controller over the balance gateway
pub struct AdmissionController {
    gateway: Arc<dyn BalanceGateway>,
}

impl AdmissionController {
    pub fn new(gateway: Arc<dyn BalanceGateway>) -> Self {
        Self { gateway }
    }

    /// Decide whether `tonnage` can be committed under the accreditation's
    /// current balance. A missing balance record admits as zero, the most
    /// restrictive reading rather than an unlimited allowance. Equality
    /// admits.
    pub async fn admit(
        &self,
        tonnage: u32,
        organisation_id: &str,
        accreditation_id: &str,
    ) -> Result<Admission> {
        let balance = self
            .gateway
            .waste_balance(organisation_id, accreditation_id)
            .await?;

        let available = match balance {
            Some(balance) => balance.available_amount,
            None => {
                warn!(accreditation_id, "No waste balance record, treating as zero");
                0.0
            }
        };

        if f64::from(tonnage) <= available {
            debug!(tonnage, available, "Tonnage admitted");
            Ok(Admission::Admitted)
        } else {
            debug!(tonnage, available, "Tonnage rejected");
            Ok(Admission::Rejected { available })
        }
    }

    /// Current balance snapshot for display, without a decision. `None`
    /// when the backend holds no record for the accreditation.
    pub async fn snapshot(
        &self,
        organisation_id: &str,
        accreditation_id: &str,
    ) -> Result<Option<crate::note::WasteBalance>> {
        self.gateway
            .waste_balance(organisation_id, accreditation_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn controller(backend: Arc<MemoryBackend>) -> AdmissionController {
        AdmissionController::new(backend)
    }

    #[tokio::test]
    async fn test_tonnage_below_balance_is_admitted() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_balance(150.0).await;

        let admission = controller(backend)
            .admit(100, "org-1", "acc-1")
            .await
            .unwrap();
        assert!(admission.is_admitted());
    }

    #[tokio::test]
    async fn test_equality_is_admitted() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_balance(100.0).await;

        let admission = controller(backend)
            .admit(100, "org-1", "acc-1")
            .await
            .unwrap();
        assert!(admission.is_admitted());
    }

    #[tokio::test]
    async fn test_excess_is_rejected_with_observed_amount() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_balance(50.0).await;

        let admission = controller(backend)
            .admit(100, "org-1", "acc-1")
            .await
            .unwrap();
        assert_eq!(admission, Admission::Rejected { available: 50.0 });
    }

    #[tokio::test]
    async fn test_missing_balance_record_admits_as_zero() {
        let backend = Arc::new(MemoryBackend::new());
        backend.clear_balance().await;

        let admission = controller(backend)
            .admit(1, "org-1", "acc-1")
            .await
            .unwrap();
        assert_eq!(admission, Admission::Rejected { available: 0.0 });
    }

    #[tokio::test]
    async fn test_every_admit_queries_the_gateway_fresh() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_balance(100.0).await;
        let controller = controller(backend.clone());

        controller.admit(10, "org-1", "acc-1").await.unwrap();
        controller.admit(10, "org-1", "acc-1").await.unwrap();
        controller.admit(10, "org-1", "acc-1").await.unwrap();

        assert_eq!(backend.balance_queries(), 3);
    }
}
