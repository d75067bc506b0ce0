use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use tracing::info;

use crate::storage::repositories::registration_repository::RegistrationRepository;

/// Process-wide order counter for registration submissions.
///
/// Constructed once at startup and shared through `Arc`. Every submission
/// draws exactly one number; numbers drawn by failed submissions are not
/// returned.
#[derive(Debug)]
pub struct RegOrder {
    last: AtomicI64,
}

impl RegOrder {
    pub fn new(seed: i64) -> Self {
        Self { last: AtomicI64::new(seed) }
    }

    /// Seed from the highest order number already persisted
    pub async fn seeded_from(repository: &RegistrationRepository) -> Result<Self> {
        let seed = repository.max_reg_order().await?.unwrap_or(0);
        info!(seed, "Registration order counter seeded");
        Ok(Self::new(seed))
    }

    pub fn next_order(&self) -> i64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[cfg(test)]
    pub fn current(&self) -> i64 {
        self.last.load(Ordering::SeqCst)
    }
}
