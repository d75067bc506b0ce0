use tracing::info;

use crate::domain::errors::DomainResult;
use crate::domain::models::shift::Shift;
use crate::storage::repositories::{RegistrationRepository, ShiftRepository};

#[derive(Clone)]
pub struct ShiftService {
    shifts: ShiftRepository,
    registrations: RegistrationRepository,
}

impl ShiftService {
    pub fn new(shifts: ShiftRepository, registrations: RegistrationRepository) -> Self {
        Self { shifts, registrations }
    }

    /// Write the configured calendar into the database
    pub async fn seed_shifts(&self, shifts: &[Shift]) -> DomainResult<()> {
        for shift in shifts {
            self.shifts.upsert_shift(shift).await?;
        }
        info!(count = shifts.len(), "Shift calendar loaded");
        Ok(())
    }

    pub async fn list_shift_numbers(&self) -> DomainResult<Vec<i32>> {
        let shifts = self.shifts.list_shifts().await?;
        Ok(shifts.into_iter().map(|s| s.shift_nr).collect())
    }

    /// Contact addresses of everyone with a registered camper on the shift
    pub async fn shift_emails(&self, shift_nr: i32) -> DomainResult<Vec<String>> {
        Ok(self.registrations.contact_emails_for_shift(shift_nr).await?)
    }
}
