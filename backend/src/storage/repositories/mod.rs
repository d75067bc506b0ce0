pub mod bill_repository;
pub mod child_repository;
pub mod permission_repository;
pub mod record_repository;
pub mod registration_repository;
pub mod shift_repository;
pub mod team_repository;
pub mod tent_repository;

pub use bill_repository::BillRepository;
pub use child_repository::ChildRepository;
pub use permission_repository::PermissionRepository;
pub use record_repository::RecordRepository;
pub use registration_repository::RegistrationRepository;
pub use shift_repository::ShiftRepository;
pub use team_repository::TeamRepository;
pub use tent_repository::TentRepository;

use anyhow::{anyhow, Result};
use shared::Sex;

/// Decode the `sex` column
pub(crate) fn parse_sex(value: &str) -> Result<Sex> {
    Sex::parse(value).ok_or_else(|| anyhow!("Invalid stored sex '{}'", value))
}
