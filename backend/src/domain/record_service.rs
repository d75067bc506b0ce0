use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::age::{age_at, current_year};
use crate::domain::commands::records::SyncReport;
use crate::domain::errors::{DomainError, DomainResult, FieldErrors};
use crate::domain::models::record::{NewRecord, Record, RecordDetails, RecordPatch, RecordStatus};
use crate::domain::models::registration::RegistrationStatus;
use crate::storage::repositories::{RecordRepository, RegistrationRepository, ShiftRepository, TeamRepository};

pub const MAX_TENT_NR: i32 = 10;

/// Writes needed to bring a shift's records in line with its registrations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    /// Children to create an active record for, with the birthday used for age-at-camp
    pub creates: Vec<(i64, NaiveDate)>,
    pub activate: Vec<i64>,
    pub deactivate: Vec<i64>,
}

/// Compare registrations with existing records without touching storage.
///
/// A child counts as registered when any of their visible rows on the shift
/// is registered. Records without a registration are left alone.
pub fn plan_sync(registrations: &[RegistrationStatus], records: &[RecordStatus]) -> SyncPlan {
    let mut wanted: BTreeMap<i64, (bool, NaiveDate)> = BTreeMap::new();
    for registration in registrations {
        let entry = wanted
            .entry(registration.child_id)
            .or_insert((false, registration.birthday));
        entry.0 |= registration.is_registered;
    }

    let existing: BTreeMap<i64, &RecordStatus> = records.iter().map(|r| (r.child_id, r)).collect();

    let mut plan = SyncPlan::default();
    for (child_id, (registered, birthday)) in wanted {
        match existing.get(&child_id) {
            Some(record) if record.is_active != registered => {
                if registered {
                    plan.activate.push(record.id);
                } else {
                    plan.deactivate.push(record.id);
                }
            }
            Some(_) => {}
            None if registered => plan.creates.push((child_id, birthday)),
            None => {}
        }
    }
    plan
}

/// Keeps attendance records in step with registrations
#[derive(Clone)]
pub struct RecordService {
    records: RecordRepository,
    registrations: RegistrationRepository,
    shifts: ShiftRepository,
    teams: TeamRepository,
}

impl RecordService {
    pub fn new(
        records: RecordRepository,
        registrations: RegistrationRepository,
        shifts: ShiftRepository,
        teams: TeamRepository,
    ) -> Self {
        Self { records, registrations, shifts, teams }
    }

    /// Reconcile this year's records of a shift. Running it twice writes nothing the second time.
    pub async fn sync_shift_records(&self, shift_nr: i32) -> DomainResult<SyncReport> {
        let shift = self
            .shifts
            .get_shift(shift_nr)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("shift {}", shift_nr)))?;
        let year = current_year();

        let registrations = self.registrations.statuses_for_shift(shift_nr).await?;
        let records = self.records.statuses_for_shift(shift_nr, year).await?;
        let plan = plan_sync(&registrations, &records);

        let new_records: Vec<NewRecord> = plan
            .creates
            .iter()
            .map(|(child_id, birthday)| NewRecord {
                child_id: *child_id,
                shift_nr,
                year,
                is_active: true,
                age_at_camp: age_at(*birthday, shift.start_date),
            })
            .collect();

        let report = SyncReport {
            created: self.records.insert_records(&new_records).await? as usize,
            activated: self.records.set_active(&plan.activate, true).await? as usize,
            deactivated: self.records.set_active(&plan.deactivate, false).await? as usize,
        };

        info!(shift_nr, year, ?report, "Synchronized shift records");
        Ok(report)
    }

    /// Single-child counterpart of the shift sync, run when a registration flag changes
    pub async fn toggle_record(&self, child_id: i64, shift_nr: i32, is_registered: bool) -> DomainResult<()> {
        let shift = self.shifts.get_shift(shift_nr).await?;
        let birthday = self.registrations.birthday_for_child(child_id).await?;

        let age_at_camp = match (shift, birthday) {
            (Some(shift), Some(birthday)) => age_at(birthday, shift.start_date),
            _ => {
                warn!(child_id, shift_nr, "Shift start or birthday unknown, storing age 0");
                0
            }
        };

        self.records
            .upsert_active(&NewRecord {
                child_id,
                shift_nr,
                year: current_year(),
                is_active: is_registered,
                age_at_camp,
            })
            .await?;

        info!(child_id, shift_nr, is_registered, "Toggled record");
        Ok(())
    }

    pub async fn get_record(&self, record_id: i64) -> DomainResult<Record> {
        self.records
            .get_record(record_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("record {}", record_id)))
    }

    pub async fn list_records(&self, shift_nr: i32) -> DomainResult<Vec<RecordDetails>> {
        Ok(self.records.list_active(shift_nr, current_year()).await?)
    }

    /// Apply tent, team and presence changes after validating them against the record's shift
    pub async fn patch_record(&self, record: &Record, patch: &RecordPatch) -> DomainResult<()> {
        let mut errors = FieldErrors::new();

        if let Some(Some(tent_nr)) = patch.tent_nr {
            if !(1..=MAX_TENT_NR).contains(&tent_nr) {
                errors.insert("tentNr", format!("must be between 1 and {}", MAX_TENT_NR));
            }
        }

        if let Some(Some(team_id)) = patch.team_id {
            let team = self.teams.get_team(team_id).await?;
            let valid = team.is_some_and(|t| t.shift_nr == record.shift_nr && t.year == current_year());
            if !valid {
                errors.insert("teamId", "team does not belong to this shift");
            }
        }

        errors.into_result()?;
        self.records.update_record(record.id, patch).await?;
        info!(record_id = record.id, ?patch, "Updated record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;
    use crate::test_utils::{insert_registration, insert_test_child, seed_shift};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn status(child_id: i64, is_registered: bool) -> RegistrationStatus {
        RegistrationStatus { child_id, is_registered, birthday: date(2012, 5, 17) }
    }

    fn record(id: i64, child_id: i64, is_active: bool) -> RecordStatus {
        RecordStatus { id, child_id, is_active }
    }

    #[test]
    fn test_plan_covers_every_transition() {
        let plan = plan_sync(
            &[status(1, true), status(2, false), status(3, true), status(4, false), status(5, true)],
            &[record(10, 1, false), record(20, 2, true), record(30, 3, true)],
        );

        assert_eq!(plan.activate, vec![10]);
        assert_eq!(plan.deactivate, vec![20]);
        assert_eq!(plan.creates, vec![(5, date(2012, 5, 17))]);
    }

    #[test]
    fn test_any_registered_row_counts_for_the_child() {
        let plan = plan_sync(&[status(1, false), status(1, true)], &[]);
        assert_eq!(plan.creates.len(), 1);

        let plan = plan_sync(&[status(1, false), status(1, false)], &[]);
        assert_eq!(plan, SyncPlan::default());
    }

    async fn setup() -> (DbConnection, RecordService) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let service = RecordService::new(
            RecordRepository::new(db.clone()),
            RegistrationRepository::new(db.clone()),
            ShiftRepository::new(db.clone()),
            TeamRepository::new(db.clone()),
        );
        (db, service)
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let (db, service) = setup().await;
        seed_shift(&db, 2).await;
        let mari = insert_test_child(&db, "Mari", "F").await;
        let jaan = insert_test_child(&db, "Jaan", "M").await;
        insert_registration(&db, mari, 2, "a@example.com", true).await;
        insert_registration(&db, jaan, 2, "b@example.com", false).await;

        let first = service.sync_shift_records(2).await.unwrap();
        assert_eq!(first, SyncReport { created: 1, activated: 0, deactivated: 0 });

        let second = service.sync_shift_records(2).await.unwrap();
        assert_eq!(second.writes(), 0);

        let records = service.list_records(2).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].child_name, "Mari");
    }

    #[tokio::test]
    async fn test_sync_deactivates_after_unregistering() {
        let (db, service) = setup().await;
        seed_shift(&db, 2).await;
        let mari = insert_test_child(&db, "Mari", "F").await;
        let registration = insert_registration(&db, mari, 2, "a@example.com", true).await;
        service.sync_shift_records(2).await.unwrap();

        sqlx::query("UPDATE registrations SET is_registered = 0 WHERE id = ?")
            .bind(registration)
            .execute(db.pool())
            .await
            .unwrap();

        let report = service.sync_shift_records(2).await.unwrap();
        assert_eq!(report, SyncReport { created: 0, activated: 0, deactivated: 1 });
        assert!(service.list_records(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_unknown_shift() {
        let (_, service) = setup().await;
        assert!(matches!(service.sync_shift_records(9).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_creates_with_registered_flag_then_flips() {
        let (db, service) = setup().await;
        seed_shift(&db, 2).await;
        let mari = insert_test_child(&db, "Mari", "F").await;
        insert_registration(&db, mari, 2, "a@example.com", false).await;

        service.toggle_record(mari, 2, false).await.unwrap();
        assert!(service.list_records(2).await.unwrap().is_empty());

        service.toggle_record(mari, 2, true).await.unwrap();
        let records = service.list_records(2).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].record.age_at_camp > 0);
    }

    #[tokio::test]
    async fn test_toggle_without_shift_stores_age_zero() {
        let (db, service) = setup().await;
        let mari = insert_test_child(&db, "Mari", "F").await;

        service.toggle_record(mari, 5, true).await.unwrap();
        assert_eq!(service.list_records(5).await.unwrap()[0].record.age_at_camp, 0);
    }

    #[tokio::test]
    async fn test_patch_validation() {
        let (db, service) = setup().await;
        seed_shift(&db, 2).await;
        let mari = insert_test_child(&db, "Mari", "F").await;
        service.toggle_record(mari, 2, true).await.unwrap();
        let record = service.list_records(2).await.unwrap().remove(0).record;

        let other_shift = TeamRepository::new(db.clone()).insert_team(3, "Sinised", current_year()).await.unwrap();
        let own = TeamRepository::new(db.clone()).insert_team(2, "Punased", current_year()).await.unwrap();

        let bad = RecordPatch { tent_nr: Some(Some(11)), team_id: Some(Some(other_shift.id)), ..Default::default() };
        match service.patch_record(&record, &bad).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.get("tentNr").is_some());
                assert!(errors.get("teamId").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let good = RecordPatch { tent_nr: Some(Some(10)), team_id: Some(Some(own.id)), is_present: Some(true) };
        service.patch_record(&record, &good).await.unwrap();

        let details = service.list_records(2).await.unwrap().remove(0);
        assert_eq!(details.record.tent_nr, Some(10));
        assert_eq!(details.team_name.as_deref(), Some("Punased"));
    }
}
