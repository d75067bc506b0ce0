use shared::{TentInfo, TentScore};
use tracing::info;

use crate::domain::age::current_year;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::record_service::MAX_TENT_NR;
use crate::storage::repositories::{RecordRepository, TentRepository};

/// Tent rosters and inspection scores
#[derive(Clone)]
pub struct TentService {
    tents: TentRepository,
    records: RecordRepository,
}

impl TentService {
    pub fn new(tents: TentRepository, records: RecordRepository) -> Self {
        Self { tents, records }
    }

    pub async fn tent_info(&self, shift_nr: i32, tent_nr: i32) -> DomainResult<TentInfo> {
        check_tent_nr(tent_nr)?;
        let year = current_year();

        let campers = self.records.campers_in_tent(shift_nr, year, tent_nr).await?;
        let scores = self.tents.list_scores(shift_nr, year, tent_nr).await?;
        Ok(TentInfo { campers, scores })
    }

    pub async fn add_score(&self, shift_nr: i32, tent_nr: i32, score: i32) -> DomainResult<TentScore> {
        check_tent_nr(tent_nr)?;
        let stored = self.tents.insert_score(shift_nr, current_year(), tent_nr, score).await?;
        info!(shift_nr, tent_nr, score, "Recorded tent score");
        Ok(stored)
    }

    /// Deleting a missing score is not an error
    pub async fn delete_score(&self, score_id: i64) -> DomainResult<()> {
        let removed = self.tents.delete_score(score_id).await?;
        info!(score_id, removed, "Deleted tent score");
        Ok(())
    }
}

fn check_tent_nr(tent_nr: i32) -> DomainResult<()> {
    if (1..=MAX_TENT_NR).contains(&tent_nr) {
        Ok(())
    } else {
        Err(DomainError::validation("tentNr", format!("must be between 1 and {}", MAX_TENT_NR)))
    }
}
