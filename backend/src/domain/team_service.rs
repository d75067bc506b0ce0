use shared::Team;
use tracing::info;

use crate::domain::age::current_year;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::identity::normalize_name;
use crate::storage::repositories::TeamRepository;

#[derive(Clone)]
pub struct TeamService {
    teams: TeamRepository,
}

impl TeamService {
    pub fn new(teams: TeamRepository) -> Self {
        Self { teams }
    }

    /// This year's teams of a shift
    pub async fn list_teams(&self, shift_nr: i32) -> DomainResult<Vec<Team>> {
        Ok(self.teams.list_teams(shift_nr, current_year()).await?)
    }

    pub async fn create_team(&self, shift_nr: i32, name: &str) -> DomainResult<Team> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(DomainError::validation("name", "property is required"));
        }

        let team = self.teams.insert_team(shift_nr, &name, current_year()).await?;
        info!(team_id = team.id, shift_nr, "Created team {}", team.name);
        Ok(team)
    }
}
