use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use shared::Team;

use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct TeamRepository {
    db: DbConnection,
}

impl TeamRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn list_teams(&self, shift_nr: i32, year: i32) -> Result<Vec<Team>> {
        let rows = sqlx::query(
            r#"
            SELECT id, shift_nr, name, year, place, captain_id
            FROM teams
            WHERE shift_nr = ? AND year = ?
            ORDER BY id ASC
            "#,
        )
        .bind(shift_nr)
        .bind(year)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(map_team).collect())
    }

    pub async fn get_team(&self, team_id: i64) -> Result<Option<Team>> {
        let row = sqlx::query(
            r#"
            SELECT id, shift_nr, name, year, place, captain_id
            FROM teams
            WHERE id = ?
            "#,
        )
        .bind(team_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(map_team))
    }

    pub async fn insert_team(&self, shift_nr: i32, name: &str, year: i32) -> Result<Team> {
        let result = sqlx::query(
            r#"
            INSERT INTO teams (shift_nr, name, year)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(shift_nr)
        .bind(name)
        .bind(year)
        .execute(self.db.pool())
        .await?;

        Ok(Team {
            id: result.last_insert_rowid(),
            shift_nr,
            name: name.to_string(),
            year,
            place: None,
            captain_id: None,
        })
    }
}

fn map_team(row: &SqliteRow) -> Team {
    Team {
        id: row.get("id"),
        shift_nr: row.get("shift_nr"),
        name: row.get("name"),
        year: row.get("year"),
        place: row.get("place"),
        captain_id: row.get("captain_id"),
    }
}
