use anyhow::Result;
use sqlx::Row;
use shared::TentScore;

use crate::storage::connection::DbConnection;

/// Repository for tent inspection scores
#[derive(Clone)]
pub struct TentRepository {
    db: DbConnection,
}

impl TentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Scores of one tent in the order they were given
    pub async fn list_scores(&self, shift_nr: i32, year: i32, tent_nr: i32) -> Result<Vec<TentScore>> {
        let rows = sqlx::query(
            r#"
            SELECT id, score, created_at
            FROM tent_scores
            WHERE shift_nr = ? AND year = ? AND tent_nr = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(shift_nr)
        .bind(year)
        .bind(tent_nr)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| TentScore {
                id: row.get("id"),
                score: row.get("score"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn insert_score(&self, shift_nr: i32, year: i32, tent_nr: i32, score: i32) -> Result<TentScore> {
        let row = sqlx::query(
            r#"
            INSERT INTO tent_scores (shift_nr, year, tent_nr, score)
            VALUES (?, ?, ?, ?)
            RETURNING id, score, created_at
            "#,
        )
        .bind(shift_nr)
        .bind(year)
        .bind(tent_nr)
        .bind(score)
        .fetch_one(self.db.pool())
        .await?;

        Ok(TentScore {
            id: row.get("id"),
            score: row.get("score"),
            created_at: row.get("created_at"),
        })
    }

    /// Returns how many rows were removed
    pub async fn delete_score(&self, score_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tent_scores WHERE id = ?")
            .bind(score_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
