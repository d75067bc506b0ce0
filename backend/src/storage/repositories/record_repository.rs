use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::parse_sex;
use crate::domain::models::record::{NewRecord, Record, RecordDetails, RecordPatch, RecordStatus};
use crate::storage::connection::DbConnection;

/// Repository for attendance records
#[derive(Clone)]
pub struct RecordRepository {
    db: DbConnection,
}

impl RecordRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Every record of a shift-year, active or not, ordered by child
    pub async fn statuses_for_shift(&self, shift_nr: i32, year: i32) -> Result<Vec<RecordStatus>> {
        let rows = sqlx::query(
            r#"
            SELECT id, child_id, is_active
            FROM records
            WHERE shift_nr = ? AND year = ?
            ORDER BY child_id ASC
            "#,
        )
        .bind(shift_nr)
        .bind(year)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| RecordStatus {
                id: row.get("id"),
                child_id: row.get("child_id"),
                is_active: row.get("is_active"),
            })
            .collect())
    }

    pub async fn insert_records(&self, records: &[NewRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO records (child_id, shift_nr, year, is_active, age_at_camp) ");
        builder.push_values(records, |mut b, record| {
            b.push_bind(record.child_id)
                .push_bind(record.shift_nr)
                .push_bind(record.year)
                .push_bind(record.is_active)
                .push_bind(record.age_at_camp);
        });

        let result = builder.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected())
    }

    pub async fn set_active(&self, record_ids: &[i64], is_active: bool) -> Result<u64> {
        if record_ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE records SET is_active = ");
        builder.push_bind(is_active);
        builder.push(", updated_at = CURRENT_TIMESTAMP WHERE id IN (");
        let mut ids = builder.separated(", ");
        for id in record_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let result = builder.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected())
    }

    /// Insert the record or, when the (child, shift, year) row exists, only flip its active flag
    pub async fn upsert_active(&self, record: &NewRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO records (child_id, shift_nr, year, is_active, age_at_camp)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (child_id, shift_nr, year)
            DO UPDATE SET is_active = excluded.is_active, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(record.child_id)
        .bind(record.shift_nr)
        .bind(record.year)
        .bind(record.is_active)
        .bind(record.age_at_camp)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_record(&self, record_id: i64) -> Result<Option<Record>> {
        let row = sqlx::query(
            r#"
            SELECT id, child_id, shift_nr, year, is_active, tent_nr, team_id, is_present, age_at_camp
            FROM records
            WHERE id = ?
            "#,
        )
        .bind(record_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(map_record))
    }

    pub async fn update_record(&self, record_id: i64, patch: &RecordPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE records SET ");
        let mut fields = builder.separated(", ");
        if let Some(tent_nr) = patch.tent_nr {
            fields.push("tent_nr = ").push_bind_unseparated(tent_nr);
        }
        if let Some(team_id) = patch.team_id {
            fields.push("team_id = ").push_bind_unseparated(team_id);
        }
        if let Some(is_present) = patch.is_present {
            fields.push("is_present = ").push_bind_unseparated(is_present);
        }
        fields.push("updated_at = CURRENT_TIMESTAMP");
        builder.push(" WHERE id = ").push_bind(record_id);

        builder.build().execute(self.db.pool()).await?;
        Ok(())
    }

    /// Active records of a shift-year with camper and team names
    pub async fn list_active(&self, shift_nr: i32, year: i32) -> Result<Vec<RecordDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT rc.id, rc.child_id, rc.shift_nr, rc.year, rc.is_active, rc.tent_nr, rc.team_id,
                   rc.is_present, rc.age_at_camp, c.name AS child_name, c.sex AS child_sex,
                   t.name AS team_name
            FROM records rc
            JOIN children c ON c.id = rc.child_id
            LEFT JOIN teams t ON t.id = rc.team_id
            WHERE rc.shift_nr = ? AND rc.year = ? AND rc.is_active = 1
            ORDER BY c.name ASC, rc.id ASC
            "#,
        )
        .bind(shift_nr)
        .bind(year)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let sex: String = row.get("child_sex");
                Ok(RecordDetails {
                    record: map_record(row),
                    child_name: row.get("child_name"),
                    child_sex: parse_sex(&sex)?,
                    team_name: row.get("team_name"),
                })
            })
            .collect()
    }

    /// Names of the active campers sleeping in a tent
    pub async fn campers_in_tent(&self, shift_nr: i32, year: i32, tent_nr: i32) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.name
            FROM records rc
            JOIN children c ON c.id = rc.child_id
            WHERE rc.shift_nr = ? AND rc.year = ? AND rc.tent_nr = ? AND rc.is_active = 1
            ORDER BY c.name ASC
            "#,
        )
        .bind(shift_nr)
        .bind(year)
        .bind(tent_nr)
        .fetch_all(self.db.pool())
        .await?;
        Ok(names)
    }
}

fn map_record(row: &SqliteRow) -> Record {
    Record {
        id: row.get("id"),
        child_id: row.get("child_id"),
        shift_nr: row.get("shift_nr"),
        year: row.get("year"),
        is_active: row.get("is_active"),
        tent_nr: row.get("tent_nr"),
        team_id: row.get("team_id"),
        is_present: row.get("is_present"),
        age_at_camp: row.get("age_at_camp"),
    }
}
