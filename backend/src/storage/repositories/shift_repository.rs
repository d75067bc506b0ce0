use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::shift::Shift;
use crate::storage::connection::{format_date, parse_date, DbConnection};

#[derive(Clone)]
pub struct ShiftRepository {
    db: DbConnection,
}

impl ShiftRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn upsert_shift(&self, shift: &Shift) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shifts (shift_nr, start_date, length_days, boss_name, boss_email, boss_phone)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (shift_nr)
            DO UPDATE SET start_date = excluded.start_date, length_days = excluded.length_days,
                          boss_name = excluded.boss_name, boss_email = excluded.boss_email,
                          boss_phone = excluded.boss_phone
            "#,
        )
        .bind(shift.shift_nr)
        .bind(format_date(shift.start_date))
        .bind(shift.length_days)
        .bind(&shift.boss_name)
        .bind(&shift.boss_email)
        .bind(&shift.boss_phone)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_shift(&self, shift_nr: i32) -> Result<Option<Shift>> {
        let row = sqlx::query(
            r#"
            SELECT shift_nr, start_date, length_days, boss_name, boss_email, boss_phone FROM shifts WHERE shift_nr = ?
            "#,
        )
        .bind(shift_nr)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|r| map_shift(&r)).transpose()
    }

    pub async fn list_shifts(&self) -> Result<Vec<Shift>> {
        let rows = sqlx::query(
            r#"
            SELECT shift_nr, start_date, length_days, boss_name, boss_email, boss_phone FROM shifts ORDER BY shift_nr ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(map_shift).collect()
    }
}

fn map_shift(row: &SqliteRow) -> Result<Shift> {
    let start_date: String = row.get("start_date");
    Ok(Shift {
        shift_nr: row.get("shift_nr"),
        start_date: parse_date(&start_date)?,
        length_days: row.get("length_days"),
        boss_name: row.get("boss_name"),
        boss_email: row.get("boss_email"),
        boss_phone: row.get("boss_phone"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_upsert_and_list() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = ShiftRepository::new(db);
        let start = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
        let shift = |shift_nr, start_date| Shift {
            shift_nr,
            start_date,
            length_days: 12,
            boss_name: Some("Kati Kask".to_string()),
            boss_email: None,
            boss_phone: None,
        };

        repo.upsert_shift(&shift(2, start(6, 20))).await.unwrap();
        repo.upsert_shift(&shift(1, start(6, 9))).await.unwrap();
        repo.upsert_shift(&shift(2, start(6, 21))).await.unwrap();

        let shifts = repo.list_shifts().await.unwrap();
        assert_eq!(shifts.iter().map(|s| s.shift_nr).collect::<Vec<_>>(), vec![1, 2]);
        let updated = repo.get_shift(2).await.unwrap().unwrap();
        assert_eq!(updated.start_date, start(6, 21));
        assert_eq!(updated.boss_name.as_deref(), Some("Kati Kask"));
        assert!(repo.get_shift(9).await.unwrap().is_none());
    }
}
