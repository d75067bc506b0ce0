use anyhow::Result;
use sqlx::Row;

use crate::domain::models::bill::Bill;
use crate::storage::connection::DbConnection;

/// Repository for bill rows
#[derive(Clone)]
pub struct BillRepository {
    db: DbConnection,
}

impl BillRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Create a bill and return its number
    pub async fn insert_bill(&self, contact_name: &str, bill_total: i64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO bills (contact_name, bill_total)
            VALUES (?, ?)
            "#,
        )
        .bind(contact_name)
        .bind(bill_total)
        .execute(self.db.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_bill(&self, bill_id: i64) -> Result<Option<Bill>> {
        let row = sqlx::query(
            r#"
            SELECT id, contact_name, bill_total
            FROM bills
            WHERE id = ?
            "#,
        )
        .bind(bill_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| Bill {
            id: r.get("id"),
            contact_name: r.get("contact_name"),
            bill_total: r.get("bill_total"),
        }))
    }

    #[cfg(test)]
    pub async fn count_bills(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bills")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}
