use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use shared::Sex;

use super::parse_sex;
use crate::domain::models::child::{Child, NewChild};
use crate::storage::connection::DbConnection;

/// Repository for camper rows
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id_code(&self, id_code: &str) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, sex, birth_year, id_code
            FROM children
            WHERE id_code = ?
            "#,
        )
        .bind(id_code)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|r| map_child(&r)).transpose()
    }

    /// Oldest child with exactly this name and sex
    pub async fn find_by_name_and_sex(&self, name: &str, sex: Sex) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, sex, birth_year, id_code
            FROM children
            WHERE name = ? AND sex = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(sex.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|r| map_child(&r)).transpose()
    }

    pub async fn get_child(&self, child_id: i64) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, sex, birth_year, id_code
            FROM children
            WHERE id = ?
            "#,
        )
        .bind(child_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|r| map_child(&r)).transpose()
    }

    pub async fn insert_child(&self, child: &NewChild) -> Result<Child> {
        let result = sqlx::query(
            r#"
            INSERT INTO children (name, sex, birth_year, id_code)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&child.name)
        .bind(child.sex.as_str())
        .bind(child.birth_year)
        .bind(&child.id_code)
        .execute(self.db.pool())
        .await
        .with_context(|| format!("Failed to insert child '{}'", child.name))?;

        Ok(Child {
            id: result.last_insert_rowid(),
            name: child.name.clone(),
            sex: child.sex,
            birth_year: Some(child.birth_year),
            id_code: child.id_code.clone(),
        })
    }

    pub async fn update_name(&self, child_id: i64, name: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE children SET name = ? WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(child_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn count_children(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM children")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

fn map_child(row: &SqliteRow) -> Result<Child> {
    let sex: String = row.get("sex");
    Ok(Child {
        id: row.get("id"),
        name: row.get("name"),
        sex: parse_sex(&sex)?,
        birth_year: row.get("birth_year"),
        id_code: row.get("id_code"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_repo() -> ChildRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        ChildRepository::new(db)
    }

    fn new_child(name: &str, id_code: Option<&str>) -> NewChild {
        NewChild {
            name: name.to_string(),
            sex: Sex::F,
            birth_year: 2012,
            id_code: id_code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let repo = setup_test_repo().await;

        let stored = repo.insert_child(&new_child("Mari Maasikas", Some("61205170001"))).await.unwrap();

        let by_code = repo.find_by_id_code("61205170001").await.unwrap().unwrap();
        assert_eq!(by_code, stored);

        let by_name = repo.find_by_name_and_sex("Mari Maasikas", Sex::F).await.unwrap().unwrap();
        assert_eq!(by_name.id, stored.id);
        assert!(repo.find_by_name_and_sex("Mari Maasikas", Sex::M).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_id_code_is_unique() {
        let repo = setup_test_repo().await;

        repo.insert_child(&new_child("Mari", Some("61205170001"))).await.unwrap();
        assert!(repo.insert_child(&new_child("Other", Some("61205170001"))).await.is_err());

        // Children without a code never collide.
        repo.insert_child(&new_child("Anna", None)).await.unwrap();
        repo.insert_child(&new_child("Anna", None)).await.unwrap();
        assert_eq!(repo.count_children().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_name() {
        let repo = setup_test_repo().await;
        let stored = repo.insert_child(&new_child("Mari", None)).await.unwrap();

        repo.update_name(stored.id, "Mari Liis").await.unwrap();

        let reloaded = repo.get_child(stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "Mari Liis");
    }
}
