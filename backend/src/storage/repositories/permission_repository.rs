use anyhow::Result;
use sqlx::Row;

use crate::domain::models::permission::ShiftStaffMember;
use crate::storage::connection::DbConnection;

/// Users, roles and the permissions roles carry
#[derive(Clone)]
pub struct PermissionRepository {
    db: DbConnection,
}

impl PermissionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Permission names starting with `prefix` granted to the user on a shift
    pub async fn shift_permission_names(&self, user_id: i64, shift_nr: i32, prefix: &str) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT p.permission_name
            FROM user_roles ur
            JOIN role_permissions rp ON rp.role_id = ur.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = ? AND ur.shift_nr = ? AND substr(p.permission_name, 1, length(?)) = ?
            ORDER BY p.permission_name ASC
            "#,
        )
        .bind(user_id)
        .bind(shift_nr)
        .bind(prefix)
        .bind(prefix)
        .fetch_all(self.db.pool())
        .await?;
        Ok(names)
    }

    pub async fn is_root(&self, user_id: i64) -> Result<bool> {
        let is_root = sqlx::query_scalar::<_, bool>("SELECT is_root FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(is_root.unwrap_or(false))
    }

    /// Whether the user holds one of `role_names` on the shift
    pub async fn has_role_on_shift(&self, user_id: i64, shift_nr: i32, role_names: &[&str]) -> Result<bool> {
        let names = self.roles_on_shift(user_id, shift_nr).await?;
        Ok(names.iter().any(|name| role_names.contains(&name.as_str())))
    }

    async fn roles_on_shift(&self, user_id: i64, shift_nr: i32) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT r.role_name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ? AND ur.shift_nr = ?
            "#,
        )
        .bind(user_id)
        .bind(shift_nr)
        .fetch_all(self.db.pool())
        .await?;
        Ok(names)
    }

    /// Every role assignment scoped to the shift, ordered by user
    pub async fn shift_staff(&self, shift_nr: i32) -> Result<Vec<ShiftStaffMember>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id AS user_id, u.name AS name, r.id AS role_id, r.role_name AS role_name
            FROM user_roles ur
            JOIN users u ON u.id = ur.user_id
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.shift_nr = ?
            ORDER BY u.id ASC, r.id ASC
            "#,
        )
        .bind(shift_nr)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| ShiftStaffMember {
                user_id: row.get("user_id"),
                name: row.get("name"),
                shift_nr,
                role_name: row.get("role_name"),
                role_id: row.get("role_id"),
            })
            .collect())
    }

    /// Whether the user holds the role on any shift or without a shift scope
    pub async fn has_role_anywhere(&self, user_id: i64, role_name: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_roles ur
                JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = ? AND r.role_name = ?
            )
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .fetch_one(self.db.pool())
        .await?;
        Ok(found != 0)
    }

    pub async fn insert_user(&self, name: &str, is_root: bool) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (name, is_root) VALUES (?, ?)")
            .bind(name)
            .bind(is_root)
            .execute(self.db.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Id of the named role, creating it when missing
    pub async fn ensure_role(&self, role_name: &str) -> Result<i64> {
        sqlx::query("INSERT OR IGNORE INTO roles (role_name) VALUES (?)")
            .bind(role_name)
            .execute(self.db.pool())
            .await?;
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE role_name = ?")
            .bind(role_name)
            .fetch_one(self.db.pool())
            .await?;
        Ok(id)
    }

    /// Id of the named permission, creating it when missing
    pub async fn ensure_permission(&self, permission_name: &str) -> Result<i64> {
        sqlx::query("INSERT OR IGNORE INTO permissions (permission_name) VALUES (?)")
            .bind(permission_name)
            .execute(self.db.pool())
            .await?;
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM permissions WHERE permission_name = ?")
            .bind(permission_name)
            .fetch_one(self.db.pool())
            .await?;
        Ok(id)
    }

    pub async fn grant_permission(&self, role_id: i64, permission_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
            .bind(role_id)
            .bind(permission_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// `shift_nr = None` assigns the role outside any shift
    pub async fn assign_role(&self, user_id: i64, role_id: i64, shift_nr: Option<i32>) -> Result<()> {
        sqlx::query("INSERT INTO user_roles (user_id, role_id, shift_nr) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(role_id)
            .bind(shift_nr)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> PermissionRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        PermissionRepository::new(db)
    }

    #[tokio::test]
    async fn test_prefix_filter_is_scoped_to_shift() {
        let repo = setup().await;
        let user = repo.insert_user("Kati", false).await.unwrap();
        let role = repo.ensure_role("instructor").await.unwrap();
        for name in ["registration.view.price", "registration.edit.price", "registration.view_like"] {
            let permission = repo.ensure_permission(name).await.unwrap();
            repo.grant_permission(role, permission).await.unwrap();
        }
        repo.assign_role(user, role, Some(2)).await.unwrap();

        let names = repo.shift_permission_names(user, 2, "registration.view.").await.unwrap();
        assert_eq!(names, vec!["registration.view.price".to_string()]);
        assert!(repo.shift_permission_names(user, 3, "registration").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_lookups() {
        let repo = setup().await;
        let user = repo.insert_user("Kati", false).await.unwrap();
        let boss = repo.ensure_role("boss").await.unwrap();
        assert_eq!(repo.ensure_role("boss").await.unwrap(), boss);
        repo.assign_role(user, boss, Some(3)).await.unwrap();

        assert!(repo.has_role_on_shift(user, 3, &["boss", "helper"]).await.unwrap());
        assert!(!repo.has_role_on_shift(user, 2, &["boss"]).await.unwrap());
        assert!(repo.has_role_anywhere(user, "boss").await.unwrap());
        assert!(!repo.is_root(user).await.unwrap());
        assert!(!repo.is_root(12345).await.unwrap());
    }

    #[tokio::test]
    async fn test_shift_staff_lists_assignments_of_one_shift() {
        let repo = setup().await;
        let kati = repo.insert_user("Kati", false).await.unwrap();
        let mart = repo.insert_user("Mart", false).await.unwrap();
        let boss = repo.ensure_role("boss").await.unwrap();
        let helper = repo.ensure_role("helper").await.unwrap();
        repo.assign_role(kati, boss, Some(2)).await.unwrap();
        repo.assign_role(mart, helper, Some(2)).await.unwrap();
        repo.assign_role(mart, boss, Some(3)).await.unwrap();

        let staff = repo.shift_staff(2).await.unwrap();
        assert_eq!(staff.len(), 2);
        assert_eq!(staff[0].name, "Kati");
        assert_eq!(staff[0].role_name, "boss");
        assert_eq!(staff[0].role_id, boss);
        assert_eq!(staff[1].user_id, mart);
        assert_eq!(staff[1].role_name, "helper");
        assert!(repo.shift_staff(4).await.unwrap().is_empty());
    }
}
