use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// DbConnection owns the SQLite pool shared by every repository
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and make sure the schema exists
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url)
            .await
            .with_context(|| format!("Failed to connect to database {}", url))?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Fresh private in-memory database for a single test
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        use sqlx::sqlite::SqlitePoolOptions;

        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        const SCHEMA: &[&str] = &[
            r#"
            CREATE TABLE IF NOT EXISTS shifts (
                shift_nr INTEGER PRIMARY KEY,
                start_date TEXT NOT NULL,
                length_days INTEGER NOT NULL DEFAULT 12,
                boss_name TEXT,
                boss_email TEXT,
                boss_phone TEXT
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                sex TEXT NOT NULL CHECK (sex IN ('M', 'F')),
                birth_year INTEGER,
                id_code TEXT UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_children_name_sex
            ON children(name, sex);
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS bills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_name TEXT NOT NULL,
                bill_total INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS registrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reg_order INTEGER NOT NULL,
                reg_id TEXT NOT NULL,
                child_id INTEGER NOT NULL,
                id_code TEXT,
                shift_nr INTEGER NOT NULL,
                is_old BOOLEAN NOT NULL,
                is_registered BOOLEAN NOT NULL DEFAULT FALSE,
                birthday TEXT NOT NULL,
                price_to_pay INTEGER NOT NULL,
                price_paid INTEGER NOT NULL DEFAULT 0,
                shirt_size TEXT NOT NULL,
                addendum TEXT,
                road TEXT NOT NULL,
                city TEXT NOT NULL,
                county TEXT NOT NULL,
                country TEXT NOT NULL,
                contact_name TEXT NOT NULL,
                contact_number TEXT NOT NULL,
                contact_email TEXT NOT NULL,
                backup_tel TEXT,
                visible BOOLEAN NOT NULL DEFAULT TRUE,
                notif_sent BOOLEAN NOT NULL DEFAULT FALSE,
                bill_id INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (child_id) REFERENCES children (id),
                FOREIGN KEY (bill_id) REFERENCES bills (id)
            );
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_registrations_shift
            ON registrations(shift_nr, child_id);
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_registrations_contact_email
            ON registrations(contact_email);
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shift_nr INTEGER NOT NULL,
                name TEXT NOT NULL,
                year INTEGER NOT NULL,
                place INTEGER,
                captain_id INTEGER,
                FOREIGN KEY (captain_id) REFERENCES children (id)
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                child_id INTEGER NOT NULL,
                shift_nr INTEGER NOT NULL,
                year INTEGER NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                tent_nr INTEGER,
                team_id INTEGER,
                is_present BOOLEAN NOT NULL DEFAULT FALSE,
                age_at_camp INTEGER NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (child_id, shift_nr, year),
                FOREIGN KEY (child_id) REFERENCES children (id),
                FOREIGN KEY (team_id) REFERENCES teams (id)
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tent_scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                shift_nr INTEGER NOT NULL,
                year INTEGER NOT NULL,
                tent_nr INTEGER NOT NULL,
                score INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                is_root BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                role_name TEXT NOT NULL UNIQUE
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS permissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                permission_name TEXT NOT NULL UNIQUE
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS role_permissions (
                role_id INTEGER NOT NULL,
                permission_id INTEGER NOT NULL,
                PRIMARY KEY (role_id, permission_id),
                FOREIGN KEY (role_id) REFERENCES roles (id) ON DELETE CASCADE,
                FOREIGN KEY (permission_id) REFERENCES permissions (id) ON DELETE CASCADE
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                role_id INTEGER NOT NULL,
                shift_nr INTEGER,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (role_id) REFERENCES roles (id) ON DELETE CASCADE
            );
            "#,
        ];

        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }

        Ok(())
    }
}

/// Dates are stored as ISO 8601 calendar dates
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_setup_is_idempotent() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");

        // Running the schema a second time must not fail on existing objects.
        DbConnection::setup_schema(db.pool()).await.expect("Schema setup should be repeatable");
    }

    #[test]
    fn test_date_round_trip_format() {
        let date = NaiveDate::from_ymd_opt(2012, 2, 29).unwrap();
        assert_eq!(format_date(date), "2012-02-29");
        assert_eq!(parse_date("2012-02-29").unwrap(), date);
        assert!(parse_date("29.02.2012").is_err());
    }
}
