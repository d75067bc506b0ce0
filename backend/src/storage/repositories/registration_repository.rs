use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::parse_sex;
use crate::domain::models::bill::BillCamper;
use crate::domain::models::registration::{
    NewRegistration, Registration, RegistrationPatch, RegistrationStatus,
};
use crate::storage::connection::{format_date, parse_date, DbConnection};

const SELECT_REGISTRATION: &str = r#"
    SELECT r.id, r.reg_order, r.reg_id, r.child_id, c.name AS child_name, c.sex AS child_sex,
           r.id_code, r.shift_nr, r.is_old, r.is_registered, r.birthday, r.price_to_pay,
           r.price_paid, r.shirt_size, r.addendum, r.road, r.city, r.county, r.country,
           r.contact_name, r.contact_number, r.contact_email, r.backup_tel, r.visible,
           r.notif_sent, r.bill_id
    FROM registrations r
    JOIN children c ON c.id = r.child_id
"#;

const SELECT_BILL_CAMPER: &str = r#"
    SELECT r.id AS registration_id, c.name AS child_name, r.shift_nr, r.is_old,
           r.is_registered, r.price_to_pay, r.price_paid, r.notif_sent, r.bill_id,
           r.contact_name, r.contact_email
    FROM registrations r
    JOIN children c ON c.id = r.child_id
"#;

/// Repository for registration rows and the billing views over them
#[derive(Clone)]
pub struct RegistrationRepository {
    db: DbConnection,
}

impl RegistrationRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Highest order number ever persisted, `None` on an empty table
    pub async fn max_reg_order(&self) -> Result<Option<i64>> {
        let max = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(reg_order) FROM registrations")
            .fetch_one(self.db.pool())
            .await?;
        Ok(max)
    }

    /// Write a whole submission in one statement
    pub async fn insert_batch(&self, reg_order: i64, reg_id: &str, rows: &[NewRegistration]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            INSERT INTO registrations (
                reg_order, reg_id, child_id, id_code, shift_nr, is_old, birthday,
                price_to_pay, shirt_size, addendum, road, city, county, country,
                contact_name, contact_number, contact_email, backup_tel, visible
            )
            "#,
        );

        builder.push_values(rows, |mut b, row| {
            b.push_bind(reg_order)
                .push_bind(reg_id.to_string())
                .push_bind(row.child_id)
                .push_bind(row.id_code.clone())
                .push_bind(row.shift_nr)
                .push_bind(row.is_old)
                .push_bind(format_date(row.birthday))
                .push_bind(row.price_to_pay)
                .push_bind(row.shirt_size.clone())
                .push_bind(row.addendum.clone())
                .push_bind(row.road.clone())
                .push_bind(row.city.clone())
                .push_bind(row.county.clone())
                .push_bind(row.country.clone())
                .push_bind(row.contact_name.clone())
                .push_bind(row.contact_number.clone())
                .push_bind(row.contact_email.clone())
                .push_bind(row.backup_tel.clone())
                .push_bind(row.visible);
        });

        let result = builder
            .build()
            .execute(self.db.pool())
            .await
            .with_context(|| format!("Failed to insert registrations for group {}", reg_id))?;

        Ok(result.rows_affected())
    }

    /// Whether any registration (hidden ones included) links the child to the shift
    pub async fn exists_for_child_shift(&self, child_id: i64, shift_nr: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(SELECT 1 FROM registrations WHERE child_id = ? AND shift_nr = ?)
            "#,
        )
        .bind(child_id)
        .bind(shift_nr)
        .fetch_one(self.db.pool())
        .await?;
        Ok(exists != 0)
    }

    pub async fn get_registration(&self, registration_id: i64) -> Result<Option<Registration>> {
        let sql = format!("{} WHERE r.id = ?", SELECT_REGISTRATION);
        let row = sqlx::query(&sql)
            .bind(registration_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(|r| map_registration(&r)).transpose()
    }

    /// Visible registrations of a shift in submission order
    pub async fn list_for_shift(&self, shift_nr: i32) -> Result<Vec<Registration>> {
        let sql = format!(
            "{} WHERE r.shift_nr = ? AND r.visible = 1 ORDER BY r.reg_order ASC, r.id ASC",
            SELECT_REGISTRATION
        );
        let rows = sqlx::query(&sql).bind(shift_nr).fetch_all(self.db.pool()).await?;

        rows.iter().map(map_registration).collect()
    }

    #[cfg(test)]
    pub async fn count_registrations(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn update_registration(&self, registration_id: i64, patch: &RegistrationPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE registrations SET ");
        let mut fields = builder.separated(", ");
        if let Some(is_registered) = patch.is_registered {
            fields.push("is_registered = ").push_bind_unseparated(is_registered);
        }
        if let Some(is_old) = patch.is_old {
            fields.push("is_old = ").push_bind_unseparated(is_old);
        }
        if let Some(price_paid) = patch.price_paid {
            fields.push("price_paid = ").push_bind_unseparated(price_paid);
        }
        if let Some(price_to_pay) = patch.price_to_pay {
            fields.push("price_to_pay = ").push_bind_unseparated(price_to_pay);
        }
        builder.push(" WHERE id = ").push_bind(registration_id);

        builder.build().execute(self.db.pool()).await?;
        Ok(())
    }

    /// Visible registrations of a shift ordered by child, for record reconciliation
    pub async fn statuses_for_shift(&self, shift_nr: i32) -> Result<Vec<RegistrationStatus>> {
        let rows = sqlx::query(
            r#"
            SELECT child_id, is_registered, birthday
            FROM registrations
            WHERE shift_nr = ? AND visible = 1
            ORDER BY child_id ASC, id ASC
            "#,
        )
        .bind(shift_nr)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let birthday: String = row.get("birthday");
                Ok(RegistrationStatus {
                    child_id: row.get("child_id"),
                    is_registered: row.get("is_registered"),
                    birthday: parse_date(&birthday)?,
                })
            })
            .collect()
    }

    /// Latest birthday on file for the child, used when a record is created outside a sync
    pub async fn birthday_for_child(&self, child_id: i64) -> Result<Option<chrono::NaiveDate>> {
        let birthday = sqlx::query_scalar::<_, String>(
            r#"
            SELECT birthday FROM registrations
            WHERE child_id = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(child_id)
        .fetch_optional(self.db.pool())
        .await?;

        birthday.map(|b| parse_date(&b)).transpose()
    }

    /// Every visible registration filed under a contact e-mail
    pub async fn campers_for_contact(&self, contact_email: &str) -> Result<Vec<BillCamper>> {
        let sql = format!(
            "{} WHERE r.contact_email = ? AND r.visible = 1 ORDER BY r.id ASC",
            SELECT_BILL_CAMPER
        );
        let rows = sqlx::query(&sql).bind(contact_email).fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(map_bill_camper).collect())
    }

    pub async fn campers_for_bill(&self, bill_id: i64) -> Result<Vec<BillCamper>> {
        let sql = format!(
            "{} WHERE r.bill_id = ? AND r.visible = 1 ORDER BY r.id ASC",
            SELECT_BILL_CAMPER
        );
        let rows = sqlx::query(&sql).bind(bill_id).fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(map_bill_camper).collect())
    }

    /// Registered campers of a shift ordered by contact e-mail
    pub async fn registered_campers_for_shift(&self, shift_nr: i32) -> Result<Vec<BillCamper>> {
        let sql = format!(
            "{} WHERE r.shift_nr = ? AND r.is_registered = 1 AND r.visible = 1 \
             ORDER BY r.contact_email ASC, r.id ASC",
            SELECT_BILL_CAMPER
        );
        let rows = sqlx::query(&sql).bind(shift_nr).fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(map_bill_camper).collect())
    }

    /// Link registrations to a bill, leaving rows that already carry one untouched
    pub async fn assign_bill(&self, bill_id: i64, registration_ids: &[i64]) -> Result<u64> {
        if registration_ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE registrations SET bill_id = ");
        builder.push_bind(bill_id);
        builder.push(" WHERE bill_id IS NULL AND id IN (");
        let mut ids = builder.separated(", ");
        for id in registration_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let result = builder.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_notified(&self, registration_ids: &[i64]) -> Result<u64> {
        if registration_ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE registrations SET notif_sent = 1 WHERE id IN (");
        let mut ids = builder.separated(", ");
        for id in registration_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        let result = builder.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected())
    }

    /// Distinct contact e-mails of a shift's registered campers
    pub async fn contact_emails_for_shift(&self, shift_nr: i32) -> Result<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT contact_email
            FROM registrations
            WHERE shift_nr = ? AND is_registered = 1 AND visible = 1
            ORDER BY contact_email ASC
            "#,
        )
        .bind(shift_nr)
        .fetch_all(self.db.pool())
        .await?;
        Ok(emails)
    }
}

fn map_registration(row: &SqliteRow) -> Result<Registration> {
    let sex: String = row.get("child_sex");
    let birthday: String = row.get("birthday");
    Ok(Registration {
        id: row.get("id"),
        reg_order: row.get("reg_order"),
        reg_id: row.get("reg_id"),
        child_id: row.get("child_id"),
        child_name: row.get("child_name"),
        child_sex: parse_sex(&sex)?,
        id_code: row.get("id_code"),
        shift_nr: row.get("shift_nr"),
        is_old: row.get("is_old"),
        is_registered: row.get("is_registered"),
        birthday: parse_date(&birthday)?,
        price_to_pay: row.get("price_to_pay"),
        price_paid: row.get("price_paid"),
        shirt_size: row.get("shirt_size"),
        addendum: row.get("addendum"),
        road: row.get("road"),
        city: row.get("city"),
        county: row.get("county"),
        country: row.get("country"),
        contact_name: row.get("contact_name"),
        contact_number: row.get("contact_number"),
        contact_email: row.get("contact_email"),
        backup_tel: row.get("backup_tel"),
        visible: row.get("visible"),
        notif_sent: row.get("notif_sent"),
        bill_id: row.get("bill_id"),
    })
}

fn map_bill_camper(row: &SqliteRow) -> BillCamper {
    BillCamper {
        registration_id: row.get("registration_id"),
        child_name: row.get("child_name"),
        shift_nr: row.get("shift_nr"),
        is_old: row.get("is_old"),
        is_registered: row.get("is_registered"),
        price_to_pay: row.get("price_to_pay"),
        price_paid: row.get("price_paid"),
        notif_sent: row.get("notif_sent"),
        bill_id: row.get("bill_id"),
        contact_name: row.get("contact_name"),
        contact_email: row.get("contact_email"),
    }
}
