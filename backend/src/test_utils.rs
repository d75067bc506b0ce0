//! Fixtures shared by the unit tests of every layer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::Sex;

use crate::config::AppConfig;
use crate::domain::age::current_year;
use crate::domain::bill_document::{BillDocument, BillRenderer};
use crate::domain::commands::registrations::RegistrationEntry;
use crate::domain::email_service::{Mailer, OutgoingMail};
use crate::domain::models::bill::BillCamper;
use crate::domain::models::child::NewChild;
use crate::domain::models::permission::Permission;
use crate::domain::models::registration::NewRegistration;
use crate::domain::models::shift::Shift;
use crate::domain::sequence::RegOrder;
use crate::domain::{BillingService, RecordService, RegistrationService};
use crate::storage::repositories::{ChildRepository, PermissionRepository, RegistrationRepository, ShiftRepository};
use crate::storage::DbConnection;
use crate::AppState;

pub async fn insert_test_child(db: &DbConnection, name: &str, sex: &str) -> i64 {
    let child = NewChild {
        name: name.to_string(),
        sex: Sex::parse(sex).expect("test sex must be M or F"),
        birth_year: 2012,
        id_code: None,
    };
    ChildRepository::new(db.clone()).insert_child(&child).await.expect("Failed to insert test child").id
}

pub fn new_registration(child_id: i64, shift_nr: i32, contact_email: &str) -> NewRegistration {
    NewRegistration {
        child_id,
        id_code: None,
        shift_nr,
        is_old: false,
        birthday: NaiveDate::from_ymd_opt(2012, 5, 17).unwrap(),
        price_to_pay: 360,
        shirt_size: "M".to_string(),
        addendum: None,
        road: "Mere 1".to_string(),
        city: "Tallinn".to_string(),
        county: "Harjumaa".to_string(),
        country: "Eesti".to_string(),
        contact_name: "Kati Kask".to_string(),
        contact_number: "+372 5555 5555".to_string(),
        contact_email: contact_email.to_string(),
        backup_tel: None,
        visible: true,
    }
}

/// Insert one visible registration and return its id
pub async fn insert_registration(
    db: &DbConnection,
    child_id: i64,
    shift_nr: i32,
    contact_email: &str,
    is_registered: bool,
) -> i64 {
    let repo = RegistrationRepository::new(db.clone());
    let order = repo.max_reg_order().await.unwrap().unwrap_or(0) + 1;
    repo.insert_batch(order, &format!("test-{}", order), &[new_registration(child_id, shift_nr, contact_email)])
        .await
        .expect("Failed to insert test registration");

    let id: i64 = sqlx::query_scalar("SELECT MAX(id) FROM registrations").fetch_one(db.pool()).await.unwrap();
    sqlx::query("UPDATE registrations SET is_registered = ? WHERE id = ?")
        .bind(is_registered)
        .bind(id)
        .execute(db.pool())
        .await
        .unwrap();
    id
}

/// A shift starting in June of the current year, led by "Shift N leader"
pub fn test_shift(shift_nr: i32) -> Shift {
    Shift {
        shift_nr,
        start_date: NaiveDate::from_ymd_opt(current_year(), 6, 1 + shift_nr as u32).unwrap(),
        length_days: 12,
        boss_name: Some(format!("Shift {} leader", shift_nr)),
        boss_email: Some(format!("shift{}@example.com", shift_nr)),
        boss_phone: None,
    }
}

pub async fn seed_shift(db: &DbConnection, shift_nr: i32) {
    ShiftRepository::new(db.clone())
        .upsert_shift(&test_shift(shift_nr))
        .await
        .expect("Failed to seed shift");
}

pub fn sample_entry(name: &str, shift_nr: i32) -> RegistrationEntry {
    RegistrationEntry {
        name: name.to_string(),
        id_code: None,
        sex: Some(Sex::M),
        dob: Some("2010-06-12".to_string()),
        addendum: None,
        shift_nr,
        is_new: true,
        shirt_size: "M".to_string(),
        road: "Mere 1".to_string(),
        city: "Tallinn".to_string(),
        county: "Harjumaa".to_string(),
        country: "Eesti".to_string(),
        contact_name: "Kati Kask".to_string(),
        contact_email: "parent@example.com".to_string(),
        contact_number: "+372 5555 5555".to_string(),
        backup_tel: None,
        send_email: false,
    }
}

pub fn bill_camper(registration_id: i64, name: &str, shift_nr: i32, is_old: bool, price_to_pay: i64) -> BillCamper {
    BillCamper {
        registration_id,
        child_name: name.to_string(),
        shift_nr,
        is_old,
        is_registered: true,
        price_to_pay,
        price_paid: 0,
        notif_sent: false,
        bill_id: None,
        contact_name: "Kati Kask".to_string(),
        contact_email: "a@example.com".to_string(),
    }
}

pub async fn insert_user(db: &DbConnection, name: &str, is_root: bool) -> i64 {
    PermissionRepository::new(db.clone()).insert_user(name, is_root).await.expect("Failed to insert user")
}

/// Give `user_id` the role `role_name` on a shift, creating the role with `permissions`
pub async fn grant_role(
    db: &DbConnection,
    user_id: i64,
    role_name: &str,
    shift_nr: Option<i32>,
    permissions: &[Permission],
) {
    let repo = PermissionRepository::new(db.clone());
    let role_id = repo.ensure_role(role_name).await.unwrap();
    for permission in permissions {
        let permission_id = repo.ensure_permission(permission.name()).await.unwrap();
        repo.grant_permission(role_id, permission_id).await.unwrap();
    }
    repo.assign_role(user_id, role_id, shift_nr).await.unwrap();
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        Err(anyhow!("SMTP server rejected mail to {}", mail.to))
    }
}

/// Writes a placeholder file per bill and remembers every document
pub struct RecordingRenderer {
    dir: tempfile::TempDir,
    rendered: Mutex<Vec<BillDocument>>,
    fail_next: AtomicBool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create bill directory"),
            rendered: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn rendered(&self) -> Vec<BillDocument> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BillRenderer for RecordingRenderer {
    async fn render(&self, document: &BillDocument) -> Result<PathBuf> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("renderer unavailable"));
        }
        let path = self.document_path(document.bill_nr);
        tokio::fs::write(&path, b"%PDF-1.3 test bill").await?;
        self.rendered.lock().unwrap().push(document.clone());
        Ok(path)
    }

    fn document_path(&self, bill_nr: i64) -> PathBuf {
        self.dir.path().join(format!("{}.pdf", bill_nr))
    }
}

/// Fully wired services over a fresh in-memory database
pub struct TestServices {
    pub db: DbConnection,
    pub state: AppState,
    pub registrations: RegistrationService,
    pub registration_repo: RegistrationRepository,
    pub records: RecordService,
    pub billing: BillingService,
    pub mailer: Arc<RecordingMailer>,
    pub renderer: Arc<RecordingRenderer>,
    pub reg_order: Arc<RegOrder>,
}

impl TestServices {
    pub async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::build(mailer.clone(), mailer).await
    }

    /// Same wiring, but every outgoing mail fails
    pub async fn with_failing_mailer() -> Self {
        Self::build(Arc::new(FailingMailer), Arc::new(RecordingMailer::default())).await
    }

    async fn build(mailer: Arc<dyn Mailer>, recording: Arc<RecordingMailer>) -> Self {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let renderer = Arc::new(RecordingRenderer::new());
        let reg_order = Arc::new(RegOrder::new(0));
        let state = AppState::new(db.clone(), &AppConfig::default(), mailer, renderer.clone(), reg_order.clone());
        state.permission_service.ensure_catalogue().await.expect("Failed to seed permissions");

        Self {
            registrations: state.registration_service.clone(),
            registration_repo: RegistrationRepository::new(db.clone()),
            records: state.record_service.clone(),
            billing: state.billing_service.clone(),
            db,
            state,
            mailer: recording,
            renderer,
            reg_order,
        }
    }
}
